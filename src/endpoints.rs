// Capability table: which endpoint serves an action for a given role.
//
// The add and delete actions fall back to the unprivileged `/books`
// routes for non-admin sessions. Whether the backend authorizes those
// routes on its own is not known here; the table only decides the route.

use reqwest::Method;

use crate::error::{ClientError, Result};
use crate::session::Role;

/// How a request carries the session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Never sent.
    None,
    /// Sent when a token is held.
    Optional,
    /// Required by the endpoint; sent when held, the server rejects otherwise.
    Bearer,
}

/// Everything the client can ask the backend for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    Logout,
    Me,
    Health,
    ListBooks,
    GetBook(String),
    AddBook,
    UpdateBook(String),
    DeleteBook(String),
    ListMyBooks,
    ListMyReadBooks,
    AddMyBook,
    SetRead { isbn: String, read: bool },
    RemoveMyBook(String),
}

/// A resolved route: method, path segments and auth mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub segments: Vec<String>,
    pub auth: Auth,
}

impl Endpoint {
    fn new(method: Method, segments: &[&str], auth: Auth) -> Self {
        Endpoint {
            method,
            segments: segments.iter().map(|s| s.to_string()).collect(),
            auth,
        }
    }

    fn with(mut self, segment: &str) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Display form, e.g. `/admin/books/9780140328721`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Map `{role, action}` to an endpoint. Fails with an authorization error
/// when the role has no route for the action.
pub fn resolve(role: Role, action: &Action) -> Result<Endpoint> {
    use Method as M;
    let admin = role == Role::Admin;
    let endpoint = match action {
        Action::Login => Endpoint::new(M::POST, &["auth", "login"], Auth::None),
        Action::Register => Endpoint::new(M::POST, &["auth", "register"], Auth::None),
        Action::Logout => Endpoint::new(M::POST, &["auth", "logout"], Auth::Bearer),
        Action::Me => Endpoint::new(M::GET, &["me"], Auth::Bearer),
        Action::Health => Endpoint::new(M::GET, &["health"], Auth::None),
        Action::ListBooks => Endpoint::new(M::GET, &["books"], Auth::None),
        Action::GetBook(isbn) => Endpoint::new(M::GET, &["books"], Auth::None).with(isbn),
        Action::AddBook if admin => Endpoint::new(M::POST, &["admin", "books"], Auth::Bearer),
        Action::AddBook => Endpoint::new(M::POST, &["books"], Auth::Optional),
        Action::UpdateBook(isbn) if admin => {
            Endpoint::new(M::PATCH, &["admin", "books"], Auth::Bearer).with(isbn)
        }
        Action::UpdateBook(_) => {
            return Err(ClientError::authorization(
                "This action requires an admin account.",
            ))
        }
        Action::DeleteBook(isbn) if admin => {
            Endpoint::new(M::DELETE, &["admin", "books"], Auth::Bearer).with(isbn)
        }
        Action::DeleteBook(isbn) => Endpoint::new(M::DELETE, &["books"], Auth::Optional).with(isbn),
        Action::ListMyBooks => Endpoint::new(M::GET, &["me", "books"], Auth::Bearer),
        Action::ListMyReadBooks => Endpoint::new(M::GET, &["me", "books", "read"], Auth::Bearer),
        Action::AddMyBook => Endpoint::new(M::POST, &["me", "books"], Auth::Bearer),
        Action::SetRead { isbn, read } => Endpoint::new(M::POST, &["me", "books"], Auth::Bearer)
            .with(isbn)
            .with(if *read { "read" } else { "unread" }),
        Action::RemoveMyBook(isbn) => {
            Endpoint::new(M::DELETE, &["me", "books"], Auth::Bearer).with(isbn)
        }
    };
    Ok(endpoint)
}
