//! In-memory stand-in for the catalog backend.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use catalog_client::api::{ApiRequest, ApiResponse, Transport};
use catalog_client::config::Timing;
use catalog_client::html::HtmlView;
use catalog_client::models::{Book, ReadingListEntry};
use catalog_client::session::{MemorySessionStore, Role};
use catalog_client::view::{AuthPanel, Control, Dialog, Fragment, Input, Region, StatusMessage, View};
use catalog_client::{CatalogClient, ClientError};
use serde_json::{json, Value};

pub type TestClient = CatalogClient<FakeBackend, HtmlView, MemorySessionStore>;

#[derive(Default)]
struct State {
    books: Vec<Book>,
    /// What the external metadata provider knows, by normalized ISBN.
    provider: HashMap<String, (String, String)>,
    users: HashMap<String, (String, Role)>,
    tokens: HashMap<String, String>,
    lists: HashMap<String, Vec<ReadingListEntry>>,
    requests: Vec<ApiRequest>,
    next_token: u32,
    offline: bool,
    logout_fails: bool,
}

/// Clones share state, so a test can keep a handle while a client owns
/// the backend.
#[derive(Default, Clone)]
pub struct FakeBackend {
    state: Rc<RefCell<State>>,
}

fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body.to_string())
}

fn fail(status: u16, detail: &str) -> ApiResponse {
    ApiResponse::new(status, json!({ "detail": detail }).to_string())
}

impl FakeBackend {
    pub fn new() -> Self {
        let backend = FakeBackend::default();
        backend.know("9780140328721", "Fantastic Mr. Fox", "Roald Dahl");
        backend.know("9780441013593", "Dune", "Frank Herbert");
        backend.know("9780261103573", "The Fellowship of the Ring", "J.R.R. Tolkien");
        backend.user("ada", "secret", Role::User);
        backend.user("root", "hunter2", Role::Admin);
        backend
    }

    pub fn know(&self, isbn: &str, title: &str, author: &str) {
        self.state
            .borrow_mut()
            .provider
            .insert(isbn.into(), (title.into(), author.into()));
    }

    pub fn user(&self, name: &str, password: &str, role: Role) {
        self.state
            .borrow_mut()
            .users
            .insert(name.into(), (password.into(), role));
    }

    pub fn shelve(&self, isbn: &str, title: &str, author: &str) {
        self.state.borrow_mut().books.push(Book {
            isbn: isbn.into(),
            title: title.into(),
            author: author.into(),
        });
    }

    pub fn give(&self, username: &str, isbn: &str, title: &str, is_read: bool) {
        self.state
            .borrow_mut()
            .lists
            .entry(username.into())
            .or_default()
            .push(ReadingListEntry {
                isbn: isbn.into(),
                title: title.into(),
                author: "Someone".into(),
                is_read,
            });
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    pub fn set_logout_fails(&self, fails: bool) {
        self.state.borrow_mut().logout_fails = fails;
    }

    pub fn revoke_all_tokens(&self) {
        self.state.borrow_mut().tokens.clear();
    }

    pub fn book_isbns(&self) -> Vec<String> {
        self.state.borrow().books.iter().map(|b| b.isbn.clone()).collect()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state.borrow().requests.clone()
    }

    /// `"METHOD /path"` for every request received, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state
            .borrow()
            .requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.path()))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    fn caller(&self, request: &ApiRequest) -> Option<String> {
        let state = self.state.borrow();
        request
            .bearer
            .as_ref()
            .and_then(|t| state.tokens.get(t))
            .cloned()
    }

    fn is_admin(&self, request: &ApiRequest) -> bool {
        let state = self.state.borrow();
        self.caller(request)
            .and_then(|u| state.users.get(&u).map(|(_, r)| *r == Role::Admin))
            .unwrap_or(false)
    }

    fn body_str(request: &ApiRequest, key: &str) -> Option<String> {
        request
            .body
            .as_ref()
            .and_then(|b| b.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    fn add_book(&self, request: &ApiRequest) -> ApiResponse {
        let isbn = Self::body_str(request, "isbn").unwrap_or_default();
        let mut state = self.state.borrow_mut();
        if state.books.iter().any(|b| b.isbn == isbn) {
            return fail(409, &format!("Book with ISBN {} already exists.", isbn));
        }
        let Some((title, author)) = state.provider.get(&isbn).cloned() else {
            return fail(404, &format!("No book found for ISBN {}.", isbn));
        };
        let book = Book { isbn, title, author };
        state.books.push(book.clone());
        ok(json!(book))
    }

    fn delete_book(&self, isbn: &str) -> ApiResponse {
        let mut state = self.state.borrow_mut();
        let before = state.books.len();
        state.books.retain(|b| b.isbn != isbn);
        if state.books.len() == before {
            return fail(404, &format!("No book found for ISBN {}.", isbn));
        }
        ok(json!({ "message": "deleted", "deleted_isbn": isbn }))
    }

    fn route(&self, request: &ApiRequest) -> ApiResponse {
        let segs: Vec<&str> = request.segments.iter().map(String::as_str).collect();
        let m = request.method.as_str();
        match (m, segs.as_slice()) {
            ("GET", ["health"]) => ok(json!({ "status": "healthy" })),
            ("POST", ["auth", "login"]) => {
                let user = Self::body_str(request, "username").unwrap_or_default();
                let pass = Self::body_str(request, "password").unwrap_or_default();
                let mut state = self.state.borrow_mut();
                match state.users.get(&user).cloned() {
                    Some((p, role)) if p == pass => {
                        state.next_token += 1;
                        let token = format!("tok-{}", state.next_token);
                        state.tokens.insert(token.clone(), user.clone());
                        ok(json!({ "token": token, "username": user, "role": role }))
                    }
                    _ => fail(401, "Wrong username or password"),
                }
            }
            ("POST", ["auth", "register"]) => {
                let user = Self::body_str(request, "username").unwrap_or_default();
                let pass = Self::body_str(request, "password").unwrap_or_default();
                let mut state = self.state.borrow_mut();
                if state.users.contains_key(&user) {
                    return fail(400, "User could not be created. It may already exist.");
                }
                state.users.insert(user, (pass, Role::User));
                ok(json!({ "message": "created" }))
            }
            ("POST", ["auth", "logout"]) => {
                if self.state.borrow().logout_fails {
                    return ApiResponse::new(500, "boom");
                }
                if self.caller(request).is_none() {
                    return fail(401, "Invalid or expired token");
                }
                if let Some(t) = &request.bearer {
                    self.state.borrow_mut().tokens.remove(t);
                }
                ok(json!({ "message": "bye" }))
            }
            ("GET", ["me"]) => match self.caller(request) {
                Some(user) => ok(json!({ "username": user })),
                None => fail(401, "Invalid or expired token"),
            },
            ("GET", ["books"]) => ok(json!(self.state.borrow().books)),
            ("GET", ["books", isbn]) => {
                let state = self.state.borrow();
                match state.books.iter().find(|b| b.isbn == *isbn) {
                    Some(book) => ok(json!(book)),
                    None => fail(404, &format!("No book found for ISBN {}.", isbn)),
                }
            }
            ("POST", ["books"]) => self.add_book(request),
            ("DELETE", ["books", isbn]) => self.delete_book(isbn),
            (_, ["admin", ..]) if !self.is_admin(request) => fail(403, "Admin rights required"),
            ("POST", ["admin", "books"]) => self.add_book(request),
            ("DELETE", ["admin", "books", isbn]) => self.delete_book(isbn),
            ("PATCH", ["admin", "books", isbn]) => {
                let title = Self::body_str(request, "title");
                let author = Self::body_str(request, "author");
                let mut state = self.state.borrow_mut();
                match state.books.iter_mut().find(|b| b.isbn == *isbn) {
                    Some(book) => {
                        if let Some(t) = title {
                            book.title = t;
                        }
                        if let Some(a) = author {
                            book.author = a;
                        }
                        ok(json!(book))
                    }
                    None => fail(404, "Book not found"),
                }
            }
            (_, ["me", ..]) if self.caller(request).is_none() => fail(401, "Authorization required"),
            ("GET", ["me", "books"]) => {
                let user = self.caller(request).unwrap_or_default();
                ok(json!(self.state.borrow().lists.get(&user).cloned().unwrap_or_default()))
            }
            ("GET", ["me", "books", "read"]) => {
                let user = self.caller(request).unwrap_or_default();
                let state = self.state.borrow();
                let read: Vec<_> = state
                    .lists
                    .get(&user)
                    .map(|l| l.iter().filter(|e| e.is_read).cloned().collect())
                    .unwrap_or_default();
                ok(json!(read))
            }
            ("POST", ["me", "books"]) => {
                let user = self.caller(request).unwrap_or_default();
                let isbn = Self::body_str(request, "isbn").unwrap_or_default();
                let mut state = self.state.borrow_mut();
                let Some(book) = state.books.iter().find(|b| b.isbn == isbn).cloned() else {
                    return fail(404, "Book not found or already on the list");
                };
                let list = state.lists.entry(user).or_default();
                if list.iter().any(|e| e.isbn == isbn) {
                    return fail(404, "Book not found or already on the list");
                }
                let entry = ReadingListEntry {
                    isbn: book.isbn,
                    title: book.title,
                    author: book.author,
                    is_read: false,
                };
                list.push(entry.clone());
                ok(json!(entry))
            }
            ("POST", ["me", "books", isbn, flag @ ("read" | "unread")]) => {
                let user = self.caller(request).unwrap_or_default();
                let mut state = self.state.borrow_mut();
                let list = state.lists.entry(user).or_default();
                match list.iter_mut().find(|e| e.isbn == *isbn) {
                    Some(entry) => {
                        entry.is_read = *flag == "read";
                        ok(json!(entry))
                    }
                    None => fail(404, "Book not found"),
                }
            }
            ("DELETE", ["me", "books", isbn]) => {
                let user = self.caller(request).unwrap_or_default();
                let mut state = self.state.borrow_mut();
                let list = state.lists.entry(user).or_default();
                let before = list.len();
                list.retain(|e| e.isbn != *isbn);
                if list.len() == before {
                    return fail(404, "Book not found");
                }
                ok(json!({ "message": "deleted", "deleted_isbn": isbn }))
            }
            _ => fail(404, "Not Found"),
        }
    }
}

impl Transport for FakeBackend {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        self.state.borrow_mut().requests.push(request.clone());
        if self.state.borrow().offline {
            return Err(ClientError::network("connection refused"));
        }
        Ok(self.route(request))
    }
}

pub fn client() -> TestClient {
    client_with(FakeBackend::new(), MemorySessionStore::new())
}

pub fn client_with(backend: FakeBackend, store: MemorySessionStore) -> TestClient {
    CatalogClient::new(backend, HtmlView::new(), store, Timing::immediate())
}

pub fn logged_in(username: &str, password: &str) -> TestClient {
    let mut client = client();
    client.login(username, password).expect("login");
    client
}

/// Shared, ordered record of what a `Recorded` transport and view saw.
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Wraps a transport or a view and notes requests and control toggles in
/// a journal shared by both, so their relative order can be checked.
pub struct Recorded<X> {
    pub inner: X,
    journal: Journal,
}

impl Transport for Recorded<FakeBackend> {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ClientError> {
        self.journal
            .borrow_mut()
            .push(format!("send {} {}", request.method, request.path()));
        self.inner.send(request)
    }
}

impl View for Recorded<HtmlView> {
    fn render(&mut self, region: Region, fragment: Fragment) {
        self.inner.render(region, fragment);
    }

    fn hide(&mut self, region: Region) {
        self.inner.hide(region);
    }

    fn show_status(&mut self, message: StatusMessage) {
        self.inner.show_status(message);
    }

    fn show_auth(&mut self, panel: AuthPanel) {
        self.inner.show_auth(panel);
    }

    fn open_dialog(&mut self, dialog: Dialog) {
        self.inner.open_dialog(dialog);
    }

    fn close_dialog(&mut self) {
        self.inner.close_dialog();
    }

    fn set_enabled(&mut self, control: Control, enabled: bool) {
        let state = if enabled { "enabled" } else { "disabled" };
        self.journal.borrow_mut().push(format!("{:?} {}", control, state));
        self.inner.set_enabled(control, enabled);
    }

    fn set_input(&mut self, input: Input, value: &str) {
        self.inner.set_input(input, value);
    }

    fn input(&self, input: Input) -> String {
        self.inner.input(input)
    }
}

pub type RecordedClient =
    CatalogClient<Recorded<FakeBackend>, Recorded<HtmlView>, MemorySessionStore>;

pub fn recorded_client(backend: FakeBackend) -> (RecordedClient, Journal) {
    let journal = Journal::default();
    let transport = Recorded {
        inner: backend,
        journal: journal.clone(),
    };
    let view = Recorded {
        inner: HtmlView::new(),
        journal: journal.clone(),
    };
    let client = CatalogClient::new(transport, view, MemorySessionStore::new(), Timing::immediate());
    (client, journal)
}
