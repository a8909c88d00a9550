// Session & catalog orchestrator.
//
// Every public operation validates its input, issues its request(s),
// renders the result through the `View`, reports a status, and returns
// the outcome. Errors are already reported when they come back; callers
// only log them.

use tracing::{debug, info, instrument, warn};

use crate::api::{ApiRequest, ApiResponse, Transport};
use crate::config::Timing;
use crate::endpoints::{self, Action};
use crate::error::{ClientError, Result};
use crate::isbn;
use crate::models::{Book, BookUpdate, Credentials, IsbnRequest, LoginResponse, ReadingListEntry};
use crate::session::{Role, Session, SessionStore};
use crate::view::{
    AuthPanel, Card, Control, Dialog, Fragment, Input, Region, StatusKind, StatusMessage,
    StatusTarget, View,
};

const LOADING: &str = "Loading books...";

pub struct CatalogClient<T, V, S> {
    transport: T,
    view: V,
    store: S,
    session: Session,
    timing: Timing,
}

impl<T: Transport, V: View, S: SessionStore> CatalogClient<T, V, S> {
    pub fn new(transport: T, view: V, store: S, timing: Timing) -> Self {
        CatalogClient {
            transport,
            view,
            store,
            session: Session::default(),
            timing,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---------- plumbing ----------

    fn request(&self, action: Action) -> Result<ApiRequest> {
        let endpoint = endpoints::resolve(self.session.role, &action)?;
        Ok(ApiRequest::new(endpoint, self.session.token.as_deref()))
    }

    fn send(&self, request: ApiRequest, fallback: &str) -> Result<ApiResponse> {
        debug!(method = %request.method, path = %request.path(), "dispatch");
        self.transport.send(&request)?.error_for_status(fallback)
    }

    fn status(&mut self, target: StatusTarget, kind: StatusKind, text: impl Into<String>) {
        self.view.show_status(StatusMessage {
            target,
            kind,
            text: text.into(),
            ttl: self.timing.status_ttl,
        });
    }

    /// Report `result` on `target` when it failed, then hand it back.
    fn report<R>(&mut self, target: StatusTarget, result: Result<R>) -> Result<R> {
        if let Err(err) = &result {
            warn!(error = %err, "operation failed");
            self.status(target, StatusKind::Error, err.to_string());
        }
        result
    }

    fn pause_before_reload(&self) {
        if !self.timing.reload_delay.is_zero() {
            std::thread::sleep(self.timing.reload_delay);
        }
    }

    // Reload failures are already rendered into their region and logged
    // by the loader.
    fn reload_books(&mut self) {
        if let Err(err) = self.load_books() {
            debug!(error = %err, "catalog reload failed");
        }
    }

    fn reload_to_read(&mut self) {
        if let Err(err) = self.load_user_to_read() {
            debug!(error = %err, "to-read reload failed");
        }
    }

    fn reload_lists(&mut self) {
        self.reload_to_read();
        if let Err(err) = self.load_user_read_books() {
            debug!(error = %err, "finished-books reload failed");
        }
    }

    fn require_login(&self) -> Result<()> {
        if self.session.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::authorization("Please log in."))
        }
    }

    // ---------- auth ----------

    fn credentials(username: &str, password: &str) -> Result<Credentials> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::validation("Username and password are required."));
        }
        Ok(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    #[instrument(skip(self, password))]
    pub fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let result = self.try_login(username, password);
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            self.refresh_auth_view();
            self.reload_books();
            self.status(StatusTarget::General, StatusKind::Success, "Logged in.");
        }
        result
    }

    fn try_login(&mut self, username: &str, password: &str) -> Result<()> {
        let body = serde_json::to_value(Self::credentials(username, password)?)?;
        let request = self.request(Action::Login)?.json(body);
        let resp: LoginResponse = self.send(request, "Login failed")?.json()?;
        info!(username = %resp.username, role = %resp.role, "logged in");
        self.session = Session::new(resp.token, resp.username, resp.role);
        Ok(())
    }

    /// Create an account. Success only confirms; it does not sign in.
    #[instrument(skip(self, password))]
    pub fn register(&mut self, username: &str, password: &str) -> Result<()> {
        let result = self.try_register(username, password);
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            self.status(
                StatusTarget::General,
                StatusKind::Success,
                "Registration successful. You can log in now.",
            );
        }
        result
    }

    fn try_register(&self, username: &str, password: &str) -> Result<()> {
        let body = serde_json::to_value(Self::credentials(username, password)?)?;
        let request = self.request(Action::Register)?.json(body);
        self.send(request, "Registration failed").map(|_| ())
    }

    /// Best-effort notify the backend, then always drop the local session
    /// and the persisted record and show the public catalog.
    #[instrument(skip(self))]
    pub fn logout(&mut self) -> Result<()> {
        if self.session.is_authenticated() {
            let notified = self
                .request(Action::Logout)
                .and_then(|req| self.send(req, "Logout failed"));
            if let Err(err) = notified {
                warn!(error = %err, "logout notification failed; ignoring");
            }
        }
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear persisted session");
        }
        self.session.clear();
        self.refresh_auth_view();
        self.reload_books();
        self.status(StatusTarget::General, StatusKind::Info, "Logged out.");
        Ok(())
    }

    /// Reflect the session in the header and panels. A regular user's
    /// reading lists are loaded along the way.
    pub fn refresh_auth_view(&mut self) {
        if !self.session.is_authenticated() {
            self.view.show_auth(AuthPanel::LoggedOut);
            return;
        }
        self.view.show_auth(AuthPanel::LoggedIn {
            username: self.session.username.clone().unwrap_or_default(),
            role: self.session.role,
        });
        if self.session.role != Role::Admin {
            self.reload_lists();
        }
    }

    /// Adopt a persisted session and revalidate it with `/me`. An invalid
    /// or unverifiable token logs out.
    #[instrument(skip(self))]
    pub fn restore_session(&mut self) -> Result<()> {
        let saved = match self.store.load() {
            Ok(Some(saved)) if saved.is_authenticated() => saved,
            Ok(_) => return Ok(()),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable persisted session");
                return Ok(());
            }
        };
        self.session = saved;
        let checked = self
            .request(Action::Me)
            .and_then(|req| self.send(req, "Session check failed"));
        match checked {
            Ok(_) => {
                info!("restored persisted session");
                self.refresh_auth_view();
                Ok(())
            }
            Err(err) => {
                info!(error = %err, "persisted session rejected; logging out");
                self.logout()?;
                Err(err)
            }
        }
    }

    /// Write the session record if a token is held, clear it otherwise.
    pub fn persist_session(&self) -> anyhow::Result<()> {
        if self.session.is_authenticated() {
            self.store.save(&self.session)
        } else {
            self.store.clear()
        }
    }

    /// Liveness probe against `/health`.
    pub fn test_connection(&self) -> bool {
        self.request(Action::Health)
            .and_then(|req| self.send(req, "Health check failed"))
            .is_ok()
    }

    /// Probe the backend and show an error status when it is unreachable.
    pub fn check_connection(&mut self) -> bool {
        let ok = self.test_connection();
        if !ok {
            warn!("catalog API unreachable");
            self.status(
                StatusTarget::General,
                StatusKind::Error,
                "Cannot reach the catalog API. Is the server running?",
            );
        }
        ok
    }

    // ---------- catalog ----------

    /// Fetch the whole catalog, bypassing caches, and render it.
    #[instrument(skip(self))]
    pub fn load_books(&mut self) -> Result<Vec<Book>> {
        self.view
            .render(Region::Catalog, Fragment::Loading(LOADING.into()));
        let result = self
            .request(Action::ListBooks)
            .and_then(|req| self.send(req.no_store(), "Loading books failed"))
            .and_then(|resp| resp.json::<Vec<Book>>());
        match &result {
            Ok(books) if books.is_empty() => self.view.render(
                Region::Catalog,
                Fragment::Empty("The library has no books yet.".into()),
            ),
            Ok(books) => {
                let role = self.session.role;
                let cards = books.iter().map(|b| Card::catalog(b, role)).collect();
                self.view.render(Region::Catalog, Fragment::Grid(cards));
            }
            Err(err) => {
                warn!(error = %err, "loading books failed");
                self.view.render(
                    Region::Catalog,
                    Fragment::Error("Something went wrong while loading books.".into()),
                );
            }
        }
        result
    }

    /// Add a book by ISBN; admins go through the admin route.
    #[instrument(skip(self))]
    pub fn add_book(&mut self, raw_isbn: &str) -> Result<Book> {
        let isbn = match isbn::parse(raw_isbn) {
            Ok(isbn) => isbn,
            Err(err) => return self.report(StatusTarget::General, Err(err)),
        };
        self.status(
            StatusTarget::General,
            StatusKind::Info,
            "Fetching book details from the metadata provider...",
        );
        let result = self.try_add_book(isbn);
        let result = self.report(StatusTarget::General, result);
        if let Ok(book) = &result {
            info!(isbn = %book.isbn, "book added");
            self.status(
                StatusTarget::General,
                StatusKind::Success,
                format!("Book added: {} by {}", book.title, book.author),
            );
            self.view.set_input(Input::AddIsbn, "");
            self.pause_before_reload();
            self.reload_books();
        }
        result
    }

    fn try_add_book(&self, isbn: String) -> Result<Book> {
        let body = serde_json::to_value(IsbnRequest { isbn })?;
        let request = self.request(Action::AddBook)?.json(body);
        self.send(request, "Adding the book failed")?.json()
    }

    /// Look one book up and show it as a single card.
    #[instrument(skip(self))]
    pub fn search_book(&mut self, raw_isbn: &str) -> Result<Book> {
        let result = isbn::parse(raw_isbn).and_then(|isbn| {
            let req = self.request(Action::GetBook(isbn))?;
            self.send(req, "Searching the book failed")?.json::<Book>()
        });
        match &result {
            Ok(book) => {
                let card = Card::catalog(book, self.session.role);
                self.view.render(Region::SearchResult, Fragment::Single(card));
            }
            Err(ClientError::Validation(_)) => {}
            Err(_) => self.view.hide(Region::SearchResult),
        }
        self.report(StatusTarget::General, result)
    }

    /// Admin-only partial update of title and/or author.
    #[instrument(skip(self))]
    pub fn update_book(&mut self, raw_isbn: &str, title: &str, author: &str) -> Result<Book> {
        let prepared = self.prepare_update(raw_isbn, title, author);
        let request = match prepared {
            Ok(req) => req,
            Err(err) => return self.report(StatusTarget::Editor, Err(err)),
        };
        self.view.set_enabled(Control::UpdateBook, false);
        let result = self
            .send(request, "Update failed")
            .and_then(|resp| resp.json::<Book>());
        self.view.set_enabled(Control::UpdateBook, true);
        let result = self.report(StatusTarget::Editor, result);
        if let Ok(book) = &result {
            info!(isbn = %book.isbn, "book updated");
            self.status(StatusTarget::Editor, StatusKind::Success, "Book updated.");
            self.view.set_input(Input::UpdateTitle, "");
            self.view.set_input(Input::UpdateAuthor, "");
            self.pause_before_reload();
            self.reload_books();
        }
        result
    }

    fn prepare_update(&self, raw_isbn: &str, title: &str, author: &str) -> Result<ApiRequest> {
        if !self.session.is_admin() {
            return Err(ClientError::authorization(
                "This action requires an admin account.",
            ));
        }
        let isbn = isbn::parse(raw_isbn)?;
        let title = title.trim();
        let author = author.trim();
        if title.is_empty() && author.is_empty() {
            return Err(ClientError::validation(
                "Nothing to update. Enter a title or an author.",
            ));
        }
        let update = BookUpdate {
            title: Some(title.to_string()).filter(|s| !s.is_empty()),
            author: Some(author.to_string()).filter(|s| !s.is_empty()),
        };
        Ok(self
            .request(Action::UpdateBook(isbn))?
            .json(serde_json::to_value(update)?))
    }

    /// Copy a book into the edit form. Admin only; others are ignored.
    pub fn prefill_edit_form(&mut self, book: &Book) {
        if !self.session.is_admin() {
            return;
        }
        self.view.set_input(Input::UpdateIsbn, &book.isbn);
        self.view.set_input(Input::UpdateTitle, &book.title);
        self.view.set_input(Input::UpdateAuthor, &book.author);
        self.status(
            StatusTarget::Editor,
            StatusKind::Info,
            "Edit form filled in.",
        );
    }

    pub fn show_delete_dialog(&mut self, book: &Book) {
        self.view.open_dialog(Dialog::ConfirmDelete(book.clone()));
    }

    pub fn close_dialog(&mut self) {
        self.view.close_dialog();
    }

    /// Delete a book; admins go through the admin route.
    #[instrument(skip(self))]
    pub fn delete_book(&mut self, isbn: &str) -> Result<()> {
        let result = self
            .request(Action::DeleteBook(isbn.trim().to_string()))
            .and_then(|req| self.send(req, "Deleting the book failed"))
            .map(|_| ());
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            info!(isbn, "book deleted");
            self.status(StatusTarget::General, StatusKind::Success, "Book deleted.");
            self.view.close_dialog();
            self.reload_books();
            self.view.hide(Region::SearchResult);
        }
        result
    }

    // ---------- reading list ----------

    fn fetch_entries(&self, action: Action, fallback: &str) -> Result<Vec<ReadingListEntry>> {
        let resp = self.send(self.request(action)?, fallback)?;
        // anything but a list is treated as empty
        let value: serde_json::Value = resp.json()?;
        match value {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Unread entries of the user's list. No-op when signed out.
    #[instrument(skip(self))]
    pub fn load_user_to_read(&mut self) -> Result<Vec<ReadingListEntry>> {
        if !self.session.is_authenticated() {
            return Ok(Vec::new());
        }
        self.view.render(Region::ToRead, Fragment::Loading(LOADING.into()));
        let result = self
            .fetch_entries(Action::ListMyBooks, "Loading your books failed")
            .map(|entries| entries.into_iter().filter(|e| !e.is_read).collect::<Vec<_>>());
        let fragment = match &result {
            Ok(unread) if unread.is_empty() => Fragment::Empty("No books to read.".into()),
            Ok(unread) => Fragment::Grid(unread.iter().map(Card::to_read).collect()),
            Err(err) => {
                warn!(error = %err, "loading reading list failed");
                Fragment::Error("Your books could not be loaded.".into())
            }
        };
        self.view.render(Region::ToRead, fragment);
        result
    }

    /// Completed entries of the user's list. No-op when signed out.
    #[instrument(skip(self))]
    pub fn load_user_read_books(&mut self) -> Result<Vec<ReadingListEntry>> {
        if !self.session.is_authenticated() {
            return Ok(Vec::new());
        }
        self.view
            .render(Region::ReadBooks, Fragment::Loading(LOADING.into()));
        let result = self.fetch_entries(Action::ListMyReadBooks, "Loading finished books failed");
        let fragment = match &result {
            Ok(read) if read.is_empty() => Fragment::Empty("You have not finished any books yet.".into()),
            Ok(read) => Fragment::Grid(read.iter().map(Card::finished).collect()),
            Err(err) => {
                warn!(error = %err, "loading finished books failed");
                Fragment::Error("Your finished books could not be loaded.".into())
            }
        };
        self.view.render(Region::ReadBooks, fragment);
        result
    }

    /// Put an ISBN on the user's list. Signed out: status only, no request.
    #[instrument(skip(self))]
    pub fn user_add_book(&mut self, raw_isbn: &str) -> Result<ReadingListEntry> {
        let result = self.try_user_add_book(raw_isbn);
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            self.view.set_input(Input::UserIsbn, "");
            self.reload_to_read();
            self.status(StatusTarget::General, StatusKind::Success, "Added to your list.");
        }
        result
    }

    fn try_user_add_book(&self, raw_isbn: &str) -> Result<ReadingListEntry> {
        self.require_login()?;
        let body = serde_json::to_value(IsbnRequest {
            isbn: isbn::parse(raw_isbn)?,
        })?;
        let request = self.request(Action::AddMyBook)?.json(body);
        self.send(request, "Adding to your list failed")?.json()
    }

    /// Mark an entry read or unread and refetch both lists. Signed out:
    /// nothing happens.
    #[instrument(skip(self))]
    pub fn toggle_read(&mut self, isbn: &str, make_read: bool) -> Result<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        let result = self
            .request(Action::SetRead {
                isbn: isbn.trim().to_string(),
                read: make_read,
            })
            .and_then(|req| self.send(req, "Updating the read state failed"))
            .map(|_| ());
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            self.reload_lists();
        }
        result
    }

    /// Drop an entry from the user's list and refetch both lists. Signed
    /// out: nothing happens.
    #[instrument(skip(self))]
    pub fn remove_from_user(&mut self, isbn: &str) -> Result<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        let result = self
            .request(Action::RemoveMyBook(isbn.trim().to_string()))
            .and_then(|req| self.send(req, "Removing from your list failed"))
            .map(|_| ());
        let result = self.report(StatusTarget::General, result);
        if result.is_ok() {
            self.reload_lists();
            self.status(StatusTarget::General, StatusKind::Success, "Removed from your list.");
        }
        result
    }
}
