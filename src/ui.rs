// UI layer: an interactive menu using `dialoguer`. Each menu choice is one
// user event; it collects input, hands it to the client and moves on.
// Failures were already shown by the client, so they are only logged here.

use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::Transport;
use crate::client::CatalogClient;
use crate::error::ClientError;
use crate::models::Book;
use crate::session::{Role, Session, SessionStore};
use crate::view::{Input as Field, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Browse,
    Search,
    AddBook,
    EditBook,
    DeleteBook,
    MyList,
    AddToList,
    ToggleRead,
    RemoveFromList,
    Login,
    Register,
    Logout,
    Exit,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Browse => "Browse catalog",
            MenuItem::Search => "Search by ISBN",
            MenuItem::AddBook => "Add book",
            MenuItem::EditBook => "Edit book",
            MenuItem::DeleteBook => "Delete book",
            MenuItem::MyList => "My reading list",
            MenuItem::AddToList => "Add to my list",
            MenuItem::ToggleRead => "Mark read / unread",
            MenuItem::RemoveFromList => "Remove from my list",
            MenuItem::Login => "Login",
            MenuItem::Register => "Register",
            MenuItem::Logout => "Logout",
            MenuItem::Exit => "Exit",
        }
    }
}

/// Menu entries offered for the current session.
pub fn menu_items(session: &Session) -> Vec<MenuItem> {
    use MenuItem::*;
    match (session.is_authenticated(), session.role) {
        (false, _) => vec![Browse, Search, AddBook, Login, Register, Exit],
        (true, Role::Admin) => vec![Browse, Search, AddBook, EditBook, DeleteBook, Logout, Exit],
        (true, _) => vec![
            Browse,
            Search,
            AddBook,
            MyList,
            AddToList,
            ToggleRead,
            RemoveFromList,
            Logout,
            Exit,
        ],
    }
}

/// Main interactive menu. Runs until the user chooses "Exit".
pub fn main_menu<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    loop {
        let items = menu_items(client.session());
        let labels: Vec<&str> = items.iter().map(|i| i.label()).collect();
        let prompt = match &client.session().username {
            Some(name) if client.session().is_authenticated() => {
                format!("{} ({})", name, client.session().role)
            }
            _ => "Library catalog".to_string(),
        };
        let selection = Select::new()
            .with_prompt(prompt)
            .items(&labels)
            .default(0)
            .interact()?;
        match items[selection] {
            MenuItem::Browse => handled(with_spinner("Loading books...", || client.load_books())),
            MenuItem::Search => {
                let isbn = prompt_field(client, Field::SearchIsbn, "ISBN")?;
                handled(client.search_book(&isbn));
            }
            MenuItem::AddBook => {
                let isbn = prompt_field(client, Field::AddIsbn, "ISBN")?;
                handled(with_spinner("Adding book...", || client.add_book(&isbn)));
            }
            MenuItem::EditBook => handle_edit(client)?,
            MenuItem::DeleteBook => handle_delete(client)?,
            MenuItem::MyList => {
                handled(client.load_user_to_read());
                handled(client.load_user_read_books());
            }
            MenuItem::AddToList => {
                let isbn = prompt_field(client, Field::UserIsbn, "ISBN")?;
                handled(client.user_add_book(&isbn));
            }
            MenuItem::ToggleRead => handle_toggle(client)?,
            MenuItem::RemoveFromList => handle_remove(client)?,
            MenuItem::Login => handle_login(client)?,
            MenuItem::Register => {
                let (username, password) = prompt_credentials(client)?;
                handled(client.register(&username, &password));
            }
            MenuItem::Logout => handled(client.logout()),
            MenuItem::Exit => break,
        }
    }
    Ok(())
}

fn handled<R>(result: std::result::Result<R, ClientError>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "handled in menu");
    }
}

/// Show a spinner while `f` talks to the backend.
fn with_spinner<R>(message: &str, f: impl FnOnce() -> R) -> R {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    let out = f();
    spinner.finish_and_clear();
    out
}

/// Prompt for a form field, starting from what the view holds for it,
/// and write the answer back to the view.
fn prompt_field<T, V, S>(client: &mut CatalogClient<T, V, S>, field: Field, prompt: &str) -> Result<String>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let value: String = Input::new()
        .with_prompt(prompt)
        .with_initial_text(client.view().input(field))
        .allow_empty(true)
        .interact_text()?;
    client.view_mut().set_input(field, &value);
    Ok(value)
}

fn prompt_credentials<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<(String, String)>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let username = prompt_field(client, Field::Username, "Username")?;
    // `Password` hides input in terminal for passwords.
    let password: String = Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()?;
    Ok((username, password))
}

fn handle_login<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let (username, password) = prompt_credentials(client)?;
    handled(with_spinner("Logging in...", || client.login(&username, &password)));
    Ok(())
}

/// Look the book up, fill the edit form from it and send the changes.
fn handle_edit<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let isbn = prompt_field(client, Field::UpdateIsbn, "ISBN")?;
    let Some(book) = edit_target(client, &isbn) else {
        return Ok(());
    };
    let isbn = book.isbn;
    let title = prompt_field(client, Field::UpdateTitle, "Title")?;
    let author = prompt_field(client, Field::UpdateAuthor, "Author")?;
    handled(with_spinner("Saving...", || client.update_book(&isbn, &title, &author)));
    Ok(())
}

/// Look up the book to edit and prefill the form. `None` when the lookup
/// failed; the client has already reported why.
fn edit_target<T, V, S>(client: &mut CatalogClient<T, V, S>, isbn: &str) -> Option<Book>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let book = client.search_book(isbn).ok()?;
    client.prefill_edit_form(&book);
    Some(book)
}

fn handle_delete<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let isbn = prompt_field(client, Field::SearchIsbn, "ISBN")?;
    let book = match client.search_book(&isbn) {
        Ok(book) => book,
        Err(_) => return Ok(()),
    };
    client.show_delete_dialog(&book);
    let confirmed = Confirm::new()
        .with_prompt("Delete this book?")
        .default(false)
        .interact()?;
    if confirmed {
        handled(client.delete_book(&book.isbn));
    } else {
        client.close_dialog();
    }
    Ok(())
}

fn handle_toggle<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let mut entries = client.load_user_to_read().unwrap_or_default();
    entries.extend(client.load_user_read_books().unwrap_or_default());
    if entries.is_empty() {
        return Ok(());
    }
    let labels: Vec<String> = entries
        .iter()
        .map(|e| {
            let state = if e.is_read { "read" } else { "to read" };
            format!("{} ({}) [{}]", e.title, state, e.isbn)
        })
        .collect();
    let selection = Select::new()
        .with_prompt("Which book?")
        .items(&labels)
        .default(0)
        .interact()?;
    let entry = &entries[selection];
    handled(client.toggle_read(&entry.isbn, !entry.is_read));
    Ok(())
}

fn handle_remove<T, V, S>(client: &mut CatalogClient<T, V, S>) -> Result<()>
where
    T: Transport,
    V: View,
    S: SessionStore,
{
    let entries = client.load_user_to_read().unwrap_or_default();
    if entries.is_empty() {
        return Ok(());
    }
    let labels: Vec<String> = entries
        .iter()
        .map(|e| format!("{} [{}]", e.title, e.isbn))
        .collect();
    let selection = Select::new()
        .with_prompt("Remove which book?")
        .items(&labels)
        .default(0)
        .interact()?;
    handled(client.remove_from_user(&entries[selection].isbn));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiRequest, ApiResponse};
    use crate::config::Timing;
    use crate::html::HtmlView;
    use crate::session::MemorySessionStore;
    use std::cell::Cell;

    /// Accepts the session check and answers everything else with one
    /// canned response, counting requests.
    struct Canned {
        status: u16,
        body: &'static str,
        sent: Cell<usize>,
    }

    impl Transport for Canned {
        fn send(&self, request: &ApiRequest) -> crate::error::Result<ApiResponse> {
            self.sent.set(self.sent.get() + 1);
            if request.path() == "/me" {
                return Ok(ApiResponse::new(200, "{}"));
            }
            Ok(ApiResponse::new(self.status, self.body))
        }
    }

    fn admin_client(status: u16, body: &'static str) -> CatalogClient<Canned, HtmlView, MemorySessionStore> {
        let store = MemorySessionStore::with_session(&Session::new("t", "root", Role::Admin))
            .expect("seed store");
        let mut client = CatalogClient::new(
            Canned { status, body, sent: Cell::new(0) },
            HtmlView::new(),
            store,
            Timing::immediate(),
        );
        client.restore_session().expect("restore");
        client
    }

    #[test]
    fn edit_stops_when_lookup_fails() {
        let mut client = admin_client(404, r#"{"detail":"No book found for ISBN 9780441013593."}"#);
        let sent = client.transport().sent.get();
        assert!(edit_target(&mut client, "9780441013593").is_none());
        assert_eq!(client.transport().sent.get(), sent + 1);
        assert!(edit_target(&mut client, "12").is_none());
        assert_eq!(client.transport().sent.get(), sent + 1);
        assert_eq!(client.view().input(Field::UpdateTitle), "");
    }

    #[test]
    fn edit_prefills_from_lookup() {
        let mut client = admin_client(
            200,
            r#"{"isbn":"9780441013593","title":"Dune","author":"Frank Herbert"}"#,
        );
        let book = edit_target(&mut client, "978-0441013593").expect("found");
        assert_eq!(book.isbn, "9780441013593");
        assert_eq!(client.view().input(Field::UpdateTitle), "Dune");
    }

    #[test]
    fn menu_follows_session() {
        let anonymous = menu_items(&Session::default());
        assert!(anonymous.contains(&MenuItem::Login));
        assert!(!anonymous.contains(&MenuItem::MyList));

        let user = menu_items(&Session::new("t", "ada", Role::User));
        assert!(user.contains(&MenuItem::ToggleRead));
        assert!(!user.contains(&MenuItem::EditBook));
        assert!(!user.contains(&MenuItem::Login));

        let admin = menu_items(&Session::new("t", "root", Role::Admin));
        assert!(admin.contains(&MenuItem::EditBook));
        assert!(admin.contains(&MenuItem::DeleteBook));
        assert!(!admin.contains(&MenuItem::MyList));
    }
}
