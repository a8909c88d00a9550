// Wire payloads exchanged with the catalog backend. Field names follow the
// backend's JSON exactly.

use serde::{Deserialize, Serialize};

use crate::session::Role;

/// A catalog book as returned by `/books` and `/books/{isbn}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub isbn: String,
    pub title: String,
    pub author: String,
}

/// One row of the signed-in user's reading list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ReadingListEntry {
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub is_read: bool,
}

impl From<&ReadingListEntry> for Book {
    fn from(entry: &ReadingListEntry) -> Self {
        Book {
            isbn: entry.isbn.clone(),
            title: entry.title.clone(),
            author: entry.author.clone(),
        }
    }
}

/// Body of `/auth/login` and `/auth/register`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful `/auth/login` response.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(default)]
    pub role: Role,
}

/// Body of the add-book endpoints and `POST /me/books`.
#[derive(Serialize, Deserialize, Debug)]
pub struct IsbnRequest {
    pub isbn: String,
}

/// Partial update body; `None` leaves the field untouched server-side.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Error payload shape used by the backend for every non-2xx response.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The `detail` field as display text. Validation failures come back
    /// as a structured value; those are passed through as JSON.
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        }
    }
}
