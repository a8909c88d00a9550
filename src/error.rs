// Error taxonomy for the catalog client. Every variant is handled at the
// call site that produced it: the client reports it to a status region and
// hands it back so the menu can log it. None of them is fatal.

use thiserror::Error;

/// Result alias used across the client.
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Missing or malformed input, detected before any request is sent.
    #[error("{0}")]
    Validation(String),

    /// A role-gated action attempted without the required role, or a
    /// session-only action attempted while signed out.
    #[error("{0}")]
    Authorization(String),

    /// Non-2xx response. `message` is the server's `detail` verbatim when
    /// the payload carries one.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never produced a usable response (connect failure,
    /// broken body, undecodable JSON).
    #[error("{0}")]
    Network(String),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ClientError::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        ClientError::Authorization(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        ClientError::Network(msg.into())
    }

    /// True when the error was raised locally, i.e. no request went out.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_) | ClientError::Authorization(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Network(format!("Invalid response payload: {}", err))
    }
}
