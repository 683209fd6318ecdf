//! Client side of the session: an HTTP client that refreshes expired sessions
//! once per request, and the session state built on top of it.

mod api;
mod auth;
mod session;
mod users;

pub use api::ApiClient;
pub use session::{AuthSession, SessionState};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{message} ({status})")]
    Api { status: u16, message: String },
    /// A 401 could not be recovered by refreshing; the user has to log in again.
    #[error("session expired, login required")]
    SessionExpired,
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::SessionExpired => Some(401),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Encode(_) => None,
        }
    }

    /// Server-provided message, or `fallback` when there is none.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { message, .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_owned(),
        }
    }
}
