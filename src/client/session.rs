use tracing::{debug, warn};

use super::{ApiClient, ClientError};
use crate::users::dto::PublicUser;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The initial "who am I" check has not finished.
    Loading,
    Authenticated(PublicUser),
    Unauthenticated,
}

/// Client-side view of the server session.
pub struct AuthSession {
    api: ApiClient,
    state: SessionState,
}

impl AuthSession {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: SessionState::Loading,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&PublicUser> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state == SessionState::Loading
    }

    /// Ask the server who we are. Any failure just means "not logged in".
    pub async fn check(&mut self) -> &SessionState {
        self.state = match self.api.current_user().await {
            Ok(user) => SessionState::Authenticated(user),
            Err(e) => {
                debug!(error = %e, "no active session");
                SessionState::Unauthenticated
            }
        };
        &self.state
    }

    /// On failure returns the server's message, or a generic one.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), String> {
        match self.api.login(email, password).await {
            Ok(res) => {
                self.state = SessionState::Authenticated(res.user);
                Ok(())
            }
            Err(e) => Err(e.message_or("Login failed")),
        }
    }

    pub async fn register(&mut self, email: &str, password: &str, name: &str) -> Result<(), String> {
        match self.api.register(email, password, name).await {
            Ok(res) => {
                self.state = SessionState::Authenticated(res.user);
                Ok(())
            }
            Err(e) => Err(e.message_or("Registration failed")),
        }
    }

    /// Ends unauthenticated even when the server call fails.
    pub async fn logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "logout request failed");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// Pass a call's result through, dropping the session if it expired.
    pub fn observe<T>(&mut self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if matches!(result, Err(ClientError::SessionExpired)) {
            self.state = SessionState::Unauthenticated;
        }
        result
    }
}
