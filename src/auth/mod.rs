use crate::state::AppState;
use axum::Router;

mod claims;
pub mod cookie;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod mailer;
pub mod otp;
pub mod password;
pub(crate) mod services;

pub use claims::{Claims, TokenKind};
pub use dto::*;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
