//! Cookie-session admin dashboard backend with a JSON-file user store,
//! plus a client that keeps a session alive against it.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod users;
