use crate::{auth::password::hash_password, config::SeedAdmin, state::AppState, store::Database};
use axum::Router;
use tracing::info;

pub mod dto;
pub mod handlers;
pub mod repo;

use repo::{NewUser, RepoError, Role, User};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::user_routes())
}

/// Create the bootstrap admin unless that email is already registered.
/// Returns whether a user was created.
pub async fn seed_admin(db: &Database, seed: &SeedAdmin) -> anyhow::Result<bool> {
    let email = seed.email.trim().to_lowercase();
    if User::find_by_email(db, &email).await?.is_some() {
        return Ok(false);
    }
    let new = NewUser {
        email,
        password_hash: hash_password(&seed.password).await?,
        name: seed.name.clone(),
        role: Role::Admin,
    };
    match User::create(db, new).await {
        Ok(user) => {
            info!(user_id = %user.id, email = %user.email, "seeded admin user");
            Ok(true)
        }
        Err(RepoError::EmailTaken) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
