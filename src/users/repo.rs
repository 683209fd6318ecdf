use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::Database;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Parse the wire name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

/// User record as stored in `users.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never leaves the store
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields for a user about to be inserted. The password is already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("email already exists")]
    EmailTaken,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Millisecond timestamp id, bumped past any id already taken.
fn next_id(users: &[User], now: OffsetDateTime) -> String {
    let mut candidate = (now.unix_timestamp_nanos() / 1_000_000) as i64;
    while users.iter().any(|u| u.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub async fn list(db: &Database) -> anyhow::Result<Vec<User>> {
        db.users.load().await
    }

    pub async fn find_by_email(db: &Database, email: &str) -> anyhow::Result<Option<User>> {
        Ok(db.users.load().await?.into_iter().find(|u| u.email == email))
    }

    pub async fn find_by_id(db: &Database, id: &str) -> anyhow::Result<Option<User>> {
        Ok(db.users.load().await?.into_iter().find(|u| u.id == id))
    }

    /// Insert a user; the email uniqueness check and the append happen under one lock.
    pub async fn create(db: &Database, new: NewUser) -> Result<User, RepoError> {
        let created = db
            .users
            .update(|users| {
                if users.iter().any(|u| u.email == new.email) {
                    return Err(RepoError::EmailTaken);
                }
                let now = OffsetDateTime::now_utc();
                let user = User {
                    id: next_id(users, now),
                    email: new.email,
                    password_hash: new.password_hash,
                    name: new.name,
                    role: new.role,
                    created_at: now,
                };
                users.push(user.clone());
                Ok(user)
            })
            .await??;
        Ok(created)
    }

    pub async fn update(db: &Database, id: &str, changes: UserChanges) -> Result<User, RepoError> {
        let updated = db
            .users
            .update(|users| {
                if let Some(email) = &changes.email {
                    if users.iter().any(|u| &u.email == email && u.id != id) {
                        return Err(RepoError::EmailTaken);
                    }
                }
                let user = users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(RepoError::NotFound)?;
                if let Some(email) = changes.email {
                    user.email = email;
                }
                if let Some(name) = changes.name {
                    user.name = name;
                }
                if let Some(role) = changes.role {
                    user.role = role;
                }
                if let Some(hash) = changes.password_hash {
                    user.password_hash = hash;
                }
                Ok(user.clone())
            })
            .await??;
        Ok(updated)
    }

    pub async fn set_password_by_email(
        db: &Database,
        email: &str,
        password_hash: String,
    ) -> Result<User, RepoError> {
        let updated = db
            .users
            .update(|users| {
                let user = users
                    .iter_mut()
                    .find(|u| u.email == email)
                    .ok_or(RepoError::NotFound)?;
                user.password_hash = password_hash;
                Ok::<_, RepoError>(user.clone())
            })
            .await??;
        Ok(updated)
    }

    pub async fn delete(db: &Database, id: &str) -> Result<(), RepoError> {
        db.users
            .update(|users| {
                let idx = users
                    .iter()
                    .position(|u| u.id == id)
                    .ok_or(RepoError::NotFound)?;
                users.remove(idx);
                Ok(())
            })
            .await?
    }
}
