use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::{debug, warn};

use super::{cookie::{get_cookie, ACCESS_COOKIE_NAME}, jwt::JwtKeys};
use crate::{error::ApiError, state::AppState, users::repo::User};

/// Id of the caller, taken from a valid access-token cookie.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = get_cookie(&parts.headers, ACCESS_COOKIE_NAME)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify_access(token) {
            Some(claims) => Ok(AuthUser(claims.user_id)),
            None => {
                debug!("access token rejected");
                Err(ApiError::unauthorized("Invalid or expired token"))
            }
        }
    }
}

/// Like [`AuthUser`] but never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state).await.ok().map(|u| u.0),
        ))
    }
}

/// Caller's full record; only admins get through.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;

        let user = User::find_by_id(&state.db, &user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if !user.is_admin() {
            warn!(%user_id, "admin route denied");
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}
