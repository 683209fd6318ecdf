use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        CreateUserRequest, PublicUser, UpdateUserRequest, UserEnvelope, UserListResponse,
        UserMessageResponse,
    },
    repo::{NewUser, Role, User, UserChanges},
};
use crate::{
    auth::{
        extractors::AdminUser,
        password::hash_password,
        services::{normalize_email, require, validate_email, validate_password},
        MessageResponse,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<UserListResponse>> {
    let users = User::list(&state.db).await?;
    Ok(Json(UserListResponse {
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(state, _admin))]
pub async fn get_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<UserEnvelope>> {
    let user = User::find_by_id(&state.db, &id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserMessageResponse>)> {
    let Json(payload) = payload?;
    require(
        &[payload.email.as_str(), payload.password.as_str(), payload.name.as_str()],
        "Email, password, and name are required",
    )?;
    let email = normalize_email(&payload.email);
    validate_email(&email)?;
    validate_password(&payload.password)?;

    let password_hash = hash_password(&payload.password).await?;
    let user = User::create(
        &state.db,
        NewUser {
            email,
            password_hash,
            name: payload.name.trim().to_owned(),
            role: payload.role.unwrap_or_default(),
        },
    )
    .await?;

    info!(admin_id = %admin.id, user_id = %user.id, role = ?user.role, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserMessageResponse {
            message: "User created successfully".into(),
            user: user.into(),
        }),
    ))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

#[instrument(skip(state, admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<UserMessageResponse>> {
    let Json(payload) = payload?;

    let email = non_blank(payload.email).map(|e| normalize_email(&e));
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let role = match non_blank(payload.role) {
        Some(r) => Some(
            Role::parse(&r).ok_or_else(|| ApiError::bad_request("Role must be admin or user"))?,
        ),
        None => None,
    };
    // Passwords are not trimmed; only an all-empty value counts as absent.
    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(p) => {
            validate_password(&p)?;
            Some(hash_password(&p).await?)
        }
        None => None,
    };

    let user = User::update(
        &state.db,
        &id,
        UserChanges {
            email,
            name: non_blank(payload.name),
            role,
            password_hash,
        },
    )
    .await?;

    info!(admin_id = %admin.id, user_id = %user.id, "user updated");
    Ok(Json(UserMessageResponse {
        message: "User updated successfully".into(),
        user: user.into(),
    }))
}

#[instrument(skip(state, admin))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    if id == admin.id {
        warn!(admin_id = %admin.id, "admin tried to delete own account");
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    User::delete(&state.db, &id).await?;
    info!(admin_id = %admin.id, user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
