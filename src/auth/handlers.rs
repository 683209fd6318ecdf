use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    cookie::{cleared_cookies, get_cookie, session_cookies, REFRESH_COOKIE_NAME},
    dto::{
        AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
        ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
    },
    extractors::{AuthUser, MaybeAuthUser},
    otp,
    password::{hash_password, verify_password},
    services::{normalize_email, require, validate_email, validate_password},
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::UserEnvelope,
        repo::{NewUser, Role, User},
    },
};

const FORGOT_PASSWORD_REPLY: &str = "If the email exists, an OTP has been sent";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/verify-otp", post(verify_otp))
        .route("/auth/reset-password", post(reset_password))
}

/// Mint a token pair for `user_id` and wrap it in `Set-Cookie` headers.
fn start_session(state: &AppState, user_id: &str) -> ApiResult<HeaderMap> {
    let pair = state.keys.issue_pair(user_id)?;
    Ok(session_cookies(&state.keys, &pair, state.secure_cookies()))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    require(
        &[payload.email.as_str(), payload.password.as_str()],
        "Email and password are required",
    )?;
    let email = normalize_email(&payload.email);

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(payload.password.as_str(), &user.password_hash).await? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let cookies = start_session(&state, &user.id)?;
    info!(user_id = %user.id, %email, "user logged in");
    Ok((
        cookies,
        Json(AuthResponse {
            message: "Login successful".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
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
            role: Role::User,
        },
    )
    .await
    .map_err(|e| {
        warn!(error = %e, "register rejected");
        ApiError::from(e)
    })?;

    let cookies = start_session(&state, &user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        cookies,
        Json(AuthResponse {
            message: "Registration successful".into(),
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    MaybeAuthUser(user_id): MaybeAuthUser,
) -> (HeaderMap, Json<MessageResponse>) {
    match user_id {
        Some(user_id) => info!(%user_id, "user logged out"),
        None => info!("logout without a live session"),
    }
    (
        cleared_cookies(state.secure_cookies()),
        Json(MessageResponse::new("Logout successful")),
    )
}

#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("Refresh token required"))?;

    let claims = state
        .keys
        .verify_refresh(token)
        .ok_or_else(|| ApiError::unauthorized("Invalid refresh token"))?;

    let user = User::find_by_id(&state.db, &claims.user_id)
        .await?
        .ok_or_else(|| {
            warn!(user_id = %claims.user_id, "refresh for missing user");
            ApiError::unauthorized("User not found")
        })?;

    let cookies = start_session(&state, &user.id)?;
    info!(user_id = %user.id, "session refreshed");
    Ok((cookies, Json(MessageResponse::new("Token refreshed successfully"))))
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<UserEnvelope>> {
    let user = User::find_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(UserEnvelope { user: user.into() }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    payload: Result<Json<ForgotPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(payload) = payload?;
    require(&[payload.email.as_str()], "Email is required")?;
    let email = normalize_email(&payload.email);

    if User::find_by_email(&state.db, &email).await?.is_some() {
        let record = otp::issue(&state.db, &email, state.otp_ttl()).await?;
        if let Err(e) = state.mailer.send_otp(&email, &record.otp).await {
            // The reply must not differ from the unknown-email case.
            error!(error = %e, %email, "otp delivery failed");
        }
    } else {
        info!(%email, "password reset for unknown email");
    }

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_REPLY)))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    payload: Result<Json<VerifyOtpRequest>, JsonRejection>,
) -> ApiResult<Json<VerifyOtpResponse>> {
    let Json(payload) = payload?;
    require(&[payload.email.as_str(), payload.otp.as_str()], "Email and OTP are required")?;
    let email = normalize_email(&payload.email);

    let reset_token = otp::verify(&state.db, &email, payload.otp.trim())
        .await?
        .map_err(|e| {
            warn!(%email, reason = %e, "otp rejected");
            ApiError::from(e)
        })?;

    info!(%email, "otp verified");
    Ok(Json(VerifyOtpResponse {
        message: "OTP verified successfully".into(),
        reset_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(payload) = payload?;
    require(
        &[payload.email.as_str(), payload.reset_token.as_str(), payload.new_password.as_str()],
        "Email, reset token, and new password are required",
    )?;
    let email = normalize_email(&payload.email);
    validate_password(&payload.new_password)?;

    otp::redeem_reset_token(&state.db, &email, payload.reset_token.trim())
        .await?
        .map_err(|e| {
            warn!(%email, reason = %e, "reset token rejected");
            ApiError::from(e)
        })?;

    let password_hash = hash_password(&payload.new_password).await?;
    let user = User::set_password_by_email(&state.db, &email, password_hash).await?;

    info!(user_id = %user.id, "password reset");
    Ok(Json(MessageResponse::new("Password reset successful")))
}
