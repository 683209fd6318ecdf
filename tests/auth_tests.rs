//! Router-level tests for the `/api/auth` endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, cookie_header, set_cookies, setup, setup_with, ADMIN_EMAIL};
use serde_json::json;
use time::{Duration, OffsetDateTime};

#[tokio::test]
async fn register_then_me_returns_same_user() {
    let app = setup().await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "alice@example.com", "password": "Secret1!", "name": "Alice" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(set_cookies(&res).len(), 2);
    let cookies = cookie_header(&res);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Registration successful");
    let user = &body["user"];
    assert!(!user["id"].as_str().unwrap().is_empty());
    assert_eq!(user["email"], "alice@example.com");
    assert_eq!(user["name"], "Alice");
    assert_eq!(user["role"], "user");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password").is_none());

    let res = app.call(Method::GET, "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me = body_json(res).await;
    assert_eq!(me["user"]["id"], user["id"]);
    assert_eq!(me["user"]["email"], "alice@example.com");
    assert_eq!(me["user"]["name"], "Alice");
    assert!(me["user"].get("passwordHash").is_none());
    assert!(me["user"].get("password").is_none());
}

#[tokio::test]
async fn register_same_email_twice_conflicts() {
    let app = setup().await;
    app.register("bob@example.com", "Secret1!", "Bob").await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "Bob@Example.com ", "password": "Other99!", "name": "Bobby" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(set_cookies(&res).is_empty());
    assert_eq!(body_json(res).await["message"], "Email already exists");
}

#[tokio::test]
async fn register_validates_input() {
    let app = setup().await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "carol@example.com", "password": "Secret1!" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "Email, password, and name are required"
    );

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "not-an-email", "password": "Secret1!", "name": "Carol" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .call(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "carol@example.com", "password": "123", "name": "Carol" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_sets_two_cookies_and_hides_password() {
    let app = setup().await;
    app.register("dave@example.com", "Secret1!", "Dave").await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "dave@example.com", "password": "Secret1!" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let cookies = set_cookies(&res);
    assert_eq!(cookies.len(), 2);
    let access = cookies.iter().find(|c| c.starts_with("accessToken=")).unwrap();
    let refresh = cookies.iter().find(|c| c.starts_with("refreshToken=")).unwrap();
    for c in [access, refresh] {
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("SameSite=Lax"));
        assert!(c.contains("Path=/"));
        assert!(!c.contains("Secure"));
    }
    assert!(access.contains("Max-Age=900"));
    assert!(refresh.contains("Max-Age=604800"));

    let body = body_json(res).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "dave@example.com");
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn login_failures_set_no_cookies() {
    let app = setup().await;
    app.register("erin@example.com", "Secret1!", "Erin").await;

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "erin@example.com", "password": "wrong-pass" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&res).is_empty());
    assert_eq!(body_json(res).await["message"], "Invalid credentials");

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "Secret1!" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&res).is_empty());

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "erin@example.com" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Email and password are required");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = setup().await;
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["message"].is_string());
}

#[tokio::test]
async fn me_requires_valid_access_cookie() {
    let app = setup().await;

    let res = app.call(Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "Authentication required");

    let res = app
        .call(Method::GET, "/api/auth/me", None, Some("accessToken=garbage"))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "Invalid or expired token");

    // a refresh token is not an access token
    let (_, cookies) = app.register("frank@example.com", "Secret1!", "Frank").await;
    let refresh_value = cookies
        .split("; ")
        .find_map(|c| c.strip_prefix("refreshToken="))
        .unwrap();
    let res = app
        .call(
            Method::GET,
            "/api/auth/me",
            None,
            Some(&format!("accessToken={refresh_value}")),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_cookies() {
    let app = setup().await;
    let (user_id, cookies) = app.register("gina@example.com", "Secret1!", "Gina").await;

    let res = app.call(Method::POST, "/api/auth/refresh", None, Some(&cookies)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(set_cookies(&res).len(), 2);
    let rotated = cookie_header(&res);
    assert_eq!(body_json(res).await["message"], "Token refreshed successfully");

    let res = app.call(Method::GET, "/api/auth/me", None, Some(&rotated)).await;
    assert_eq!(body_json(res).await["user"]["id"], user_id.as_str());
}

#[tokio::test]
async fn refresh_failures_are_unauthorized() {
    let app = setup().await;

    let res = app.call(Method::POST, "/api/auth/refresh", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "Refresh token required");

    let res = app
        .call(Method::POST, "/api/auth/refresh", None, Some("refreshToken=bogus"))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "Invalid refresh token");

    // user deleted after the token was issued
    let (user_id, cookies) = app.register("hank@example.com", "Secret1!", "Hank").await;
    let admin = app.admin_cookies().await;
    let res = app
        .call(Method::DELETE, &format!("/api/users/{user_id}"), None, Some(&admin))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.call(Method::POST, "/api/auth/refresh", None, Some(&cookies)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["message"], "User not found");

    let res = app.call(Method::GET, "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_clears_both_cookies() {
    let app = setup().await;
    let (_, cookies) = app.register("ivy@example.com", "Secret1!", "Ivy").await;

    for session in [Some(cookies.as_str()), None] {
        let res = app.call(Method::POST, "/api/auth/logout", None, session).await;
        assert_eq!(res.status(), StatusCode::OK);
        let cleared = set_cookies(&res);
        assert_eq!(cleared.len(), 2);
        assert!(cleared.iter().any(|c| c.starts_with("accessToken=;")));
        assert!(cleared.iter().any(|c| c.starts_with("refreshToken=;")));
        assert!(cleared.iter().all(|c| c.contains("Max-Age=0")));
        assert_eq!(body_json(res).await["message"], "Logout successful");
    }
}

#[tokio::test]
async fn production_cookies_are_secure() {
    let app = setup_with(|c| c.environment = adminboard::config::Environment::Production).await;
    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": common::ADMIN_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(set_cookies(&res).iter().all(|c| c.contains("; Secure")));
}

#[tokio::test]
async fn forgot_password_reply_is_identical_for_unknown_email() {
    let app = setup().await;
    app.register("jill@example.com", "Secret1!", "Jill").await;

    let known = app
        .call(
            Method::POST,
            "/api/auth/forgot-password",
            Some(json!({ "email": "jill@example.com" })),
            None,
        )
        .await;
    let unknown = app
        .call(
            Method::POST,
            "/api/auth/forgot-password",
            Some(json!({ "email": "ghost@example.com" })),
            None,
        )
        .await;
    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);
    let known = body_json(known).await;
    assert_eq!(known, body_json(unknown).await);
    assert_eq!(known["message"], "If the email exists, an OTP has been sent");

    assert_eq!(app.mailer.count(), 1);
    assert!(app.mailer.last_for("ghost@example.com").is_none());

    let res = app
        .call(Method::POST, "/api/auth/forgot-password", Some(json!({})), None)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_password_reset_flow() {
    let app = setup().await;
    app.register("kate@example.com", "Secret1!", "Kate").await;

    app.call(
        Method::POST,
        "/api/auth/forgot-password",
        Some(json!({ "email": "kate@example.com" })),
        None,
    )
    .await;
    let otp = app.mailer.last_for("kate@example.com").expect("otp sent");
    assert_eq!(otp.len(), 6);

    let wrong = if otp == "000000" { "111111" } else { "000000" };
    let res = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            Some(json!({ "email": "kate@example.com", "otp": wrong })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Invalid OTP");

    let res = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            Some(json!({ "email": "kate@example.com", "otp": otp })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "OTP verified successfully");
    let reset_token = body["resetToken"].as_str().unwrap().to_owned();

    let res = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            Some(json!({ "email": "kate@example.com", "resetToken": "nope", "newPassword": "NewPass2@" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Invalid reset token");

    let res = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            Some(json!({ "email": "kate@example.com", "resetToken": reset_token, "newPassword": "NewPass2@" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["message"], "Password reset successful");

    // record consumed, token cannot be replayed
    assert!(app.state.db.otps.load().await.unwrap().is_empty());
    let res = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            Some(json!({ "email": "kate@example.com", "resetToken": reset_token, "newPassword": "Another3#" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "kate@example.com", "password": "Secret1!" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    app.login("kate@example.com", "NewPass2@").await;
}

#[tokio::test]
async fn expired_otp_is_rejected_by_verify() {
    let app = setup_with(|c| c.otp_ttl_secs = -1).await;
    app.register("liam@example.com", "Secret1!", "Liam").await;
    app.call(
        Method::POST,
        "/api/auth/forgot-password",
        Some(json!({ "email": "liam@example.com" })),
        None,
    )
    .await;
    let otp = app.mailer.last_for("liam@example.com").unwrap();

    let res = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            Some(json!({ "email": "liam@example.com", "otp": otp })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "OTP has expired");
}

#[tokio::test]
async fn expired_reset_token_is_rejected() {
    let app = setup().await;
    app.register("mia@example.com", "Secret1!", "Mia").await;
    app.call(
        Method::POST,
        "/api/auth/forgot-password",
        Some(json!({ "email": "mia@example.com" })),
        None,
    )
    .await;
    let otp = app.mailer.last_for("mia@example.com").unwrap();
    let res = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            Some(json!({ "email": "mia@example.com", "otp": otp })),
            None,
        )
        .await;
    let reset_token = body_json(res).await["resetToken"].as_str().unwrap().to_owned();

    // let the verified record lapse
    app.state
        .db
        .otps
        .update(|otps| {
            for o in otps.iter_mut() {
                o.expires_at = OffsetDateTime::now_utc() - Duration::seconds(1);
            }
            Ok::<_, ()>(())
        })
        .await
        .unwrap()
        .unwrap();

    let res = app
        .call(
            Method::POST,
            "/api/auth/reset-password",
            Some(json!({ "email": "mia@example.com", "resetToken": reset_token, "newPassword": "NewPass2@" })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Reset token has expired");
    app.login("mia@example.com", "Secret1!").await;
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = setup().await;
    let res = app.call(Method::GET, "/api/nothing-here", None, None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["message"], "Route not found");

    let res = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn reset_token_is_spent_once_under_concurrent_use() {
    let app = setup().await;
    app.register("nora@example.com", "Secret1!", "Nora").await;
    app.call(
        Method::POST,
        "/api/auth/forgot-password",
        Some(json!({ "email": "nora@example.com" })),
        None,
    )
    .await;
    let otp = app.mailer.last_for("nora@example.com").unwrap();
    let res = app
        .call(
            Method::POST,
            "/api/auth/verify-otp",
            Some(json!({ "email": "nora@example.com", "otp": otp })),
            None,
        )
        .await;
    let reset_token = body_json(res).await["resetToken"].as_str().unwrap().to_owned();

    let reset = |password: &'static str| {
        app.call(
            Method::POST,
            "/api/auth/reset-password",
            Some(json!({ "email": "nora@example.com", "resetToken": reset_token, "newPassword": password })),
            None,
        )
    };
    let (first, second) = tokio::join!(reset("FirstPw1!"), reset("SecondPw2@"));
    let mut statuses = [first.status(), second.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);

    let winner = if first.status() == StatusCode::OK {
        "FirstPw1!"
    } else {
        "SecondPw2@"
    };
    app.login("nora@example.com", winner).await;
}

#[tokio::test]
async fn store_failure_is_opaque_500() {
    let app = setup().await;
    tokio::fs::write(app.dir.join("users.json"), b"{broken").await.unwrap();

    let res = app
        .call(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": common::ADMIN_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(set_cookies(&res).is_empty());
    let body = body_json(res).await;
    assert_eq!(body["message"], "Internal server error");
    // building a development app does not switch on error detail
    assert!(body.get("detail").is_none());
}
