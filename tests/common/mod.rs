#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use adminboard::{
    app::build_app,
    auth::mailer::OtpMailer,
    config::{AppConfig, Environment, JwtConfig, SeedAdmin},
    state::AppState,
    store::Database,
    users::seed_admin,
};
use axum::{
    async_trait,
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "Admin123!";

/// Keeps every code it is asked to send.
#[derive(Default, Clone)]
pub struct CapturingMailer {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl CapturingMailer {
    pub fn last_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, otp)| otp.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl OtpMailer for CapturingMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_owned(), otp.to_owned()));
        Ok(())
    }
}

pub fn test_config(dir: PathBuf) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        environment: Environment::Development,
        data_dir: dir,
        cors_origin: "http://localhost:5180".into(),
        jwt: JwtConfig {
            access_secret: "test-access-secret".into(),
            refresh_secret: "test-refresh-secret".into(),
            issuer: "adminboard".into(),
            audience: "adminboard-users".into(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
        },
        otp_ttl_secs: 10 * 60,
        seed_admin: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: CapturingMailer,
    pub dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

pub async fn setup() -> TestApp {
    setup_with(|_| {}).await
}

/// Fresh data dir with a seeded admin; `tweak` adjusts the config first.
pub async fn setup_with(tweak: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = std::env::temp_dir().join(format!("adminboard-test-{}", uuid::Uuid::new_v4()));
    let mut config = test_config(dir.clone());
    tweak(&mut config);

    let db = Database::open(&dir).await.expect("open test store");
    seed_admin(
        &db,
        &SeedAdmin {
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
            name: "Admin".into(),
        },
    )
    .await
    .expect("seed admin");

    let mailer = CapturingMailer::default();
    let state = AppState::from_parts(db, Arc::new(config), Arc::new(mailer.clone()));
    let router = build_app(state.clone()).expect("build app");
    TestApp {
        router,
        state,
        mailer,
        dir,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
        cookies: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookies) = cookies {
            builder = builder.header(header::COOKIE, cookies);
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(req).await
    }

    /// Log in and return the `Cookie` header value for the session.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .call(
                Method::POST,
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::OK, "login as {email}");
        cookie_header(&res)
    }

    pub async fn admin_cookies(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register through the public endpoint; returns (user id, cookies).
    pub async fn register(&self, email: &str, password: &str, name: &str) -> (String, String) {
        let res = self
            .call(
                Method::POST,
                "/api/auth/register",
                Some(serde_json::json!({ "email": email, "password": password, "name": name })),
                None,
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED, "register {email}");
        let cookies = cookie_header(&res);
        let body = body_json(res).await;
        (body["user"]["id"].as_str().unwrap().to_owned(), cookies)
    }
}

pub fn set_cookies(res: &Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

/// Turn `Set-Cookie` headers into a `Cookie` request header value.
pub fn cookie_header(res: &Response<Body>) -> String {
    set_cookies(res)
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::to_owned)
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
