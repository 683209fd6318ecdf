use reqwest::{Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ClientError;

const REFRESH_PATH: &str = "/auth/refresh";

/// JSON client for the `/api` surface. Cookies persist across calls.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Auth endpoints never trigger a refresh, so a failing refresh cannot loop.
fn is_auth_path(path: &str) -> bool {
    path.contains("/auth/")
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:3010/api`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Use a preconfigured client. It needs a cookie store for sessions to work.
    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let mut req = self.http.request(method.clone(), self.url(path));
        if let Some(body) = body {
            req = req.json(body);
        }
        Ok(req.send().await?)
    }

    /// Send a request; on a 401 from a non-auth path, refresh once and replay once.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ClientError> {
        let mut res = self.send_once(&method, path, body.as_ref()).await?;

        if res.status() == StatusCode::UNAUTHORIZED && !is_auth_path(path) {
            debug!(%method, path, "unauthorized, refreshing session");
            if let Err(e) = self.refresh_session().await {
                warn!(error = %e, path, "session refresh failed");
                return Err(ClientError::SessionExpired);
            }
            res = self.send_once(&method, path, body.as_ref()).await?;
        }

        decode(res).await
    }

    async fn refresh_session(&self) -> Result<(), ClientError> {
        let res = self.send_once(&Method::POST, REFRESH_PATH, None).await?;
        decode::<Value>(res).await.map(|_| ())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::POST, path, None).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, Some(serde_json::to_value(body)?))
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::DELETE, path, None).await
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res.json::<T>().await?);
    }
    let message = res
        .json::<ErrorBody>()
        .await
        .map(|b| b.message)
        .unwrap_or_default();
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}
