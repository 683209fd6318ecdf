//! Session cookie helpers.

use axum::http::{header, HeaderMap, HeaderValue};
use time::Duration;

use super::jwt::{JwtKeys, TokenPair};

pub const ACCESS_COOKIE_NAME: &str = "accessToken";
pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Extract a cookie value from the Cookie header(s).
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn cookie(name: &str, value: &str, max_age: Duration, secure: bool) -> String {
    let mut out = format!(
        "{name}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        max_age.whole_seconds().max(0)
    );
    if secure {
        out.push_str("; Secure");
    }
    out
}

fn append(headers: &mut HeaderMap, value: String) {
    // Token values are base64url and dots, always a valid header value.
    if let Ok(v) = HeaderValue::from_str(&value) {
        headers.append(header::SET_COOKIE, v);
    }
}

/// `Set-Cookie` headers carrying both session tokens.
pub fn session_cookies(keys: &JwtKeys, pair: &TokenPair, secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(
        &mut headers,
        cookie(ACCESS_COOKIE_NAME, &pair.access_token, keys.access_ttl(), secure),
    );
    append(
        &mut headers,
        cookie(REFRESH_COOKIE_NAME, &pair.refresh_token, keys.refresh_ttl(), secure),
    );
    headers
}

/// `Set-Cookie` headers expiring both session tokens.
pub fn cleared_cookies(secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append(&mut headers, cookie(ACCESS_COOKIE_NAME, "", Duration::ZERO, secure));
    append(&mut headers, cookie(REFRESH_COOKIE_NAME, "", Duration::ZERO, secure));
    headers
}
