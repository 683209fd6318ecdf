//! One-time codes for password reset, stored in `otps.json`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::store::Database;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRecord {
    pub email: String,
    pub otp: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl OtpRecord {
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Invalid OTP")]
    InvalidCode,
    #[error("OTP has expired")]
    CodeExpired,
    #[error("Invalid reset token")]
    InvalidResetToken,
    #[error("Reset token has expired")]
    ResetTokenExpired,
}

/// Six decimal digits, never with a leading zero.
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

pub fn generate_reset_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Store a fresh code for `email`, dropping any earlier one.
pub async fn issue(db: &Database, email: &str, ttl: Duration) -> anyhow::Result<OtpRecord> {
    let now = OffsetDateTime::now_utc();
    let record = OtpRecord {
        email: email.to_owned(),
        otp: generate_code(),
        created_at: now,
        expires_at: now + ttl,
        reset_token: None,
        verified: false,
    };
    let stored = record.clone();
    db.otps
        .update(move |otps| {
            otps.retain(|o| o.email != stored.email);
            otps.push(stored);
            Ok::<_, std::convert::Infallible>(())
        })
        .await?
        .unwrap_or_else(|never| match never {});
    Ok(record)
}

/// Check `code` for `email` and, when it is live, mark it verified with a new reset token.
pub async fn verify(
    db: &Database,
    email: &str,
    code: &str,
) -> anyhow::Result<Result<String, OtpError>> {
    let now = OffsetDateTime::now_utc();
    db.otps
        .update(|otps| {
            let record = otps
                .iter_mut()
                .find(|o| o.email == email && o.otp == code)
                .ok_or(OtpError::InvalidCode)?;
            if record.is_expired(now) {
                return Err(OtpError::CodeExpired);
            }
            let token = generate_reset_token();
            record.reset_token = Some(token.clone());
            record.verified = true;
            Ok(token)
        })
        .await
}

/// Take the verified, live record matching `email` and `reset_token` out of the store.
///
/// Lookup and removal share one lock, so a reset token is spent at most once.
pub async fn redeem_reset_token(
    db: &Database,
    email: &str,
    reset_token: &str,
) -> anyhow::Result<Result<OtpRecord, OtpError>> {
    let now = OffsetDateTime::now_utc();
    db.otps
        .update(|otps| {
            let idx = otps
                .iter()
                .position(|o| {
                    o.email == email
                        && o.verified
                        && o.reset_token.as_deref() == Some(reset_token)
                })
                .ok_or(OtpError::InvalidResetToken)?;
            if otps[idx].is_expired(now) {
                return Err(OtpError::ResetTokenExpired);
            }
            let record = otps.remove(idx);
            otps.retain(|o| o.email != email);
            Ok(record)
        })
        .await
}
