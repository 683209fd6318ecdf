use axum::async_trait;
use tracing::info;

/// Delivers password-reset codes.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()>;
}

/// Writes the code to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, email: &str, otp: &str) -> anyhow::Result<()> {
        info!(%email, %otp, "password reset code issued");
        Ok(())
    }
}
