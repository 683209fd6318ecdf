use std::sync::Arc;

use time::Duration;

use crate::{
    auth::{
        jwt::JwtKeys,
        mailer::{LogMailer, OtpMailer},
    },
    config::AppConfig,
    store::Database,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub mailer: Arc<dyn OtpMailer>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = Database::open(&config.data_dir).await?;
        Ok(Self::from_parts(db, Arc::new(config), Arc::new(LogMailer)))
    }

    pub fn from_parts(db: Database, config: Arc<AppConfig>, mailer: Arc<dyn OtpMailer>) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        Self {
            db,
            config,
            keys,
            mailer,
        }
    }

    /// Whether session cookies carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.config.environment.is_production()
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::seconds(self.config.otp_ttl_secs)
    }
}
