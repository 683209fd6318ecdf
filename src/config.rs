use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Credentials for the admin account created on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub data_dir: PathBuf,
    pub cors_origin: String,
    pub jwt: JwtConfig,
    pub otp_ttl_secs: i64,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = match env_or("APP_ENV", "development").as_str() {
            "production" => Environment::Production,
            "development" => Environment::Development,
            other => anyhow::bail!("APP_ENV must be development or production, got {other}"),
        };

        let jwt = JwtConfig {
            access_secret: std::env::var("JWT_ACCESS_SECRET").context("JWT_ACCESS_SECRET")?,
            refresh_secret: std::env::var("JWT_REFRESH_SECRET").context("JWT_REFRESH_SECRET")?,
            issuer: env_or("JWT_ISSUER", "adminboard"),
            audience: env_or("JWT_AUDIENCE", "adminboard-users"),
            access_ttl_secs: parsed_or("JWT_ACCESS_TTL_SECS", 15 * 60),
            refresh_ttl_secs: parsed_or("JWT_REFRESH_TTL_SECS", 7 * 24 * 60 * 60),
        };
        anyhow::ensure!(
            jwt.access_secret != jwt.refresh_secret,
            "JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ"
        );

        let seed_admin = match (
            std::env::var("SEED_ADMIN_EMAIL").ok(),
            std::env::var("SEED_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(SeedAdmin {
                email,
                password,
                name: env_or("SEED_ADMIN_NAME", "Administrator"),
            }),
            _ => None,
        };

        Ok(Self {
            host: env_or("APP_HOST", "0.0.0.0"),
            port: std::env::var("APP_PORT")
                .ok()
                .map(|v| v.parse::<u16>())
                .transpose()
                .context("APP_PORT")?
                .unwrap_or(3010),
            environment,
            data_dir: PathBuf::from(env_or("DATA_DIR", "./data")),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5180"),
            jwt,
            otp_ttl_secs: parsed_or("OTP_TTL_SECS", 10 * 60),
            seed_admin,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(default)
}
