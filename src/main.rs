use adminboard::{app, config::AppConfig, error, state::AppState, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "adminboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    error::expose_internal_details(!config.environment.is_production());
    let (host, port) = (config.host.clone(), config.port);
    let app_state = AppState::init(config).await?;
    tracing::info!(
        users = %app_state.db.users.path().display(),
        otps = %app_state.db.otps.path().display(),
        env = ?app_state.config.environment,
        "data store ready"
    );

    if let Some(seed) = &app_state.config.seed_admin {
        users::seed_admin(&app_state.db, seed).await?;
    }

    let app = app::build_app(app_state)?;
    app::serve(app, &host, port).await
}
