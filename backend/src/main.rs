use gaadi_backend::{api, config::AppConfig, db::Database};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gaadi_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Gaadi backend...");

    let config = AppConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    let db = Database::connect_lazy(&config.database)?;

    // An unreachable database is not fatal: requests answer 500 until it comes back,
    // and the users table is created by the first request that reaches it.
    match db.ping().await {
        Ok(()) => {
            tracing::info!(backend = db.backend_name(), "Connected to database");
        }
        Err(e) => {
            tracing::error!(error = %e, backend = db.backend_name(), "Error connecting to database");
        }
    }

    api::server::start_server(config.port, db).await?;

    Ok(())
}
