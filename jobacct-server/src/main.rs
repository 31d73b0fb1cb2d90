use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod service;
pub mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobacct_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting jobacct server...");

    let config = Config::from_env()?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        "Reporting jobs for {} over the last {} days",
        config.user,
        config.window_days
    );
    if let Some(dir) = &config.slurm.bin_dir {
        tracing::info!("Using scheduler binaries from {}", dir.display());
    }

    let addr = config.bind_addr.clone();

    // Build router with all API endpoints
    let app = api::create_router(AppState::new(config));

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
