mod api;
mod middleware;

use std::sync::Arc;

use adpulse_core::AppConfig;
use adpulse_store::{demo, MemoryStore};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

/// Fixed so that every development run shows the same sample numbers.
const DEMO_RNG_SEED: u64 = 42;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = build_store(&config)?;
    let app = build_app(AppState::new(Arc::new(store), &config.currency));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(env = %config.env, addr = %config.bind_addr, "adpulse-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn build_store(config: &AppConfig) -> anyhow::Result<MemoryStore> {
    if let Some(path) = &config.seed_path {
        let seed = adpulse_core::load_seed_file(path)?;
        return Ok(MemoryStore::from_seed(seed)?);
    }

    if config.demo_data {
        tracing::info!(days = config.demo_days, "loading generated demo data");
        let today = chrono::Utc::now().date_naive();
        let seed = demo::generate(config.demo_days, DEMO_RNG_SEED, today);
        return Ok(MemoryStore::from_seed(seed)?);
    }

    Ok(MemoryStore::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
