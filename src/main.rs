// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use zerowallet_gateway::{
    api::router,
    blockchain::EvmChainReader,
    config::{GatewayConfig, LogFormat},
    registry::SessionSweeper,
    relay::{engine::DEFAULT_ENGINE_TIMEOUT, HttpTransactionEngine},
    state::AppState,
    storage::{InMemoryStore, JsonFileStore, ProjectStore},
};

#[tokio::main]
async fn main() {
    let config = GatewayConfig::from_env().expect("Invalid gateway configuration");
    init_tracing(config.log_format);

    let store: Arc<dyn ProjectStore> = match &config.projects_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "Using JSON file project store");
            Arc::new(JsonFileStore::open(path).expect("Failed to open project file"))
        }
        None => {
            tracing::warn!("PROJECTS_FILE not set, projects are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };
    let engine = HttpTransactionEngine::new(config.tx_engine_url.clone(), DEFAULT_ENGINE_TIMEOUT)
        .expect("Failed to build transaction engine client");
    let chain_reader = EvmChainReader::new(&config.chains, config.chain_read_timeout);

    let state = AppState::new(
        store,
        Arc::new(engine),
        Arc::new(chain_reader),
        config.dashboard.clone(),
        config.nonce_ttl,
    );

    let shutdown = CancellationToken::new();
    let sweeper = SessionSweeper::new(state.tenants.clone())
        .with_interval(config.session_sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!(
        addr = %config.bind_addr,
        dashboard_project = %config.dashboard.project_id,
        dashboard_chain = config.dashboard.chain_id,
        "Zero Wallet gateway listening (docs at /docs)"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");

    shutdown.cancel();
    let _ = sweeper_handle.await;
    tracing::info!("Gateway stopped");
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
