//! Kitchen Web Server - authenticated webhook receiver.
//!
//! This binary:
//! - Receives webhooks on `/webhooks/{source}/`
//! - Verifies the HMAC-SHA256 signature over the raw body
//! - Stores the event in Postgres
//! - Returns 200 once the event is durable

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kitchen::{build_router, AppState, Config, LogFormat, PgEventStore, WebhookSource};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    init_tracing(&config);

    info!("web_server_starting");
    info!(
        port = config.port,
        env = %config.env,
        max_body_bytes = config.max_body_bytes,
        database_max_connections = config.database_max_connections,
        "config_loaded"
    );

    let sources = WebhookSource::from_config(&config).context("Invalid webhook source")?;
    for source in &sources {
        info!(
            source = source.name(),
            path = %source.path(),
            signature_header = %source.verifier().header(),
            "webhook_source_configured"
        );
    }

    let store = PgEventStore::connect(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    info!("database_connected");

    let state = AppState::new(Arc::new(store.clone()), config.max_body_bytes);
    let app = build_router(state, sources);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    store.pool().close().await;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over `LOG_LEVEL`.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json().flatten_event(true)).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
