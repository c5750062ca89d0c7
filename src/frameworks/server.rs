// Framework bootstrap for the relay server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{status_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{RelaySettings, relay_task};

use axum::{Router, routing::get};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state();

    // Start the Web Server
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/status", get(status_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state() -> Arc<AppState> {
    let settings = RelaySettings {
        sweep_interval: config::sweep_interval(),
        stale_after: config::stale_after(),
    };
    tracing::debug!(
        sweep_interval_secs = settings.sweep_interval.as_secs(),
        stale_after_secs = settings.stale_after.as_secs(),
        "relay configured"
    );

    // Setup Channels
    // event_tx/rx: every connection event goes to the single relay task.
    let (event_tx, event_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);

    // Spawn the relay task; it owns sessions, tickets and the roster.
    tokio::spawn(relay_task(event_rx, settings));

    Arc::new(AppState {
        event_tx,
        started_at: Instant::now(),
    })
}
