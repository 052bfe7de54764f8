//! roomer: relays chat channel messages to a dispatch service.
//!
//! - Config: YAML file (argv[1], else `ROOMER_CONFIG`, else `roomer.yaml`)
//!   plus `ROOMER_*` env overrides
//! - Both links connect through the same unbounded reconnect loop
//! - Ctrl-C / SIGTERM cancels any reconnect wait and stops the event loop

use std::process::ExitCode;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use roomer_core::error::{RelayError, Result};
use roomer_relay::{app_state::AppState, config, router};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "roomer stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(config::CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;
    let ops_addr = cfg.ops.listen_addr()?;

    let state = AppState::new(cfg)?;
    tokio::spawn(shutdown_signal(state.cancel_token()));

    if let Some(addr) = ops_addr {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RelayError::Config(format!("bind ops listener {addr}: {e}")))?;
        tracing::info!(%addr, "ops endpoints listening");

        let app = router::build_router(state.clone());
        let cancel = state.cancel_token();
        tokio::spawn(async move {
            let stop = async move { cancel.cancelled().await };
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
                tracing::error!(error = %e, "ops server failed");
            }
        });
    }

    tracing::info!(config = %path, "roomer starting");
    state.controller().run().await
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                let _ = ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
    }

    tracing::info!("shutdown signal received");
    cancel.cancel();
}
