//! Shared application state for the relay.
//!
//! Builds every component from the config, registers the chat handlers, and
//! keeps the pieces the ops endpoints read. Startup errors come back as
//! `Result` so `main` can exit cleanly.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use roomer_core::error::Result;

use crate::chat::{ChatSession, IrcSession};
use crate::config::RelayConfig;
use crate::dispatch::{DispatchClient, DispatchConnector, JsonRpcConnector};
use crate::obs::RelayMetrics;
use crate::relay::{
    Forwarder, InviteHandler, PingHandler, PrivmsgHandler, RelayController, WelcomeHandler,
};
use crate::resilience::{policy_from_config, Reconnector};
use crate::store::{CorrelationStore, MemoryCorrelationStore};
use crate::telemetry::{Reporter, TracingReporter};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    metrics: Arc<RelayMetrics>,
    controller: Arc<RelayController>,
    store: Option<Arc<MemoryCorrelationStore>>,
    cancel: CancellationToken,
}

impl AppState {
    /// Production wiring: IRC over TCP, JSON-RPC dispatch, tracing reports.
    pub fn new(cfg: RelayConfig) -> Result<Self> {
        let metrics = Arc::new(RelayMetrics::default());
        let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter::new(Arc::clone(&metrics)));
        let session: Arc<dyn ChatSession> = Arc::new(IrcSession::new(&cfg.chat));
        let connector: Arc<dyn DispatchConnector> = Arc::new(JsonRpcConnector::new(
            cfg.dispatch.addr.clone(),
            cfg.dispatch.max_line_bytes,
        ));
        Self::assemble(cfg, session, connector, reporter, metrics, CancellationToken::new())
    }

    /// Wire the relay around caller-supplied links and reporter.
    pub fn assemble(
        cfg: RelayConfig,
        session: Arc<dyn ChatSession>,
        connector: Arc<dyn DispatchConnector>,
        reporter: Arc<dyn Reporter>,
        metrics: Arc<RelayMetrics>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        cfg.validate()?;

        let reconnector = Arc::new(
            Reconnector::new(
                policy_from_config(&cfg.backoff),
                Arc::clone(&reporter),
                Arc::clone(&metrics),
                cancel.clone(),
            )
            .with_scope(cfg.backoff.retry_on.into()),
        );
        let dispatch = Arc::new(DispatchClient::new(connector, cfg.dispatch.method.clone()));
        let store = cfg
            .correlation
            .enabled
            .then(|| Arc::new(MemoryCorrelationStore::with_capacity(cfg.correlation.capacity)));

        let forwarder = Arc::new(Forwarder::new(
            Arc::clone(&dispatch),
            Arc::clone(&reconnector),
            Arc::clone(&reporter),
            Arc::clone(&metrics),
        ));

        let controller = RelayController::new(
            session,
            dispatch,
            reconnector,
            Arc::clone(&reporter),
            Arc::clone(&metrics),
            cancel.clone(),
        );
        controller.register(Arc::new(WelcomeHandler::new(cfg.chat.channels.clone())));
        controller.register(Arc::new(PingHandler::new()));
        controller.register(Arc::new(InviteHandler::new()));
        controller.register(Arc::new(PrivmsgHandler::new(
            cfg.chat.host_name(),
            forwarder,
            store
                .clone()
                .map(|s| s as Arc<dyn CorrelationStore>),
            reporter,
        )));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                metrics,
                controller: Arc::new(controller),
                store,
                cancel,
            }),
        })
    }

    pub fn metrics(&self) -> Arc<RelayMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn controller(&self) -> Arc<RelayController> {
        Arc::clone(&self.inner.controller)
    }

    pub fn store(&self) -> Option<Arc<MemoryCorrelationStore>> {
        self.inner.store.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Stop the event loop and abort any reconnect wait.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_ready(&self) -> bool {
        !self.inner.cancel.is_cancelled() && self.inner.metrics.is_ready()
    }
}
