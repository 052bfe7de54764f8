use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::irc::Message;
use roomer_core::{classify, Severity};

use crate::chat::{ChatEventKind, ChatSession};
use crate::dispatch::DispatchClient;
use crate::obs::RelayMetrics;
use crate::relay::registry::{EventHandler, HandlerRegistry};
use crate::resilience::{link, Reconnector};
use crate::telemetry::Reporter;

/// Owns both connection handles and the single event-handling worker.
pub struct RelayController {
    session: Arc<dyn ChatSession>,
    dispatch: Arc<DispatchClient>,
    handlers: HandlerRegistry,
    reconnector: Arc<Reconnector>,
    reporter: Arc<dyn Reporter>,
    metrics: Arc<RelayMetrics>,
    cancel: CancellationToken,
}

impl RelayController {
    pub fn new(
        session: Arc<dyn ChatSession>,
        dispatch: Arc<DispatchClient>,
        reconnector: Arc<Reconnector>,
        reporter: Arc<dyn Reporter>,
        metrics: Arc<RelayMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            dispatch,
            handlers: HandlerRegistry::new(),
            reconnector,
            reporter,
            metrics,
            cancel,
        }
    }

    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.register(handler);
    }

    /// Connect both links, then serve chat events until cancelled.
    ///
    /// Returns `Ok(())` on shutdown; an error only when a reconnect loop gave
    /// up under a network-only retry scope.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("connecting to the chat server");
        if !self.connect_chat().await? {
            return Ok(());
        }

        tracing::info!(kinds = ?self.handlers.registered_kinds(), "chat handlers registered");

        tracing::info!("connecting to the dispatch server");
        let dispatch = self.dispatch.as_ref();
        if !not_cancelled(self.reconnector.run(link::DISPATCH, move || dispatch.connect()).await)? {
            return Ok(());
        }

        self.event_loop().await
    }

    async fn event_loop(&self) -> Result<()> {
        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => break,
                next = self.session.next_message() => next,
            };

            match next {
                Some(Ok(msg)) => {
                    // a dispatch call that never answers must not hold up shutdown
                    let handled = tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        res = self.handle_message(msg) => res,
                    };
                    if let Err(RelayError::Cancelled) = handled {
                        break;
                    }
                }
                Some(Err(err @ RelayError::BadMessage(_))) => {
                    self.reporter.report(Severity::Warning, link::CHAT, &err);
                }
                Some(Err(err)) => {
                    self.metrics.set_link_up(link::CHAT, false);
                    self.reporter.report(classify(&err).severity(), link::CHAT, &err);
                    if !self.connect_chat().await? {
                        break;
                    }
                }
                None => {
                    self.metrics.set_link_up(link::CHAT, false);
                    self.reporter.report(Severity::Warning, link::CHAT, &RelayError::Eof);
                    if !self.connect_chat().await? {
                        break;
                    }
                }
            }
        }

        tracing::info!("relay stopped");
        Ok(())
    }

    /// Route one inbound message to its handler and run it to completion.
    ///
    /// Handler failures are reported, not retried. Only `Cancelled` is
    /// returned, so the caller can stop the loop.
    pub async fn handle_message(&self, msg: Message) -> Result<()> {
        let Some(kind) = ChatEventKind::of(&msg) else {
            self.metrics.chat_events.inc(&[("kind", "ignored")]);
            tracing::trace!(command = %msg.command, "ignoring chat command");
            return Ok(());
        };
        self.metrics.chat_events.inc(&[("kind", kind.as_str())]);

        let Some(handler) = self.handlers.get(kind) else {
            tracing::debug!(kind = kind.as_str(), "no handler registered");
            return Ok(());
        };

        match handler.handle(self.session.as_sender(), msg).await {
            Ok(()) => Ok(()),
            Err(RelayError::Cancelled) => Err(RelayError::Cancelled),
            Err(err) => {
                self.reporter
                    .report(classify(&err).severity(), kind.as_str(), &err);
                Ok(())
            }
        }
    }

    async fn connect_chat(&self) -> Result<bool> {
        let session = self.session.as_ref();
        not_cancelled(self.reconnector.run(link::CHAT, move || session.connect()).await)
    }
}

/// `Ok(false)` when the loop was cancelled by shutdown.
fn not_cancelled(res: Result<()>) -> Result<bool> {
    match res {
        Ok(()) => Ok(true),
        Err(RelayError::Cancelled) => Ok(false),
        Err(err) => Err(err),
    }
}
