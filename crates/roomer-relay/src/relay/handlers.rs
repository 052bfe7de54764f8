//! Built-in chat event handlers.

use std::sync::Arc;

use async_trait::async_trait;

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::irc::{command, Message};
use roomer_core::Severity;

use crate::chat::{ChatEventKind, ChatSender};
use crate::relay::envelope::build_request;
use crate::relay::forward::{DispatchOutcome, Forwarder};
use crate::relay::registry::EventHandler;
use crate::store::{composite_key, CorrelationStore};
use crate::telemetry::Reporter;

/// Joins the configured channels once registration completes.
pub struct WelcomeHandler {
    channels: Vec<String>,
}

impl WelcomeHandler {
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl EventHandler for WelcomeHandler {
    fn kind(&self) -> ChatEventKind {
        ChatEventKind::Welcome
    }

    async fn handle(&self, sender: &dyn ChatSender, _msg: Message) -> Result<()> {
        tracing::info!(channels = ?self.channels, "registered");
        let join = Message::new(command::JOIN, vec![self.channels.join(",")]);
        sender.send(&join).await
    }
}

/// Answers keep-alives, echoing params and trailing text.
#[derive(Default)]
pub struct PingHandler;

impl PingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for PingHandler {
    fn kind(&self) -> ChatEventKind {
        ChatEventKind::Ping
    }

    async fn handle(&self, sender: &dyn ChatSender, msg: Message) -> Result<()> {
        let pong = Message {
            prefix: None,
            command: command::PONG.to_string(),
            params: msg.params,
            trailing: msg.trailing,
        };
        sender.send(&pong).await
    }
}

/// Follows invites into the invited channel.
#[derive(Default)]
pub struct InviteHandler;

impl InviteHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for InviteHandler {
    fn kind(&self) -> ChatEventKind {
        ChatEventKind::Invite
    }

    async fn handle(&self, sender: &dyn ChatSender, msg: Message) -> Result<()> {
        // INVITE <nick> <channel>; some servers put the channel in the trailing part
        let channel = msg
            .params
            .get(1)
            .cloned()
            .or(msg.trailing)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| RelayError::BadMessage("invite without channel".into()))?;
        tracing::info!(%channel, by = ?msg.prefix.as_ref().map(|p| &p.name), "invited");
        sender.send(&Message::new(command::JOIN, vec![channel])).await
    }
}

/// Relays chat messages to the dispatch service.
pub struct PrivmsgHandler {
    host: String,
    forwarder: Arc<Forwarder>,
    store: Option<Arc<dyn CorrelationStore>>,
    reporter: Arc<dyn Reporter>,
}

impl PrivmsgHandler {
    pub fn new(
        host: impl Into<String>,
        forwarder: Arc<Forwarder>,
        store: Option<Arc<dyn CorrelationStore>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            host: host.into(),
            forwarder,
            store,
            reporter,
        }
    }
}

#[async_trait]
impl EventHandler for PrivmsgHandler {
    fn kind(&self) -> ChatEventKind {
        ChatEventKind::PrivateMessage
    }

    async fn handle(&self, _sender: &dyn ChatSender, msg: Message) -> Result<()> {
        tracing::debug!(params = ?msg.params, trailing = ?msg.trailing, "chat message");
        let mut req = build_request(&msg, &self.host)?;

        if let Some(store) = &self.store {
            let key = composite_key(req.host(), req.channel());
            match store.record(req.content(), req.sender(), &key).await {
                Ok(rec) => req = req.with_correlation_id(rec.id),
                // a missing correlation id never suppresses delivery
                Err(err) => self.reporter.report(Severity::Warning, "correlation", &err),
            }
        }

        let outcome = self.forwarder.forward(&req).await?;
        if outcome != DispatchOutcome::Acknowledged {
            tracing::info!(outcome = outcome.as_str(), from = req.sender(), "message not delivered");
        }
        Ok(())
    }
}
