use async_trait::async_trait;

use roomer_core::error::Result;
use roomer_core::protocol::irc::Message;

/// Outbound half handed to event handlers.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, msg: &Message) -> Result<()>;
}

/// A reconnectable chat session.
#[async_trait]
pub trait ChatSession: ChatSender {
    fn as_sender(&self) -> &dyn ChatSender;

    /// Dial and register, replacing any previous connection.
    async fn connect(&self) -> Result<()>;

    /// Next inbound message; `None` once the connection is gone.
    async fn next_message(&self) -> Option<Result<Message>>;
}
