use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use roomer_core::error::Result;
use roomer_core::protocol::irc::Message;

use crate::chat::{ChatEventKind, ChatSender};

/// Handler for one chat event kind.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn kind(&self) -> ChatEventKind;
    async fn handle(&self, sender: &dyn ChatSender, msg: Message) -> Result<()>;
}

/// Kind -> handler table. Registering a kind twice replaces the first handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<ChatEventKind, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    pub fn register(&self, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: ChatEventKind) -> Option<Arc<dyn EventHandler>> {
        self.handlers.get(&kind).map(|h| Arc::clone(h.value()))
    }

    pub fn registered_kinds(&self) -> Vec<ChatEventKind> {
        self.handlers.iter().map(|e| *e.key()).collect()
    }
}
