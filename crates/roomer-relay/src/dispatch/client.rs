use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::dispatch::{DispatchReply, DispatchRequest};
use roomer_core::{classify, FailureClass};

/// Opens fresh connections to the dispatch service.
#[async_trait]
pub trait DispatchConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DispatchChannel>>;
}

/// One live connection. Calls are strictly request/response.
#[async_trait]
pub trait DispatchChannel: Send {
    async fn call(&mut self, method: &str, req: &DispatchRequest) -> Result<DispatchReply>;
}

/// Holder of the process-wide dispatch connection handle.
///
/// The handle sits behind an async mutex: `connect` finishes building the new
/// channel before it takes the lock and swaps it in, and `call` holds the lock
/// for the whole round trip, so no caller ever sees a half-built handle or
/// overlaps a replacement.
pub struct DispatchClient {
    connector: Arc<dyn DispatchConnector>,
    method: String,
    handle: Mutex<Option<Box<dyn DispatchChannel>>>,
}

impl DispatchClient {
    pub fn new(connector: Arc<dyn DispatchConnector>, method: impl Into<String>) -> Self {
        Self {
            connector,
            method: method.into(),
            handle: Mutex::new(None),
        }
    }

    /// Establish a new connection, replacing (and dropping) the old one.
    pub async fn connect(&self) -> Result<()> {
        let channel = self.connector.connect().await?;
        *self.handle.lock().await = Some(channel);
        tracing::info!(method = %self.method, "dispatch client connected");
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Send one request over the current handle. No retry happens here.
    pub async fn call(&self, req: &DispatchRequest) -> Result<DispatchReply> {
        let mut guard = self.handle.lock().await;
        let channel = guard.as_mut().ok_or(RelayError::Shutdown)?;
        let res = channel.call(&self.method, req).await;
        if let Err(err) = &res {
            if classify(err) == FailureClass::Network {
                // the channel is dead; later calls fail fast until reconnected
                *guard = None;
            }
        }
        res
    }
}
