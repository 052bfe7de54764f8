//! Dispatch lane: the envelope relayed to the dispatch service.
//!
//! The service is reached with JSON-RPC 1.0 style frames, one per line:
//! `{"method":"Message.Dispatch","params":[<request>],"id":7}` answered by
//! `{"id":7,"result":{"OK":true},"error":null}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RelayError, Result};

/// Method name the dispatch service registers for relayed chat messages.
pub const DISPATCH_METHOD: &str = "Message.Dispatch";

/// One outbound unit of work. Immutable once built; the timestamp is taken at
/// construction so a later send still carries the original time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DispatchRequest {
    from: String,
    content: String,
    time: DateTime<Utc>,
    host: String,
    channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl DispatchRequest {
    pub fn new(
        from: impl Into<String>,
        content: impl Into<String>,
        host: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            content: content.into(),
            time: Utc::now(),
            host: host.into(),
            channel: channel.into(),
            correlation_id: None,
        }
    }

    /// Attach the id minted by the persistence collaborator.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Sender identity (`From` on the wire).
    pub fn sender(&self) -> &str {
        &self.from
    }
    pub fn content(&self) -> &str {
        &self.content
    }
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }
    pub fn host(&self) -> &str {
        &self.host
    }
    pub fn channel(&self) -> &str {
        &self.channel
    }
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// Reply to a dispatch call. Unknown fields are tolerated so the service can
/// grow a structured result without breaking older relays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReply {
    #[serde(rename = "OK")]
    pub ok: bool,
}

impl DispatchReply {
    pub fn accepted() -> Self {
        Self { ok: true }
    }
    pub fn rejected() -> Self {
        Self { ok: false }
    }
}

/// JSON-RPC request frame. `P` is `&DispatchRequest` when sending and
/// `DispatchRequest` when decoding on the service side.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcRequest<P> {
    pub method: String,
    pub params: [P; 1],
    pub id: u64,
}

impl<P> RpcRequest<P> {
    pub fn new(method: &str, param: P, id: u64) -> Self {
        Self {
            method: method.to_string(),
            params: [param],
            id,
        }
    }
}

/// JSON-RPC response frame (`error` is null on success).
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<R> {
    pub id: u64,
    pub result: Option<R>,
    pub error: Option<String>,
}

impl<R> RpcResponse<R> {
    pub fn success(id: u64, result: R) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, error: impl Into<String>) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Check the frame answers `expected_id` and unwrap the result.
    pub fn into_result(self, expected_id: u64) -> Result<R> {
        if self.id != expected_id {
            return Err(RelayError::Protocol(format!(
                "reply id {} does not match request id {expected_id}",
                self.id
            )));
        }
        if let Some(err) = self.error {
            return Err(RelayError::Remote(err));
        }
        self.result
            .ok_or_else(|| RelayError::Protocol("reply carries neither result nor error".into()))
    }
}
