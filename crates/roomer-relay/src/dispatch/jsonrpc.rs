//! JSON-RPC over a plain TCP stream, one frame per line.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::dispatch::{DispatchReply, DispatchRequest, RpcRequest, RpcResponse};

use crate::dispatch::{DispatchChannel, DispatchConnector};
use crate::transport::{codec_error, dial, Lines};

pub struct JsonRpcConnector {
    addr: String,
    max_line_bytes: usize,
}

impl JsonRpcConnector {
    pub fn new(addr: impl Into<String>, max_line_bytes: usize) -> Self {
        Self {
            addr: addr.into(),
            max_line_bytes,
        }
    }
}

#[async_trait]
impl DispatchConnector for JsonRpcConnector {
    async fn connect(&self) -> Result<Box<dyn DispatchChannel>> {
        let lines = dial(&self.addr, self.max_line_bytes).await?;
        Ok(Box::new(JsonRpcChannel { lines, seq: 0 }))
    }
}

pub struct JsonRpcChannel {
    lines: Lines,
    seq: u64,
}

#[async_trait]
impl DispatchChannel for JsonRpcChannel {
    async fn call(&mut self, method: &str, req: &DispatchRequest) -> Result<DispatchReply> {
        self.seq += 1;
        let id = self.seq;

        let frame = serde_json::to_string(&RpcRequest::new(method, req, id))
            .map_err(|e| RelayError::Internal(format!("encode request: {e}")))?;
        self.lines.send(frame).await.map_err(codec_error)?;

        let line = match self.lines.next().await {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(codec_error(e)),
            None => return Err(RelayError::Eof),
        };

        let resp: RpcResponse<DispatchReply> = serde_json::from_str(&line)
            .map_err(|e| RelayError::Protocol(format!("undecodable reply: {e}")))?;
        resp.into_result(id)
    }
}
