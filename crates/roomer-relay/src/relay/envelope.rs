use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::dispatch::DispatchRequest;
use roomer_core::protocol::irc::Message;

/// Build the dispatch envelope for a chat message seen on `host`.
///
/// Sender, target and content are taken verbatim; the timestamp is stamped
/// here, not at send time.
pub fn build_request(msg: &Message, host: &str) -> Result<DispatchRequest> {
    let sender = msg
        .name()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RelayError::BadMessage("message without sender".into()))?;
    let channel = msg
        .params
        .first()
        .ok_or_else(|| RelayError::BadMessage("message without target".into()))?;
    let content = msg
        .trailing
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RelayError::BadMessage("message without content".into()))?;

    Ok(DispatchRequest::new(sender, content, host, channel.as_str()))
}
