use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::irc::{command, Message};

use crate::chat::{ChatSender, ChatSession};
use crate::config::ChatSection;
use crate::transport::{codec_error, dial, Lines};

/// IRC client session. Reader and writer halves are swapped as a pair by
/// `connect`; each sits behind its own lock so a handler can reply while the
/// event loop owns the reader.
pub struct IrcSession {
    server: String,
    nick: String,
    password: Option<String>,
    max_line_bytes: usize,
    writer: Mutex<Option<SplitSink<Lines, String>>>,
    reader: Mutex<Option<SplitStream<Lines>>>,
}

impl IrcSession {
    pub fn new(cfg: &ChatSection) -> Self {
        Self {
            server: cfg.server.clone(),
            nick: cfg.nick.clone(),
            password: cfg.password.clone(),
            max_line_bytes: cfg.max_line_bytes,
            writer: Mutex::new(None),
            reader: Mutex::new(None),
        }
    }

    fn registration(&self) -> Vec<Message> {
        let mut lines = Vec::with_capacity(3);
        if let Some(pass) = &self.password {
            lines.push(Message::new(command::PASS, vec![pass.clone()]));
        }
        lines.push(Message::new(command::NICK, vec![self.nick.clone()]));
        lines.push(
            Message::new(command::USER, vec![self.nick.clone(), "0".into(), "*".into()])
                .with_trailing(self.nick.clone()),
        );
        lines
    }
}

#[async_trait]
impl ChatSender for IrcSession {
    async fn send(&self, msg: &Message) -> Result<()> {
        let mut guard = self.writer.lock().await;
        let sink = guard.as_mut().ok_or(RelayError::Shutdown)?;
        tracing::trace!(line = %msg, "irc send");
        sink.send(msg.to_line()).await.map_err(codec_error)
    }
}

#[async_trait]
impl ChatSession for IrcSession {
    fn as_sender(&self) -> &dyn ChatSender {
        self
    }

    async fn connect(&self) -> Result<()> {
        let (mut sink, stream) = dial(&self.server, self.max_line_bytes).await?.split();

        for msg in self.registration() {
            sink.send(msg.to_line()).await.map_err(codec_error)?;
        }

        *self.writer.lock().await = Some(sink);
        *self.reader.lock().await = Some(stream);
        tracing::info!(server = %self.server, nick = %self.nick, "irc session connected");
        Ok(())
    }

    async fn next_message(&self) -> Option<Result<Message>> {
        let mut guard = self.reader.lock().await;
        loop {
            let line = match guard.as_mut()?.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(codec_error(e))),
                None => {
                    *guard = None;
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            tracing::trace!(%line, "irc recv");
            return Some(Message::parse(&line));
        }
    }
}
