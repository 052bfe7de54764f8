use roomer_core::protocol::irc::{command, Message};

/// Event kinds the relay registers handlers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatEventKind {
    Welcome,
    Ping,
    PrivateMessage,
    Invite,
}

impl ChatEventKind {
    /// Kind of an inbound message, `None` for commands the relay ignores.
    pub fn of(msg: &Message) -> Option<Self> {
        match msg.command.as_str() {
            command::RPL_WELCOME => Some(ChatEventKind::Welcome),
            command::PING => Some(ChatEventKind::Ping),
            command::PRIVMSG => Some(ChatEventKind::PrivateMessage),
            command::INVITE => Some(ChatEventKind::Invite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChatEventKind::Welcome => "welcome",
            ChatEventKind::Ping => "ping",
            ChatEventKind::PrivateMessage => "privmsg",
            ChatEventKind::Invite => "invite",
        }
    }
}
