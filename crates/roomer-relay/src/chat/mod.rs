//! Chat session adapter (IRC over TCP).
//!
//! Exposes a connect operation, a stream of parsed messages, and a sender
//! handle for outbound replies. Protocol details stay in `roomer_core`.

pub mod event;
pub mod irc;
pub mod session;

pub use event::ChatEventKind;
pub use irc::IrcSession;
pub use session::{ChatSender, ChatSession};
