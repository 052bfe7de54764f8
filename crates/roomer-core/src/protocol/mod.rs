//! Protocol modules (chat lines + dispatch wire).
//!
//! - Chat lane: IRC-style text lines parsed into `irc::Message`.
//! - Dispatch lane: the envelope sent to the dispatch service and the JSON-RPC
//!   frames that carry it.
//!
//! Parsers are panic-free: malformed input is reported as `RelayError`
//! instead of indexing raw strings, so a hostile line cannot take the relay down.

pub mod dispatch;
pub mod irc;
