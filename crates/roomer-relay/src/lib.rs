//! roomer relay library entry.
//!
//! Wires the chat session, the dispatch client, the reconnect loop and the
//! relay controller into one process. Consumed by the `roomer` binary and by
//! the integration tests.

pub mod app_state;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod relay;
pub mod resilience;
pub mod router;
pub mod store;
pub mod telemetry;
pub mod transport;
