//! Relay controller and the chat event handlers it drives.
//!
//! One worker owns the chat session's event loop. Each inbound event runs to
//! completion, including any reconnect loop it triggers, before the next one
//! is read.

pub mod controller;
pub mod envelope;
pub mod forward;
pub mod handlers;
pub mod registry;

pub use controller::RelayController;
pub use envelope::build_request;
pub use forward::{DispatchOutcome, Forwarder};
pub use handlers::{InviteHandler, PingHandler, PrivmsgHandler, WelcomeHandler};
pub use registry::{EventHandler, HandlerRegistry};
