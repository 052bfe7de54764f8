//! Shared TCP line framing for both links.
//!
//! The chat session and the JSON-RPC dispatch transport both speak
//! newline-delimited text; this module owns the codec setup and maps codec
//! failures onto `RelayError` so the classifier sees link loss as link loss.

pub mod lines;

pub use lines::{codec_error, dial, Lines};
