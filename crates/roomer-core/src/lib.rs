//! roomer core: runtime-free relay primitives, error types, and wire contracts.
//!
//! This crate defines the chat line codec, the dispatch envelope carried to the
//! remote dispatch service, and the failure classifier shared by every retry
//! loop in the relay. It carries no async runtime so the contracts can be
//! reused by the dispatch service side and by test tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Malformed chat lines
//! and malformed replies surface as `RelayError` values, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

pub use error::{classify, FailureClass, RelayError, Result, Severity};
