//! Top-level facade crate for roomer.
//!
//! Re-exports the protocol types and the relay library so embedders can depend
//! on a single crate.

pub mod core {
    pub use roomer_core::*;
}

pub mod relay {
    pub use roomer_relay::*;
}
