//! Dispatch client module exports.
//!
//! The client owns the single outbound connection to the dispatch service;
//! the JSON-RPC transport is the production connector.

pub mod client;
pub mod jsonrpc;

pub use client::{DispatchChannel, DispatchClient, DispatchConnector};
pub use jsonrpc::JsonRpcConnector;
