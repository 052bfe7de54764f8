//! Lightweight in-process metrics (dependency-light).
//!
//! Counters, gauges and one latency histogram stored as atomics behind
//! `DashMap` label keys, rendered as Prometheus text by the `/metrics` handler.

pub mod metrics;

pub use metrics::RelayMetrics;
