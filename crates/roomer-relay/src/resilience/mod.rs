//! Connection resilience: delay schedules and the reconnect loop shared by the
//! chat session and the dispatch client.

pub mod backoff;
pub mod reconnect;

pub use backoff::{policy_from_config, BackoffPolicy, ExponentialBackoff, SquaringBackoff};
pub use reconnect::{Reconnector, RetryScope};

/// Link labels used in logs, reports and metrics.
pub mod link {
    pub const CHAT: &str = "IRC";
    pub const DISPATCH: &str = "RPC";
}
