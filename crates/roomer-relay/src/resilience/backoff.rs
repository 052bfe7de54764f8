//! Delay schedules for reconnect loops.
//!
//! A policy hands out a fresh, endless schedule per loop invocation, so the
//! delay always restarts from its initial value.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackoffSection, BackoffStrategy};

pub type Delays = Box<dyn Iterator<Item = Duration> + Send>;

pub trait BackoffPolicy: Send + Sync + fmt::Debug {
    /// Waits to apply between consecutive failed attempts, in order.
    fn delays(&self) -> Delays;
}

/// Squares a unit counter after every failure: counters 2, 4, 16, 256, ...
/// and waits `unit * counter / 2` (so 1, 2, 8, 128 units). The counter
/// saturates at `u64::MAX` instead of overflowing.
#[derive(Debug, Clone, Copy)]
pub struct SquaringBackoff {
    unit: Duration,
    max: Option<Duration>,
}

impl SquaringBackoff {
    pub const INITIAL: u64 = 2;

    pub fn new(unit: Duration) -> Self {
        Self { unit, max: None }
    }

    pub fn with_max(mut self, max: Option<Duration>) -> Self {
        self.max = max;
        self
    }

    /// The raw counter sequence, starting from [`Self::INITIAL`].
    pub fn counters() -> impl Iterator<Item = u64> {
        std::iter::successors(Some(Self::INITIAL), |d| Some(d.saturating_mul(*d)))
    }
}

impl BackoffPolicy for SquaringBackoff {
    fn delays(&self) -> Delays {
        let unit_ms = millis(self.unit);
        let max = self.max;
        Box::new(
            Self::counters()
                .map(move |d| Duration::from_millis(unit_ms.saturating_mul(d) / 2))
                .map(move |wait| cap(wait, max)),
        )
    }
}

/// Doubles the wait after every failure: 1, 2, 4, 8, ... units.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    unit: Duration,
    max: Option<Duration>,
}

impl ExponentialBackoff {
    pub fn new(unit: Duration) -> Self {
        Self { unit, max: None }
    }

    pub fn with_max(mut self, max: Option<Duration>) -> Self {
        self.max = max;
        self
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn delays(&self) -> Delays {
        let unit_ms = millis(self.unit);
        let max = self.max;
        let factors = std::iter::successors(Some(1_u64), |f| Some(f.saturating_mul(2)));
        Box::new(factors.map(move |f| cap(Duration::from_millis(unit_ms.saturating_mul(f)), max)))
    }
}

pub fn policy_from_config(cfg: &BackoffSection) -> Arc<dyn BackoffPolicy> {
    let unit = Duration::from_millis(cfg.unit_ms);
    let max = cfg.max_delay_ms.map(Duration::from_millis);
    match cfg.strategy {
        BackoffStrategy::Square => Arc::new(SquaringBackoff::new(unit).with_max(max)),
        BackoffStrategy::Exponential => Arc::new(ExponentialBackoff::new(unit).with_max(max)),
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn cap(wait: Duration, max: Option<Duration>) -> Duration {
    match max {
        Some(max) => wait.min(max),
        None => wait,
    }
}
