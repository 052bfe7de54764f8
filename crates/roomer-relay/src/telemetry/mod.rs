//! Severity-tagged error reporting.
//!
//! Reporting is fire-and-forget: a reporter never returns an error and never
//! alters the relay's control flow.

use std::sync::{Arc, Mutex};

use roomer_core::{RelayError, Severity};

use crate::obs::RelayMetrics;

pub trait Reporter: Send + Sync {
    /// `context` names where the failure happened (a link label or handler).
    fn report(&self, severity: Severity, context: &str, err: &RelayError);
}

/// Emits each report as a `tracing` event and counts it.
pub struct TracingReporter {
    metrics: Arc<RelayMetrics>,
}

impl TracingReporter {
    pub fn new(metrics: Arc<RelayMetrics>) -> Self {
        Self { metrics }
    }
}

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, context: &str, err: &RelayError) {
        self.metrics
            .reports
            .inc(&[("severity", severity.as_str()), ("code", err.code())]);
        match severity {
            Severity::Error => tracing::error!(context, code = err.code(), error = %err, "relay error"),
            Severity::Warning => tracing::warn!(context, code = err.code(), error = %err, "relay warning"),
        }
    }
}

/// One captured report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub severity: Severity,
    pub context: String,
    pub error: RelayError,
}

/// Keeps reports in memory, for embedding the relay and for tests.
#[derive(Default)]
pub struct MemoryReporter {
    reports: Mutex<Vec<Captured>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Captured> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, severity: Severity, context: &str, err: &RelayError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(Captured {
                severity,
                context: context.to_string(),
                error: err.clone(),
            });
        }
    }
}
