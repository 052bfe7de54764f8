//! The reconnect loop.
//!
//! `Reconnector::run` invokes an idempotent connect action until it succeeds.
//! The happy path costs one call and no wait. After a failure it sleeps for
//! the next delay of a fresh schedule and tries again, reporting each failure
//! with the severity its class carries. The only exits besides success are
//! cancellation (during a wait or an attempt) and, under `RetryScope::Network`,
//! a non-network failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use roomer_core::{classify, FailureClass, RelayError, Result};

use crate::config::RetryOn;
use crate::obs::RelayMetrics;
use crate::resilience::BackoffPolicy;
use crate::telemetry::Reporter;

/// Which failure classes keep a reconnect loop going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryScope {
    /// Retry on every failure; the class only picks the report severity.
    #[default]
    All,
    /// Give up on the first non-network failure.
    Network,
}

impl RetryScope {
    pub fn retries(self, class: FailureClass) -> bool {
        match self {
            RetryScope::All => true,
            RetryScope::Network => class == FailureClass::Network,
        }
    }
}

impl From<RetryOn> for RetryScope {
    fn from(v: RetryOn) -> Self {
        match v {
            RetryOn::All => RetryScope::All,
            RetryOn::Network => RetryScope::Network,
        }
    }
}

pub struct Reconnector {
    policy: Arc<dyn BackoffPolicy>,
    scope: RetryScope,
    reporter: Arc<dyn Reporter>,
    metrics: Arc<RelayMetrics>,
    cancel: CancellationToken,
}

impl Reconnector {
    pub fn new(
        policy: Arc<dyn BackoffPolicy>,
        reporter: Arc<dyn Reporter>,
        metrics: Arc<RelayMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            policy,
            scope: RetryScope::default(),
            reporter,
            metrics,
            cancel,
        }
    }

    pub fn with_scope(mut self, scope: RetryScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> RetryScope {
        self.scope
    }

    /// Retry `attempt` until it succeeds.
    ///
    /// Returns `Cancelled` if the shutdown token fires during a wait, or the
    /// failing error when the scope refuses to retry its class.
    pub async fn run<F, Fut>(&self, link: &str, mut attempt: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let first = match self.attempt_or_cancel(&mut attempt).await? {
            Ok(()) => {
                self.metrics.set_link_up(link, true);
                return Ok(());
            }
            Err(err) => err,
        };

        self.metrics.set_link_up(link, false);
        tracing::warn!(link, error = %first, "disconnected from server, reconnecting");
        self.note_failure(link, &first)?;

        let mut delays = self.policy.delays();
        loop {
            let wait = delays.next().unwrap_or(Duration::MAX);
            tracing::debug!(link, ?wait, "waiting before next attempt");

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(link, "reconnect cancelled");
                    return Err(RelayError::Cancelled);
                }
                _ = tokio::time::sleep(wait) => {}
            }

            match self.attempt_or_cancel(&mut attempt).await? {
                Ok(()) => {
                    self.metrics
                        .reconnect_attempts
                        .inc(&[("link", link), ("result", "ok")]);
                    self.metrics.set_link_up(link, true);
                    tracing::info!(link, "link restored by reconnect");
                    return Ok(());
                }
                Err(err) => {
                    self.metrics
                        .reconnect_attempts
                        .inc(&[("link", link), ("result", "failed")]);
                    self.note_failure(link, &err)?;
                }
            }
        }
    }

    /// Run one attempt unless shutdown fires first. A dial that hangs does not
    /// outlive the cancel token.
    async fn attempt_or_cancel<F, Fut>(&self, attempt: &mut F) -> Result<Result<()>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RelayError::Cancelled),
            res = attempt() => Ok(res),
        }
    }

    fn note_failure(&self, link: &str, err: &RelayError) -> Result<()> {
        let class = classify(err);
        self.reporter.report(class.severity(), link, err);
        if class == FailureClass::Other {
            tracing::warn!(link, error = %err, "came across a non-network error");
        }
        if self.scope.retries(class) {
            Ok(())
        } else {
            Err(err.clone())
        }
    }
}
