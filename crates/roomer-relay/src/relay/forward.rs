use std::sync::Arc;
use std::time::Instant;

use roomer_core::error::{RelayError, Result};
use roomer_core::protocol::dispatch::DispatchRequest;
use roomer_core::{classify, FailureClass, Severity};

use crate::dispatch::DispatchClient;
use crate::obs::RelayMetrics;
use crate::resilience::{link, Reconnector};
use crate::telemetry::Reporter;

/// What became of one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Delivered and accepted.
    Acknowledged,
    /// Delivered, but the service declined it. Not retried.
    NotAcknowledged,
    /// The call failed and the reconnect loop ran. The envelope is dropped,
    /// never replayed on the new connection (at-most-once delivery).
    Lost,
}

impl DispatchOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Acknowledged => "acknowledged",
            DispatchOutcome::NotAcknowledged => "not_acknowledged",
            DispatchOutcome::Lost => "lost",
        }
    }
}

/// Sends envelopes and repairs the dispatch link when a call fails.
pub struct Forwarder {
    client: Arc<DispatchClient>,
    reconnector: Arc<Reconnector>,
    reporter: Arc<dyn Reporter>,
    metrics: Arc<RelayMetrics>,
}

impl Forwarder {
    pub fn new(
        client: Arc<DispatchClient>,
        reconnector: Arc<Reconnector>,
        reporter: Arc<dyn Reporter>,
        metrics: Arc<RelayMetrics>,
    ) -> Self {
        Self {
            client,
            reconnector,
            reporter,
            metrics,
        }
    }

    /// One dispatch attempt, plus a reconnect loop if the call failed.
    ///
    /// Only `Cancelled` (or a failure the retry scope refuses) comes back as
    /// an error; every other failure is reported and folded into the outcome.
    pub async fn forward(&self, req: &DispatchRequest) -> Result<DispatchOutcome> {
        tracing::debug!(from = req.sender(), channel = req.channel(), "trying to send message");

        let started = Instant::now();
        let res = self.client.call(req).await;
        self.metrics.dispatch_duration.observe(started.elapsed());

        let outcome = match res {
            Ok(reply) if reply.ok => DispatchOutcome::Acknowledged,
            Ok(_) => {
                tracing::warn!(from = req.sender(), "was not given the OK");
                self.reporter
                    .report(Severity::Warning, link::DISPATCH, &RelayError::NotAcknowledged);
                DispatchOutcome::NotAcknowledged
            }
            Err(err) => {
                let class = classify(&err);
                self.reporter.report(class.severity(), link::DISPATCH, &err);
                if class == FailureClass::Network {
                    self.metrics.set_link_up(link::DISPATCH, false);
                }

                if self.reconnector.scope().retries(class) {
                    tracing::warn!(error = %err, "couldn't send message, trying reconnect");
                    let client = self.client.as_ref();
                    self.reconnector
                        .run(link::DISPATCH, move || client.connect())
                        .await?;
                }
                DispatchOutcome::Lost
            }
        };

        self.metrics
            .dispatch_calls
            .inc(&[("outcome", outcome.as_str())]);
        Ok(outcome)
    }
}
