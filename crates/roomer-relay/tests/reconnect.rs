//! Reconnect loop behavior under paused tokio time.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use roomer_core::{RelayError, Severity};
use roomer_relay::obs::RelayMetrics;
use roomer_relay::resilience::{Reconnector, RetryScope, SquaringBackoff};
use roomer_relay::telemetry::MemoryReporter;

struct Fixture {
    reconnector: Reconnector,
    reporter: Arc<MemoryReporter>,
    metrics: Arc<RelayMetrics>,
    cancel: CancellationToken,
}

fn fixture(scope: RetryScope) -> Fixture {
    let reporter = Arc::new(MemoryReporter::new());
    let metrics = Arc::new(RelayMetrics::default());
    let cancel = CancellationToken::new();
    let reconnector = Reconnector::new(
        Arc::new(SquaringBackoff::new(Duration::from_secs(1))),
        reporter.clone(),
        metrics.clone(),
        cancel.clone(),
    )
    .with_scope(scope);
    Fixture {
        reconnector,
        reporter,
        metrics,
        cancel,
    }
}

#[tokio::test(start_paused = true)]
async fn first_attempt_success_never_waits() {
    let f = fixture(RetryScope::All);
    let calls = AtomicUsize::new(0);
    let started = Instant::now();

    f.reconnector
        .run("RPC", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(f.reporter.reports().is_empty());
    assert!(f.metrics.is_link_up("RPC"));
}

#[tokio::test(start_paused = true)]
async fn waits_grow_between_failures() {
    let f = fixture(RetryScope::All);
    let attempts: Mutex<Vec<Instant>> = Mutex::new(Vec::new());

    f.reconnector
        .run("IRC", || {
            let n = {
                let mut a = attempts.lock().unwrap();
                a.push(Instant::now());
                a.len()
            };
            async move {
                if n <= 2 {
                    Err(RelayError::Shutdown)
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

    let at = attempts.lock().unwrap().clone();
    assert_eq!(at.len(), 3);
    let first_wait = at[1] - at[0];
    let second_wait = at[2] - at[1];
    assert!(first_wait >= Duration::from_secs(1), "first wait {first_wait:?}");
    assert!(second_wait >= Duration::from_secs(2), "second wait {second_wait:?}");
    assert!(second_wait > first_wait);

    let reports = f.reporter.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports
        .iter()
        .all(|r| r.severity == Severity::Warning && r.context == "IRC"));

    let m = &f.metrics.reconnect_attempts;
    assert_eq!(m.get(&[("link", "IRC"), ("result", "failed")]), 1);
    assert_eq!(m.get(&[("link", "IRC"), ("result", "ok")]), 1);
    assert!(f.metrics.is_link_up("IRC"));
}

#[tokio::test(start_paused = true)]
async fn other_failures_are_retried_at_error_severity() {
    let f = fixture(RetryScope::All);
    let calls = AtomicUsize::new(0);

    f.reconnector
        .run("RPC", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RelayError::Io("connection refused".into()))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let reports = f.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].severity, Severity::Error);
}

#[tokio::test(start_paused = true)]
async fn network_scope_gives_up_on_other() {
    let f = fixture(RetryScope::Network);
    let calls = AtomicUsize::new(0);

    let err = f
        .reconnector
        .run("RPC", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(RelayError::Eof)
                } else {
                    Err(RelayError::Protocol("garbage".into()))
                }
            }
        })
        .await
        .expect_err("must give up");

    assert_eq!(err, RelayError::Protocol("garbage".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!f.metrics.is_link_up("RPC"));
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_the_wait() {
    let f = fixture(RetryScope::All);
    let calls = AtomicUsize::new(0);

    let cancel = f.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    let err = f
        .reconnector
        .run("RPC", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RelayError::Shutdown) }
        })
        .await
        .expect_err("must be cancelled");

    assert_eq!(err, RelayError::Cancelled);
    // attempts at 0s, 1s and 3s; the 8s wait is cut short at 5s
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() < Duration::from_secs(11));
}

#[tokio::test(start_paused = true)]
async fn cancelled_token_stops_before_any_retry() {
    let f = fixture(RetryScope::All);
    f.cancel.cancel();
    let calls = AtomicUsize::new(0);

    let err = f
        .reconnector
        .run("IRC", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RelayError::UnexpectedEof) }
        })
        .await
        .expect_err("must be cancelled");

    assert_eq!(err, RelayError::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_a_hanging_attempt() {
    let f = fixture(RetryScope::All);
    let calls = AtomicUsize::new(0);

    let cancel = f.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
    });

    // a dial into a blackhole: never completes on its own
    let err = f
        .reconnector
        .run("RPC", || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending::<roomer_core::Result<()>>()
        })
        .await
        .expect_err("must be cancelled");

    assert_eq!(err, RelayError::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(f.reporter.reports().is_empty());
}
