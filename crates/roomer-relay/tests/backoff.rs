#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use roomer_relay::config::BackoffSection;
use roomer_relay::resilience::{
    policy_from_config, BackoffPolicy, ExponentialBackoff, SquaringBackoff,
};

fn secs(v: &[u64]) -> Vec<Duration> {
    v.iter().copied().map(Duration::from_secs).collect()
}

#[test]
fn squaring_counters() {
    let got: Vec<u64> = SquaringBackoff::counters().take(4).collect();
    assert_eq!(got, vec![2, 4, 16, 256]);
}

#[test]
fn squaring_counter_saturates() {
    let last = SquaringBackoff::counters().nth(10).unwrap();
    assert_eq!(last, u64::MAX);
}

#[test]
fn squaring_waits_are_half_the_counter() {
    let policy = SquaringBackoff::new(Duration::from_secs(1));
    let got: Vec<Duration> = policy.delays().take(4).collect();
    assert_eq!(got, secs(&[1, 2, 8, 128]));
}

#[test]
fn schedule_restarts_per_call() {
    let policy = SquaringBackoff::new(Duration::from_secs(1));
    let _ = policy.delays().take(3).count();
    assert_eq!(policy.delays().next(), Some(Duration::from_secs(1)));
}

#[test]
fn cap_bounds_every_wait() {
    let policy = SquaringBackoff::new(Duration::from_secs(1)).with_max(Some(Duration::from_secs(60)));
    let got: Vec<Duration> = policy.delays().take(6).collect();
    assert_eq!(got, secs(&[1, 2, 8, 60, 60, 60]));
}

#[test]
fn exponential_doubles() {
    let policy = ExponentialBackoff::new(Duration::from_millis(500));
    let got: Vec<Duration> = policy.delays().take(4).collect();
    assert_eq!(
        got,
        [500, 1000, 2000, 4000].map(Duration::from_millis).to_vec()
    );
}

#[test]
fn policy_follows_config() {
    let cfg = BackoffSection {
        unit_ms: 10,
        ..BackoffSection::default()
    };
    let got: Vec<Duration> = policy_from_config(&cfg).delays().take(3).collect();
    assert_eq!(got, [10, 20, 80].map(Duration::from_millis).to_vec());
}
