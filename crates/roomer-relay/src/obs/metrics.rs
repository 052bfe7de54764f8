//! Relay metrics registry.
//!
//! Labels are flattened into sorted `(key, value)` vectors so rendering order is
//! deterministic. Histogram buckets are fixed in microseconds to keep the hot
//! path free of floating point math.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;

use crate::resilience::link;

type LabelKey = Vec<(String, String)>;

fn label_key(labels: &[(&str, &str)]) -> LabelKey {
    let mut key: LabelKey = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn render_labels(key: &LabelKey) -> String {
    key.iter()
        .map(|(k, v)| format!("{k}=\"{}\"", escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<LabelKey, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Current value for an exact label set (0 if never touched).
    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}{{{}}} {val}", render_labels(r.key()));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<LabelKey, AtomicI64>,
}

impl GaugeVec {
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        self.map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicI64::new(0))
            .store(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> i64 {
        self.map
            .get(&label_key(labels))
            .map(|g| g.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{name}{{{}}} {val}", render_labels(r.key()));
        }
    }
}

// 1ms .. 30s, in microseconds. Dispatch calls are network round trips.
const N_BUCKETS: usize = 8;
const BUCKETS_MICROS: [u64; N_BUCKETS] = [
    1_000, 5_000, 25_000, 100_000, 500_000, 1_000_000, 5_000_000, 30_000_000,
];

/// Unlabelled cumulative histogram.
#[derive(Default)]
pub struct Histogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; N_BUCKETS],
}

impl Histogram {
    pub fn observe(&self, elapsed: Duration) {
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(micros, Ordering::Relaxed);
        for (bucket, le) in self.buckets.iter().zip(BUCKETS_MICROS) {
            if micros <= le {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} histogram");
        for (bucket, le) in self.buckets.iter().zip(BUCKETS_MICROS) {
            let _ = writeln!(out, "{name}_bucket{{le=\"{le}\"}} {}", bucket.load(Ordering::Relaxed));
        }
        let count = self.count.load(Ordering::Relaxed);
        let _ = writeln!(out, "{name}_bucket{{le=\"+Inf\"}} {count}");
        let _ = writeln!(out, "{name}_sum {}", self.sum.load(Ordering::Relaxed));
        let _ = writeln!(out, "{name}_count {count}");
    }
}

#[derive(Default)]
pub struct RelayMetrics {
    /// `kind` = welcome | ping | privmsg | invite | ignored
    pub chat_events: CounterVec,
    /// `outcome` = acknowledged | not_acknowledged | lost
    pub dispatch_calls: CounterVec,
    pub dispatch_duration: Histogram,
    /// `link`, `result` = ok | failed
    pub reconnect_attempts: CounterVec,
    /// `severity`, `code`
    pub reports: CounterVec,
    /// 1 while the link's handle is believed live.
    pub link_up: GaugeVec,
}

impl RelayMetrics {
    pub fn set_link_up(&self, link: &str, up: bool) {
        self.link_up.set(&[("link", link)], i64::from(up));
    }

    pub fn is_link_up(&self, link: &str) -> bool {
        self.link_up.get(&[("link", link)]) > 0
    }

    /// Ready once both the chat session and the dispatch client are connected.
    pub fn is_ready(&self) -> bool {
        self.is_link_up(link::CHAT) && self.is_link_up(link::DISPATCH)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.chat_events.render("roomer_chat_events_total", &mut out);
        self.dispatch_calls.render("roomer_dispatch_calls_total", &mut out);
        self.dispatch_duration.render("roomer_dispatch_duration_micros", &mut out);
        self.reconnect_attempts.render("roomer_reconnect_attempts_total", &mut out);
        self.reports.render("roomer_reports_total", &mut out);
        self.link_up.render("roomer_link_up", &mut out);
        out
    }
}
