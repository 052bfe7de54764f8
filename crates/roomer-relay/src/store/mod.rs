//! Correlation store: mints the id attached to a dispatch request.
//!
//! Optional and best-effort; a failing store never blocks delivery.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use roomer_core::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub key: String,
    pub sender: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait CorrelationStore: Send + Sync {
    /// Persist one relayed message. `key` is the composite `host/channel`.
    async fn record(&self, content: &str, sender: &str, key: &str) -> Result<MessageRecord>;
}

/// Composite key for a message seen on `channel` of `host`.
pub fn composite_key(host: &str, channel: &str) -> String {
    format!("{host}/{channel}")
}

/// Process-local store; records do not survive a restart. Holds at most
/// `capacity` records and evicts the oldest first.
pub struct MemoryCorrelationStore {
    capacity: usize,
    records: DashMap<String, MessageRecord>,
    order: Mutex<VecDeque<String>>,
}

impl Default for MemoryCorrelationStore {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl MemoryCorrelationStore {
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` is clamped to at least one record.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: DashMap::with_capacity(capacity),
            order: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, id: &str) -> Option<MessageRecord> {
        self.records.get(id).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl CorrelationStore for MemoryCorrelationStore {
    async fn record(&self, content: &str, sender: &str, key: &str) -> Result<MessageRecord> {
        let rec = MessageRecord {
            id: Uuid::new_v4().to_string(),
            key: key.to_string(),
            sender: sender.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        self.records.insert(rec.id.clone(), rec.clone());
        order.push_back(rec.id.clone());
        while order.len() > self.capacity {
            if let Some(oldest) = order.pop_front() {
                self.records.remove(&oldest);
            }
        }
        Ok(rec)
    }
}
