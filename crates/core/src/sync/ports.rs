//! Port interfaces for the subscription work queue

use apsis_domain::{Result, SubscriptionWorkItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A work item as held by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedSubscription {
    /// Queue-assigned identifier.
    pub id: Uuid,
    /// The subscription to deliver.
    pub item: SubscriptionWorkItem,
    /// Failed processing attempts so far.
    pub attempts: u32,
    /// When the item was first queued.
    pub enqueued_at: DateTime<Utc>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

impl QueuedSubscription {
    /// Wrap a fresh item with a new id.
    #[must_use]
    pub fn new(item: SubscriptionWorkItem) -> Self {
        Self { id: Uuid::now_v7(), item, attempts: 0, enqueued_at: Utc::now(), last_error: None }
    }
}

/// Queue of deferred "add subscriber" calls.
///
/// Delivery is at-least-once: a claimed entry that is neither completed nor
/// requeued may be delivered again by the backing implementation.
#[async_trait]
pub trait SubscriptionQueue: Send + Sync {
    /// Add a new item to the back of the queue.
    async fn enqueue(&self, item: SubscriptionWorkItem) -> Result<QueuedSubscription>;

    /// Take up to `limit` entries. Returns nothing while suspended.
    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueuedSubscription>>;

    /// Remove a processed (or dropped) entry.
    async fn complete(&self, id: Uuid) -> Result<()>;

    /// Put an entry back at the end of the queue for a later attempt.
    async fn requeue(&self, entry: QueuedSubscription) -> Result<()>;

    /// Return claimed entries to the front of the queue, keeping their order.
    ///
    /// Used for entries that must keep their place, such as the rest of a
    /// batch cut short by a suspension.
    async fn release(&self, entries: Vec<QueuedSubscription>) -> Result<()>;

    /// Return every claimed but unsettled entry to the front of the queue.
    ///
    /// Only safe when no consumer is mid-batch. Returns the number released.
    async fn release_claimed(&self) -> Result<usize>;

    /// Stop delivering entries until [`SubscriptionQueue::resume`].
    async fn suspend(&self, reason: &str) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    async fn is_suspended(&self) -> Result<bool>;

    /// Entries waiting, including claimed ones not yet settled.
    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
