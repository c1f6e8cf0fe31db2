//! In-process [`SubscriptionQueue`].
//!
//! Entries live in a FIFO; claimed entries are held aside, in claim order,
//! until completed, requeued or released. Suspension stops claims but keeps
//! every entry.

use std::collections::VecDeque;

use apsis_core::{QueuedSubscription, SubscriptionQueue};
use apsis_domain::constants::SUBSCRIPTION_QUEUE_NAME;
use apsis_domain::{Result, SubscriptionWorkItem};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<QueuedSubscription>,
    claimed: Vec<QueuedSubscription>,
    suspended: Option<String>,
}

impl QueueState {
    fn take_claimed(&mut self, id: Uuid) -> Option<QueuedSubscription> {
        let position = self.claimed.iter().position(|entry| entry.id == id)?;
        Some(self.claimed.remove(position))
    }

    fn push_front_in_order(&mut self, entries: Vec<QueuedSubscription>) {
        for entry in entries.into_iter().rev() {
            self.pending.push_front(entry);
        }
    }
}

/// Queue held in memory; lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionQueue {
    state: Mutex<QueueState>,
}

impl InMemorySubscriptionQueue {
    /// Empty, unsuspended queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reason given for the current suspension.
    pub fn suspension_reason(&self) -> Option<String> {
        self.state.lock().suspended.clone()
    }

    /// Copy of the waiting (unclaimed) entries, front first.
    pub fn pending(&self) -> Vec<QueuedSubscription> {
        self.state.lock().pending.iter().cloned().collect()
    }
}

#[async_trait]
impl SubscriptionQueue for InMemorySubscriptionQueue {
    async fn enqueue(&self, item: SubscriptionWorkItem) -> Result<QueuedSubscription> {
        let entry = QueuedSubscription::new(item);
        self.state.lock().pending.push_back(entry.clone());
        Ok(entry)
    }

    async fn claim_batch(&self, limit: usize) -> Result<Vec<QueuedSubscription>> {
        let mut state = self.state.lock();
        if state.suspended.is_some() {
            return Ok(Vec::new());
        }

        let take = limit.min(state.pending.len());
        let batch: Vec<_> = state.pending.drain(..take).collect();
        state.claimed.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn complete(&self, id: Uuid) -> Result<()> {
        if self.state.lock().take_claimed(id).is_none() {
            warn!(entry_id = %id, "Completed an entry that was not claimed");
        }
        Ok(())
    }

    async fn requeue(&self, entry: QueuedSubscription) -> Result<()> {
        let mut state = self.state.lock();
        state.take_claimed(entry.id);
        state.pending.push_back(entry);
        Ok(())
    }

    async fn release(&self, entries: Vec<QueuedSubscription>) -> Result<()> {
        let mut state = self.state.lock();
        for entry in &entries {
            state.take_claimed(entry.id);
        }
        state.push_front_in_order(entries);
        Ok(())
    }

    async fn release_claimed(&self) -> Result<usize> {
        let mut state = self.state.lock();
        let claimed = std::mem::take(&mut state.claimed);
        let released = claimed.len();
        state.push_front_in_order(claimed);
        if released > 0 {
            info!(queue = SUBSCRIPTION_QUEUE_NAME, released, "Returned claimed subscriptions to the queue");
        }
        Ok(released)
    }

    async fn suspend(&self, reason: &str) -> Result<()> {
        self.state.lock().suspended = Some(reason.to_string());
        warn!(queue = SUBSCRIPTION_QUEUE_NAME, reason, "Subscription queue suspended");
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        if self.state.lock().suspended.take().is_some() {
            info!(queue = SUBSCRIPTION_QUEUE_NAME, "Subscription queue resumed");
        }
        Ok(())
    }

    async fn is_suspended(&self) -> Result<bool> {
        Ok(self.state.lock().suspended.is_some())
    }

    async fn len(&self) -> Result<usize> {
        let state = self.state.lock();
        Ok(state.pending.len() + state.claimed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(email: &str) -> SubscriptionWorkItem {
        SubscriptionWorkItem::new(email, "1", "A", Vec::new())
    }

    #[tokio::test]
    async fn claims_in_fifo_order() {
        let queue = InMemorySubscriptionQueue::new();
        queue.enqueue(item("a@b.com")).await.unwrap();
        queue.enqueue(item("c@d.com")).await.unwrap();
        queue.enqueue(item("e@f.com")).await.unwrap();

        let batch = queue.claim_batch(2).await.unwrap();
        let emails: Vec<_> = batch.iter().map(|entry| entry.item.email.as_str()).collect();
        assert_eq!(emails, vec!["a@b.com", "c@d.com"]);
        assert_eq!(queue.len().await.unwrap(), 3);

        queue.complete(batch[0].id).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn requeue_moves_entry_to_the_back() {
        let queue = InMemorySubscriptionQueue::new();
        queue.enqueue(item("a@b.com")).await.unwrap();
        queue.enqueue(item("c@d.com")).await.unwrap();

        let mut batch = queue.claim_batch(1).await.unwrap();
        let mut entry = batch.remove(0);
        entry.attempts += 1;
        queue.requeue(entry.clone()).await.unwrap();

        let pending = queue.pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1], entry);
    }

    #[tokio::test]
    async fn release_returns_entries_to_the_front_in_order() {
        let queue = InMemorySubscriptionQueue::new();
        queue.enqueue(item("a@b.com")).await.unwrap();
        queue.enqueue(item("c@d.com")).await.unwrap();
        queue.enqueue(item("e@f.com")).await.unwrap();

        let batch = queue.claim_batch(2).await.unwrap();
        queue.release(batch).await.unwrap();

        let emails: Vec<_> = queue.pending().into_iter().map(|entry| entry.item.email).collect();
        assert_eq!(emails, vec!["a@b.com", "c@d.com", "e@f.com"]);
        assert_eq!(queue.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn release_claimed_makes_abandoned_entries_claimable() {
        let queue = InMemorySubscriptionQueue::new();
        queue.enqueue(item("a@b.com")).await.unwrap();
        queue.enqueue(item("c@d.com")).await.unwrap();

        let abandoned = queue.claim_batch(1).await.unwrap();
        assert_eq!(queue.release_claimed().await.unwrap(), 1);
        assert_eq!(queue.release_claimed().await.unwrap(), 0);

        let batch = queue.claim_batch(10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], abandoned[0]);
    }

    #[tokio::test]
    async fn suspension_blocks_claims_until_resumed() {
        let queue = InMemorySubscriptionQueue::new();
        queue.enqueue(item("a@b.com")).await.unwrap();
        queue.suspend("Busy").await.unwrap();

        assert!(queue.is_suspended().await.unwrap());
        assert_eq!(queue.suspension_reason().as_deref(), Some("Busy"));
        assert!(queue.claim_batch(10).await.unwrap().is_empty());
        assert!(!queue.is_empty().await.unwrap());

        queue.resume().await.unwrap();
        assert_eq!(queue.claim_batch(10).await.unwrap().len(), 1);
    }
}
