//! Subscription queue worker for deferred subscriber creation.
//!
//! Drains queued [`SubscriptionWorkItem`]s, calls the service for each one
//! and settles the entry according to [`QueueDisposition`]: completed on
//! success or permanent failure, requeued on transient failure, and the whole
//! queue suspended on outages or credential problems. Each drain is bounded
//! by a time budget; the background loop follows the same lifecycle rules as
//! the other workers: join handles are tracked and cancellation is explicit.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use apsis_domain::ApiSettings;
//! use apsis_infra::integrations::apsis::ApsisClient;
//! use apsis_infra::sync::{InMemorySubscriptionQueue, SubscriptionQueueWorker, SubscriptionWorkerConfig};
//!
//! # async fn example() -> Result<(), String> {
//! let client = Arc::new(ApsisClient::from_settings(Arc::new(ApiSettings::default())).map_err(|e| e.to_string())?);
//! let queue = Arc::new(InMemorySubscriptionQueue::new());
//! let mut worker = SubscriptionQueueWorker::new(queue, client, SubscriptionWorkerConfig::default());
//!
//! worker.start().await?;
//! // ... application runs ...
//! worker.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use apsis_core::{DropSeverity, QueueDisposition, QueuedSubscription, SubscriptionQueue};
use apsis_domain::constants::SUBSCRIPTION_WORKER_TIME_BUDGET_SECS;
use apsis_domain::{ApsisError, Result, SubscriptionResponse, SubscriptionWorkItem};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::integrations::apsis::ApsisClient;

/// Configuration for the subscription worker.
#[derive(Debug, Clone)]
pub struct SubscriptionWorkerConfig {
    /// Maximum number of entries claimed at once
    pub batch_size: usize,
    /// Interval between drains in the background loop
    pub poll_interval: Duration,
    /// Upper bound on the time spent in one drain
    pub time_budget: Duration,
    /// Drop an entry after this many failed attempts; `None` retries forever
    pub max_attempts: Option<u32>,
    /// Join timeout when stopping
    pub join_timeout: Duration,
}

impl Default for SubscriptionWorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            poll_interval: Duration::from_secs(60),
            time_budget: Duration::from_secs(SUBSCRIPTION_WORKER_TIME_BUDGET_SECS),
            max_attempts: None,
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Interface for submitting a subscription to the remote service.
#[async_trait]
pub trait SubscriptionForwarder: Send + Sync {
    /// Create the subscriber described by `item` on its mailing list.
    async fn add_subscriber(&self, item: &SubscriptionWorkItem) -> Result<SubscriptionResponse>;
}

#[async_trait]
impl SubscriptionForwarder for ApsisClient {
    async fn add_subscriber(&self, item: &SubscriptionWorkItem) -> Result<SubscriptionResponse> {
        Self::add_subscriber(self, &item.list_id, &item.email, &item.name, &item.demographic_data).await
    }
}

/// Counters for one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    /// Entries the service accepted
    pub succeeded: u32,
    /// Entries removed after a permanent failure
    pub dropped: u32,
    /// Entries put back for a later attempt
    pub requeued: u32,
    /// Claimed entries returned untouched because the queue was suspended
    pub released: u32,
    /// Whether the queue was (or became) suspended
    pub suspended: bool,
}

impl DrainSummary {
    fn merge(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.dropped += other.dropped;
        self.requeued += other.requeued;
        self.released += other.released;
        self.suspended |= other.suspended;
    }

    /// Entries that received an attempt.
    #[must_use]
    pub const fn attempted(&self) -> u32 {
        self.succeeded + self.dropped + self.requeued
    }
}

struct Processor {
    queue: Arc<dyn SubscriptionQueue>,
    forwarder: Arc<dyn SubscriptionForwarder>,
    config: SubscriptionWorkerConfig,
}

impl Processor {
    async fn process_item(&self, item: &SubscriptionWorkItem) -> (QueueDisposition, Option<ApsisError>) {
        let outcome = self.forwarder.add_subscriber(item).await;
        let disposition = QueueDisposition::for_outcome(&outcome);

        match (&outcome, disposition) {
            (Ok(response), _) => {
                debug!(email = %item.email, list_id = %item.list_id, message = ?response.message, "Subscription delivered");
            }
            (Err(err), QueueDisposition::Dropped(DropSeverity::Notice)) => {
                info!(email = %item.email, list_id = %item.list_id, error = %err, "Subscription dropped: address opted out");
            }
            (Err(err), QueueDisposition::Dropped(DropSeverity::Error)) => {
                error!(
                    email = %item.email,
                    list_id = %item.list_id,
                    kind = ?err.kind(),
                    error = %err,
                    "Subscription dropped: rejected by validation"
                );
            }
            (Err(err), QueueDisposition::SuspendQueue) => {
                error!(kind = ?err.kind(), error = %err, "Subscription queue must be suspended");
            }
            (Err(err), _) => {
                warn!(
                    email = %item.email,
                    list_id = %item.list_id,
                    kind = ?err.kind(),
                    error = %err,
                    "Subscription failed; will retry"
                );
            }
        }

        (disposition, outcome.err())
    }

    async fn process_batch(&self) -> Result<DrainSummary> {
        let mut summary = DrainSummary::default();

        if self.queue.is_suspended().await? {
            debug!("Subscription queue is suspended; skipping batch");
            summary.suspended = true;
            return Ok(summary);
        }

        let entries = self.queue.claim_batch(self.config.batch_size).await?;
        if entries.is_empty() {
            return Ok(summary);
        }

        debug!(count = entries.len(), "Processing subscription batch");

        let mut entries = entries.into_iter();
        while let Some(mut entry) = entries.next() {
            let (disposition, err) = self.process_item(&entry.item).await;

            match disposition {
                QueueDisposition::Succeeded => {
                    self.queue.complete(entry.id).await?;
                    summary.succeeded += 1;
                }
                QueueDisposition::Dropped(_) => {
                    self.queue.complete(entry.id).await?;
                    summary.dropped += 1;
                }
                QueueDisposition::Requeue => {
                    entry.attempts = entry.attempts.saturating_add(1);
                    entry.last_error = err.as_ref().map(|e| truncate_reason(&e.to_string()));

                    if self.config.max_attempts.is_some_and(|max| entry.attempts >= max) {
                        error!(
                            entry_id = %entry.id,
                            email = %entry.item.email,
                            attempts = entry.attempts,
                            "Subscription dropped after reaching the attempt limit"
                        );
                        self.queue.complete(entry.id).await?;
                        summary.dropped += 1;
                    } else {
                        self.queue.requeue(entry).await?;
                        summary.requeued += 1;
                    }
                }
                QueueDisposition::SuspendQueue => {
                    let reason =
                        err.as_ref().map_or_else(|| "subscription queue suspended".to_string(), ToString::to_string);
                    self.queue.suspend(&truncate_reason(&reason)).await?;
                    summary.released += self.release(entry, &mut entries).await?;
                    summary.suspended = true;
                    break;
                }
            }
        }

        Ok(summary)
    }

    /// Hand back the failing entry and the never-attempted rest of its batch
    /// so they keep their place ahead of later arrivals.
    async fn release(
        &self,
        failed: QueuedSubscription,
        rest: impl Iterator<Item = QueuedSubscription>,
    ) -> Result<u32> {
        let rest: Vec<_> = rest.collect();
        let released = u32::try_from(rest.len()).unwrap_or(u32::MAX);
        let mut entries = Vec::with_capacity(rest.len() + 1);
        entries.push(failed);
        entries.extend(rest);
        self.queue.release(entries).await?;
        Ok(released)
    }

    /// Return entries claimed by an abandoned drain.
    async fn release_abandoned(&self) {
        match self.queue.release_claimed().await {
            Ok(0) => {}
            Ok(released) => debug!(released, "Released subscriptions claimed by the cancelled drain"),
            Err(e) => error!(error = %e, "Failed to release claimed subscriptions"),
        }
    }

    async fn drain(&self) -> Result<DrainSummary> {
        let deadline = Instant::now() + self.config.time_budget;
        let mut summary = DrainSummary::default();

        loop {
            let batch = self.process_batch().await?;
            summary.merge(batch);

            // Requeued entries are back in the queue; stop once a batch only
            // produced retries so they wait for the next drain.
            if batch.suspended || batch.succeeded + batch.dropped == 0 {
                break;
            }
            if Instant::now() >= deadline {
                debug!(budget_secs = self.config.time_budget.as_secs(), "Subscription drain reached its time budget");
                break;
            }
        }

        Ok(summary)
    }
}

/// Subscription queue worker with explicit lifecycle management.
pub struct SubscriptionQueueWorker {
    processor: Arc<Processor>,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl SubscriptionQueueWorker {
    /// Create a new worker with the given configuration.
    pub fn new(
        queue: Arc<dyn SubscriptionQueue>,
        forwarder: Arc<dyn SubscriptionForwarder>,
        config: SubscriptionWorkerConfig,
    ) -> Self {
        Self {
            processor: Arc::new(Processor { queue, forwarder, config }),
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    /// Attempt one item and decide what should happen to it.
    ///
    /// The queue is not touched; see [`Self::process_batch`] for that.
    pub async fn process_item(&self, item: &SubscriptionWorkItem) -> QueueDisposition {
        self.processor.process_item(item).await.0
    }

    /// Claim one batch and settle every entry in it.
    pub async fn process_batch(&self) -> Result<DrainSummary> {
        self.processor.process_batch().await
    }

    /// Process batches until the queue is empty, suspended, only retries
    /// remain, or the time budget is spent.
    pub async fn drain(&self) -> Result<DrainSummary> {
        self.processor.drain().await
    }

    /// Start the worker, spawning the background processing task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> std::result::Result<(), String> {
        if self.is_running() {
            return Err("Worker already running".to_string());
        }

        info!("Starting subscription queue worker");

        // Create fresh cancellation token
        self.cancellation = CancellationToken::new();

        let processor = Arc::clone(&self.processor);
        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::process_loop(processor, cancel).await;
        });

        self.task_handle = Some(handle);
        info!("Subscription queue worker started");
        Ok(())
    }

    /// Stop the worker and wait for the processing task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> std::result::Result<(), String> {
        if !self.is_running() {
            return Err("Worker not running".to_string());
        }

        info!("Stopping subscription queue worker");

        // Cancel background task
        self.cancellation.cancel();

        // Await join handle with timeout
        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.processor.config.join_timeout;
            match tokio::time::timeout(join_timeout, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Worker task panicked: {}", e);
                    return Err("Worker task panicked".to_string());
                }
                Err(_) => {
                    warn!("Worker task did not complete within timeout");
                    return Err("Worker task timeout".to_string());
                }
            }
        }

        info!("Subscription queue worker stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a worker instance is active.
    pub const fn is_running(&self) -> bool {
        self.task_handle.is_some()
    }

    /// Background processing loop.
    async fn process_loop(processor: Arc<Processor>, cancel: CancellationToken) {
        let poll_interval = processor.config.poll_interval;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Subscription worker process loop cancelled");
                    break;
                }
                () = tokio::time::sleep(poll_interval) => {
                    tokio::select! {
                        () = cancel.cancelled() => {
                            debug!("Subscription worker cancelled during drain");
                            processor.release_abandoned().await;
                            break;
                        }
                        result = processor.drain() => match result {
                            Ok(summary) if summary.attempted() > 0 || summary.suspended => {
                                info!(
                                    succeeded = summary.succeeded,
                                    dropped = summary.dropped,
                                    requeued = summary.requeued,
                                    suspended = summary.suspended,
                                    "Subscription drain completed"
                                );
                            }
                            Ok(_) => debug!("No queued subscriptions"),
                            Err(e) => error!(error = %e, "Subscription drain failed"),
                        }
                    }
                }
            }
        }
    }
}

fn truncate_reason(reason: &str) -> String {
    const MAX_LEN: usize = 256;
    if reason.len() <= MAX_LEN {
        return reason.to_string();
    }

    let mut truncated = reason.chars().take(MAX_LEN.saturating_sub(3)).collect::<String>();
    truncated.push_str("...");
    truncated
}

impl Drop for SubscriptionQueueWorker {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SubscriptionQueueWorker dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
