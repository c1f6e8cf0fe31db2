//! Deferred subscription processing
//!
//! - `SubscriptionService`: validates requests and enqueues work items
//! - `InMemorySubscriptionQueue`: in-process queue implementation
//! - `SubscriptionQueueWorker`: drains the queue with explicit lifecycle
//!   management, join handle tracking, and cancellation support

pub mod memory_queue;
pub mod subscription_worker;
pub mod subscriptions;

pub use memory_queue::InMemorySubscriptionQueue;
pub use subscription_worker::{
    DrainSummary, SubscriptionForwarder, SubscriptionQueueWorker, SubscriptionWorkerConfig,
};
pub use subscriptions::SubscriptionService;
