//! # APSIS Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP transport and the APSIS request client
//! - Two-tier response cache (moka)
//! - Subscription queue, enqueue service and worker
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `apsis-core`
//! - Depends on `apsis-common`, `apsis-domain` and `apsis-core`
//! - Contains all "impure" code (network, environment, background tasks)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;
pub mod sync;

// Re-export commonly used items
pub use errors::{InfraError, IntoTransportFailure};
pub use http::{HttpClient, HttpClientBuilder};
pub use integrations::apsis::{ApsisClient, MemoryCacheStore, RequestClient, ResponseCache};
pub use observability::{init_tracing, LogFormat};
pub use sync::{InMemorySubscriptionQueue, SubscriptionQueueWorker, SubscriptionService, SubscriptionWorkerConfig};
