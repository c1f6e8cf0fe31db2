//! # APSIS Core
//!
//! Pure client logic - no HTTP, storage, or runtime code.
//!
//! This crate contains:
//! - The failure classifier ([`ExceptionMapper`])
//! - The per-kind queue policy ([`QueueDisposition`])
//! - Port interfaces (traits) for the cache store, settings and work queue
//!
//! ## Architecture Principles
//! - Depends only on `apsis-common` and `apsis-domain`
//! - All external collaborators via traits
//! - Pure, testable business logic

pub mod cache;
pub mod classification;
pub mod settings_ports;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use cache::ports::{CacheEntry, CacheStore};
pub use classification::{ClassificationStrategy, ExceptionMapper, DEFAULT_KINDS};
pub use settings_ports::SettingsProvider;
pub use sync::policy::{DropSeverity, QueueDisposition};
pub use sync::ports::{QueuedSubscription, SubscriptionQueue};
