//! APSIS mailing-list integration
//!
//! # Architecture
//!
//! - **Client**: [`ApsisClient`] - domain operations (lists, subscribers,
//!   demographics) with allow-list filtering
//! - **Requests**: [`RequestClient`] - authenticated calls, failure
//!   classification and stale-on-error caching
//! - **Cache**: [`ResponseCache`] - local moka tier in front of a shared
//!   [`CacheStore`](apsis_core::CacheStore)
//! - **Wire**: response envelopes and id normalisation
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use apsis_domain::ApiSettings;
//! use apsis_infra::integrations::apsis::ApsisClient;
//!
//! # async fn example() -> apsis_domain::Result<()> {
//! let settings = ApiSettings {
//!     ssl: true,
//!     host: "se.api.anpdm.com".to_string(),
//!     api_key: "my-key".to_string(),
//!     allowed_mailing_lists: vec!["12345".to_string()],
//!     ..ApiSettings::default()
//! };
//! let client = ApsisClient::from_settings(Arc::new(settings))?;
//!
//! for list in client.allowed_mailing_lists().await? {
//!     println!("{}: {}", list.id, list.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - Service failures: classified into an `ErrorKind` and returned as
//!   `ApsisError::Service`
//! - Missing API key or host: reads return empty results, operations that
//!   need a response fail with `ApsisError::NotConfigured`
//! - Cached reads: a stale copy is returned instead of the error when one
//!   exists

pub mod cache;
pub mod client;
pub mod request;
pub mod wire;

pub use cache::{CacheStoreConfig, MemoryCacheStore, ResponseCache};
pub use client::ApsisClient;
pub use request::{basic_auth, ApiRequest, RequestBody, RequestClient};
