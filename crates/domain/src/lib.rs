//! # APSIS Domain
//!
//! Business types for the APSIS mailing-list client.
//!
//! This crate contains:
//! - The closed error taxonomy reported by the service ([`ErrorKind`])
//! - Domain error types and the `Result` alias
//! - API settings consumed by the request client
//! - Mailing list, demographic and subscription models
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only serialization and error-derive dependencies
//! - Pure data and lookup tables, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod taxonomy;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use taxonomy::*;
pub use types::*;
