//! Conversions from third-party errors into client errors.

pub mod conversions;

pub use conversions::{InfraError, IntoTransportFailure};
