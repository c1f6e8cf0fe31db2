//! Failure classification.
//!
//! Turns raw transport failures into one [`apsis_domain::ErrorKind`].

pub mod mapper;

pub use mapper::{ClassificationStrategy, ExceptionMapper, DEFAULT_KINDS};
