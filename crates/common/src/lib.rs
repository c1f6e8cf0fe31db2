//! Shared utilities for the APSIS client workspace.
//!
//! Only cross-cutting pieces that have no domain meaning live here: the
//! clock abstraction used to decide cache freshness and field validators.

pub mod clock;
pub mod validation;

pub use clock::{Clock, MockClock, SystemClock};
pub use validation::{EmailValidator, FieldValidator};
