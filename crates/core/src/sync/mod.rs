//! Deferred subscription processing: queue port and retry policy.

pub mod policy;
pub mod ports;
