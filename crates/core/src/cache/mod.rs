//! Response cache contracts.

pub mod ports;
