//! HTTP transport shared by the APSIS integration.

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
