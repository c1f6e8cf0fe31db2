//! External service integrations

pub mod apsis;
