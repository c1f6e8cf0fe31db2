//! Mailing list projections.

use serde::{Deserialize, Serialize};

/// A mailing list as listed by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MailingList {
    /// Service id, as a string.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Metadata for a single mailing list.
///
/// `details` keeps the full service record for fields this crate does not
/// model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailingListInfo {
    /// Service id, as a string.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Full service record.
    pub details: serde_json::Value,
}

/// A list a subscriber is currently on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscribedList {
    /// Service id, as a string.
    pub id: String,
    /// Display name when the service includes it.
    pub name: Option<String>,
}
