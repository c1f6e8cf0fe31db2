//! Subscription requests, queued work and service responses.

use serde::{Deserialize, Serialize};

use super::demographics::DemographicValue;

/// Deferred "add subscriber" call.
///
/// Requeued items are value-equal to the original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionWorkItem {
    /// Subscriber address.
    pub email: String,
    /// Target mailing list.
    pub list_id: String,
    /// Display name.
    pub name: String,
    /// Resolved demographic answers.
    pub demographic_data: Vec<DemographicValue>,
}

impl SubscriptionWorkItem {
    /// Build an item for one list.
    pub fn new(
        email: impl Into<String>,
        list_id: impl Into<String>,
        name: impl Into<String>,
        demographic_data: Vec<DemographicValue>,
    ) -> Self {
        Self { email: email.into(), list_id: list_id.into(), name: name.into(), demographic_data }
    }
}

/// A subscriber asking to join one or more lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Subscriber address.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Requested mailing lists.
    pub list_ids: Vec<String>,
    /// Raw answers keyed by demographic field key.
    pub demographic_choices: Vec<(String, Option<String>)>,
}

/// Service answer to a subscriber upsert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionResponse {
    /// The envelope's `Result` member.
    pub result: serde_json::Value,
    /// Informational message, if any.
    pub message: Option<String>,
}
