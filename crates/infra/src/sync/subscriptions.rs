//! Enqueue side of deferred subscriptions.

use std::collections::HashMap;
use std::sync::Arc;

use apsis_common::{EmailValidator, FieldValidator};
use apsis_core::{QueuedSubscription, SubscriptionQueue};
use apsis_domain::{ApsisError, DemographicValue, Result, SubscriptionRequest, SubscriptionWorkItem};
use tracing::{debug, info};

use crate::integrations::apsis::ApsisClient;

/// Turns a subscriber's request into queued work items.
pub struct SubscriptionService {
    client: Arc<ApsisClient>,
    queue: Arc<dyn SubscriptionQueue>,
}

impl SubscriptionService {
    /// Service enqueueing onto `queue`.
    pub fn new(client: Arc<ApsisClient>, queue: Arc<dyn SubscriptionQueue>) -> Self {
        Self { client, queue }
    }

    /// Validate `request`, resolve its demographic answers and enqueue one
    /// item per requested list the address is not already on.
    ///
    /// # Errors
    /// `InvalidInput` for a malformed address, an empty or disallowed list
    /// selection, or an unacceptable demographic answer. Lookup failures are
    /// returned as-is and nothing is enqueued.
    pub async fn subscribe(&self, request: &SubscriptionRequest) -> Result<Vec<QueuedSubscription>> {
        let email = validate_email(&request.email)?;
        self.check_lists(&request.list_ids)?;
        let demographic_data = self.resolve_demographics(&request.demographic_choices).await?;

        let missing = self.client.missing_subscriptions(email, &request.list_ids).await?;
        if missing.is_empty() {
            debug!(email, "Already subscribed to every requested list");
            return Ok(Vec::new());
        }

        let mut queued = Vec::with_capacity(missing.len());
        for list_id in missing {
            let item = SubscriptionWorkItem::new(email, list_id, request.name.trim(), demographic_data.clone());
            queued.push(self.queue.enqueue(item).await?);
        }

        info!(email, lists = queued.len(), "Subscription queued");
        Ok(queued)
    }

    fn check_lists(&self, list_ids: &[String]) -> Result<()> {
        if list_ids.is_empty() {
            return Err(ApsisError::InvalidInput("at least one mailing list must be selected".to_string()));
        }

        let allowed = self.client.requests().settings().settings().allowed_mailing_lists;
        match list_ids.iter().find(|id| !allowed.contains(*id)) {
            Some(id) => Err(ApsisError::InvalidInput(format!("mailing list {id} is not offered"))),
            None => Ok(()),
        }
    }

    async fn resolve_demographics(&self, choices: &[(String, Option<String>)]) -> Result<Vec<DemographicValue>> {
        let answers: HashMap<&str, Option<&str>> =
            choices.iter().map(|(key, value)| (key.as_str(), value.as_deref())).collect();

        let fields = self.client.allowed_demographic_fields().await?;
        for key in answers.keys().filter(|key| !fields.iter().any(|field| field.key == **key)) {
            debug!(key, "Ignoring answer for a demographic field that is not offered");
        }

        fields.iter().map(|field| field.resolve(answers.get(field.key.as_str()).copied().flatten())).collect()
    }
}

fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    EmailValidator::new()
        .validate(email)
        .map_err(|reason| ApsisError::InvalidInput(format!("'{email}' is not a valid email address: {reason}")))?;
    Ok(email)
}
