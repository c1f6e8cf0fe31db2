//! APSIS domain operations.
//!
//! Reads of list, subscriber-id and demographic data go through the response
//! cache. Subscription state and writes always hit the service. Allow-lists
//! from [`ApiSettings`](apsis_domain::ApiSettings) filter what callers see.

use std::collections::HashSet;
use std::sync::Arc;

use apsis_core::{ExceptionMapper, SettingsProvider};
use apsis_domain::{
    ApsisError, DemographicField, DemographicValue, ErrorKind, MailingList, MailingListInfo, Result,
    SubscribedList, SubscriptionResponse,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::cache::{MemoryCacheStore, ResponseCache};
use super::request::{ApiRequest, RequestClient};
use super::wire;
use crate::http::HttpClient;

/// High-level APSIS client.
pub struct ApsisClient {
    requests: RequestClient,
}

impl ApsisClient {
    /// Facade over an assembled request client.
    pub const fn new(requests: RequestClient) -> Self {
        Self { requests }
    }

    /// Client with the default transport, every error kind registered and an
    /// in-memory cache store.
    pub fn from_settings(settings: Arc<dyn SettingsProvider>) -> Result<Self> {
        let timeout = std::time::Duration::from_secs(settings.settings().request_timeout_secs);
        let http = HttpClient::builder().timeout(timeout).build()?;
        let mapper = Arc::new(ExceptionMapper::with_default_kinds()?);
        let cache = ResponseCache::new(Arc::new(MemoryCacheStore::default()));
        Ok(Self::new(RequestClient::new(http, settings, mapper, cache)))
    }

    /// The underlying request client.
    pub const fn requests(&self) -> &RequestClient {
        &self.requests
    }

    /// All mailing lists on the account, in service order.
    pub async fn mailing_lists(&self) -> Result<Vec<MailingList>> {
        match self.requests.cached_request(&ApiRequest::post("/mailinglists/v2/all")).await? {
            Some(payload) => wire::mailing_lists(payload),
            None => Ok(Vec::new()),
        }
    }

    /// Mailing lists that are both on the account and in the configured
    /// allow-list. Nothing is fetched when the allow-list is empty.
    pub async fn allowed_mailing_lists(&self) -> Result<Vec<MailingList>> {
        let allowed: HashSet<String> = self.requests.settings().settings().allowed_mailing_lists.into_iter().collect();
        if allowed.is_empty() {
            return Ok(Vec::new());
        }

        let lists = self.mailing_lists().await?;
        Ok(lists.into_iter().filter(|list| allowed.contains(&list.id)).collect())
    }

    /// Metadata for one list. Fails with `InvalidInput` for an empty id.
    pub async fn mailing_list_info(&self, list_id: &str) -> Result<MailingListInfo> {
        let list_id = non_empty(list_id, "mailing list id")?;
        let payload = self
            .requests
            .cached_request(&ApiRequest::get(format!("/v1/mailinglists/{list_id}")))
            .await?
            .ok_or(ApsisError::NotConfigured)?;
        wire::mailing_list_info(payload)
    }

    /// Resolve the subscriber id for `email`.
    ///
    /// Fails with `InvalidSubscriber` when the address is unknown.
    pub async fn subscriber_id_by_email(&self, email: &str) -> Result<String> {
        let email = non_empty(email, "email")?;
        let payload = self
            .requests
            .cached_request(&ApiRequest::post("/subscribers/v2/email").with_json(json!(email)))
            .await?
            .ok_or(ApsisError::NotConfigured)?;
        wire::subscriber_id(payload)
    }

    /// Like [`Self::subscriber_id_by_email`], but an unknown address is `None`.
    pub async fn existing_subscriber_id(&self, email: &str) -> Result<Option<String>> {
        match self.subscriber_id_by_email(email).await {
            Ok(id) => Ok(Some(id)),
            Err(e) if e.is_kind(ErrorKind::InvalidSubscriber) || e.is_kind(ErrorKind::NotFound) => {
                debug!(email, "No existing APSIS subscriber");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Lists the subscriber is on right now (never cached).
    pub async fn subscriber_mailing_lists(&self, subscriber_id: &str) -> Result<Vec<SubscribedList>> {
        let subscriber_id = non_empty(subscriber_id, "subscriber id")?;
        match self.requests.request(&ApiRequest::get(format!("/v1/subscribers/{subscriber_id}/mailinglists"))).await? {
            Some(payload) => wire::subscribed_lists(payload),
            None => Ok(Vec::new()),
        }
    }

    /// Full subscriber record for `email` (never cached).
    pub async fn subscriber_info_by_email(&self, email: &str) -> Result<Option<Value>> {
        let id = self.subscriber_id_by_email(email).await?;
        let payload = self.requests.request(&ApiRequest::get(format!("/v1/subscribers/id/{id}"))).await?;
        Ok(payload.and_then(wire::result_value))
    }

    /// Subscriber listing of one mailing list, with all demographics.
    pub async fn subscribers(&self, list_id: &str) -> Result<Option<Value>> {
        let list_id = non_empty(list_id, "mailing list id")?;
        let request = ApiRequest::post(format!("/v1/mailinglists/{list_id}/subscribers/all"))
            .with_json(json!({"AllDemographics": true}));
        self.requests.cached_request(&request).await
    }

    /// True when `email` is currently subscribed to `list_id`.
    pub async fn is_subscribed(&self, email: &str, list_id: &str) -> Result<bool> {
        Ok(self.missing_subscriptions(email, &[list_id.to_string()]).await?.is_empty())
    }

    /// The subset of `list_ids` that `email` is not yet subscribed to.
    pub async fn missing_subscriptions(&self, email: &str, list_ids: &[String]) -> Result<Vec<String>> {
        let Some(subscriber_id) = self.existing_subscriber_id(email).await? else {
            return Ok(list_ids.to_vec());
        };

        let current: HashSet<String> =
            self.subscriber_mailing_lists(&subscriber_id).await?.into_iter().map(|list| list.id).collect();
        Ok(list_ids.iter().filter(|id| !current.contains(*id)).cloned().collect())
    }

    /// Create or update a subscriber on a list.
    pub async fn add_subscriber(
        &self,
        list_id: &str,
        email: &str,
        name: &str,
        demographic_data: &[DemographicValue],
    ) -> Result<SubscriptionResponse> {
        let list_id = non_empty(list_id, "mailing list id")?;
        let email = non_empty(email, "email")?;
        let list = self.mailing_list_info(list_id).await?;

        let request = ApiRequest::post(format!("/v1/subscribers/mailinglist/{list_id}/create?updateIfExists=true"))
            .with_json(json!({
                "Email": email,
                "Name": name,
                "DemDataFields": demographic_data,
            }));
        let payload = self.requests.request(&request).await?.ok_or(ApsisError::NotConfigured)?;
        let response = wire::subscription_response(payload)?;

        info!(subscriber_name = name, email, list = %list.name, list_id, "Subscriber added to mailing list");
        Ok(response)
    }

    /// Remove `email` from a list.
    ///
    /// An unknown address has nothing to remove and yields `Ok(None)`.
    pub async fn delete_subscriber(&self, list_id: &str, email: &str) -> Result<Option<Value>> {
        let list_id = non_empty(list_id, "mailing list id")?;
        let Some(subscriber_id) = self.existing_subscriber_id(email).await? else {
            return Ok(None);
        };
        let list = self.mailing_list_info(list_id).await?;

        let response = self
            .requests
            .request(&ApiRequest::delete(format!("/v1/mailinglists/{list_id}/subscriptions/{subscriber_id}")))
            .await?;

        info!(email, list = %list.name, list_id, "Subscriber removed from mailing list");
        Ok(response)
    }

    /// Every demographic field defined on the account.
    pub async fn demographic_fields(&self) -> Result<Vec<DemographicField>> {
        match self.requests.cached_request(&ApiRequest::get("/accounts/v2/demographics")).await? {
            Some(payload) => wire::demographic_fields(payload),
            None => Ok(Vec::new()),
        }
    }

    /// Demographic fields marked available in settings, in settings order,
    /// with the configured `required` flag.
    pub async fn allowed_demographic_fields(&self) -> Result<Vec<DemographicField>> {
        let settings = self.requests.settings().settings();
        if settings.available_demographics().next().is_none() {
            return Ok(Vec::new());
        }

        let fields = self.demographic_fields().await?;
        let mut allowed = Vec::new();
        for setting in settings.available_demographics() {
            match fields.iter().find(|field| field.key == setting.key) {
                Some(field) => allowed.push(DemographicField { required: setting.required, ..field.clone() }),
                None => warn!(key = %setting.key, "Configured demographic field is not defined on the account"),
            }
        }
        Ok(allowed)
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApsisError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}
