//! Wire shapes of APSIS responses.
//!
//! Success bodies are wrapped in `{Result, Message?}`. Ids arrive as numbers
//! on most endpoints but are handled as strings everywhere else.

use std::fmt;

use apsis_domain::{
    ApsisError, DemographicField, MailingList, MailingListInfo, Result, SubscribedList, SubscriptionResponse,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::InfraError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(rename = "Result")]
    pub result: T,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

/// Numeric or textual id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MailingListRecord {
    #[serde(rename = "Id")]
    pub id: WireId,
    #[serde(rename = "Name", default)]
    pub name: String,
}

impl From<MailingListRecord> for MailingList {
    fn from(record: MailingListRecord) -> Self {
        Self { id: record.id.to_string(), name: record.name }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscribedListRecord {
    #[serde(rename = "Id")]
    pub id: WireId,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriberMailingLists {
    #[serde(rename = "Mailinglists", default)]
    pub mailinglists: Option<Vec<SubscribedListRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct DemographicRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Index")]
    pub index: i64,
    #[serde(rename = "Alternatives", default)]
    pub alternatives: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct Demographics {
    #[serde(rename = "Demographics", default)]
    pub demographics: Vec<DemographicRecord>,
}

fn decode<T: DeserializeOwned>(payload: Value, what: &str) -> Result<T> {
    serde_json::from_value(payload).map_err(|e| {
        let mapped: ApsisError = InfraError::from(e).into();
        ApsisError::Decode(format!("{what}: {mapped}"))
    })
}

/// Decode `POST /mailinglists/v2/all`.
pub fn mailing_lists(payload: Value) -> Result<Vec<MailingList>> {
    let envelope: Envelope<Vec<MailingListRecord>> = decode(payload, "mailing lists")?;
    Ok(envelope.result.into_iter().map(MailingList::from).collect())
}

/// Decode `GET /v1/mailinglists/{id}`, keeping the raw record.
pub fn mailing_list_info(payload: Value) -> Result<MailingListInfo> {
    let envelope: Envelope<Value> = decode(payload, "mailing list info")?;
    let record: MailingListRecord = decode(envelope.result.clone(), "mailing list info")?;
    Ok(MailingListInfo { id: record.id.to_string(), name: record.name, details: envelope.result })
}

/// Decode a subscriber id lookup.
pub fn subscriber_id(payload: Value) -> Result<String> {
    let envelope: Envelope<WireId> = decode(payload, "subscriber id")?;
    Ok(envelope.result.to_string())
}

/// Decode a subscriber's lists; a null result means none.
pub fn subscribed_lists(payload: Value) -> Result<Vec<SubscribedList>> {
    let envelope: Envelope<Option<SubscriberMailingLists>> = decode(payload, "subscriber mailing lists")?;
    Ok(envelope
        .result
        .and_then(|result| result.mailinglists)
        .unwrap_or_default()
        .into_iter()
        .map(|record| SubscribedList { id: record.id.to_string(), name: record.name })
        .collect())
}

/// Decode the account's demographic fields.
pub fn demographic_fields(payload: Value) -> Result<Vec<DemographicField>> {
    let envelope: Envelope<Demographics> = decode(payload, "demographics")?;
    Ok(envelope
        .result
        .demographics
        .into_iter()
        .map(|record| DemographicField {
            key: record.key,
            index: record.index,
            alternatives: record.alternatives.unwrap_or_default(),
            required: false,
        })
        .collect())
}

/// Decode the answer to a subscriber upsert.
pub fn subscription_response(payload: Value) -> Result<SubscriptionResponse> {
    let envelope: Envelope<Option<Value>> = decode(payload, "subscription response")?;
    Ok(SubscriptionResponse { result: envelope.result.unwrap_or(Value::Null), message: envelope.message })
}

/// `Result` member of an envelope, or `None` when absent or null.
pub fn result_value(payload: Value) -> Option<Value> {
    match payload {
        Value::Object(mut map) => map.remove("Result").filter(|value| !value.is_null()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_mailing_lists_in_service_order() {
        let lists = mailing_lists(json!({"Result": [{"Id": 3, "Name": "C"}, {"Id": "1", "Name": "A"}]})).unwrap();
        assert_eq!(
            lists,
            vec![MailingList { id: "3".into(), name: "C".into() }, MailingList { id: "1".into(), name: "A".into() }]
        );
    }

    #[test]
    fn subscribed_lists_tolerate_missing_result() {
        assert!(subscribed_lists(json!({"Result": null})).unwrap().is_empty());
        assert!(subscribed_lists(json!({"Result": {"Mailinglists": null}})).unwrap().is_empty());
        let lists = subscribed_lists(json!({"Result": {"Mailinglists": [{"Id": 42}]}})).unwrap();
        assert_eq!(lists, vec![SubscribedList { id: "42".into(), name: None }]);
    }

    #[test]
    fn demographics_default_to_free_text() {
        let fields = demographic_fields(json!({"Result": {"Demographics": [
            {"Key": "City", "Index": 1, "Alternatives": null},
            {"Key": "Size", "Index": 2, "Alternatives": ["S", "M"]}
        ]}}))
        .unwrap();
        assert!(fields[0].alternatives.is_empty());
        assert_eq!(fields[1].alternatives, vec!["S", "M"]);
    }

    #[test]
    fn malformed_payload_is_decode_error() {
        assert!(matches!(subscriber_id(json!({"Nope": 1})), Err(ApsisError::Decode(_))));
    }

    #[test]
    fn mailing_list_info_keeps_details() {
        let info = mailing_list_info(json!({"Result": {"Id": 42, "Name": "News", "FolderID": 7}})).unwrap();
        assert_eq!(info.name, "News");
        assert_eq!(info.details["FolderID"], json!(7));
    }
}
