//! Demographic fields defined on the APSIS account.
//!
//! A field with no alternatives takes free text, a field with exactly one
//! alternative behaves like a checkbox that yields that alternative, and
//! anything else is a pick-one list. Callers render differently per
//! [`FieldKind`], and [`DemographicField::resolve`] turns a raw answer into
//! the value sent to the service.

use serde::{Deserialize, Serialize};

use crate::errors::{ApsisError, Result};

/// Demographic field as defined by the service, plus the local `required`
/// flag when it comes from the allow-list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemographicField {
    /// Field key.
    pub key: String,
    /// Position in the account's field list.
    pub index: i64,
    /// Allowed values; empty for free text.
    pub alternatives: Vec<String>,
    /// Subscribers must answer it.
    pub required: bool,
}

/// How a field is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FreeText,
    Boolean,
    MultiValued,
}

/// One `{Key, Value}` entry of the `DemDataFields` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DemographicValue {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: Option<String>,
}

impl DemographicField {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.alternatives.len() {
            0 => FieldKind::FreeText,
            1 => FieldKind::Boolean,
            _ => FieldKind::MultiValued,
        }
    }

    /// Convert a raw answer into the value sent to the service.
    ///
    /// Boolean fields treat `1`, `true`, `on` and `yes` as checked. Unchecked
    /// or empty answers yield no value, which is an error for required
    /// fields.
    pub fn resolve(&self, answer: Option<&str>) -> Result<DemographicValue> {
        let answer = answer.map(str::trim).filter(|a| !a.is_empty());

        let value = match (self.kind(), answer) {
            (_, None) => None,
            (FieldKind::FreeText, Some(text)) => Some(text.to_string()),
            (FieldKind::Boolean, Some(flag)) => {
                let checked = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes");
                self.alternatives.first().filter(|_| checked).cloned()
            }
            (FieldKind::MultiValued, Some(choice)) => {
                let alternative = self.alternatives.iter().find(|alt| alt.as_str() == choice).ok_or_else(|| {
                    ApsisError::InvalidInput(format!(
                        "'{choice}' is not an alternative of demographic field {}",
                        self.key
                    ))
                })?;
                Some(alternative.clone())
            }
        };

        if self.required && value.is_none() {
            return Err(ApsisError::InvalidInput(format!("demographic field {} is required", self.key)));
        }

        Ok(DemographicValue { key: self.key.clone(), value })
    }
}
