//! API settings consumed by the request client and facade.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Connection and filtering settings for the APSIS API.
///
/// The API key is never serialized back out.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApiSettings {
    /// Use HTTPS.
    pub ssl: bool,
    /// Host name, optionally followed by a base path (`se.api.anpdm.com`).
    pub host: String,
    /// Only honoured when `ssl` is set.
    pub port: Option<u16>,
    /// Basic-auth user name; the password is empty.
    #[serde(skip_serializing)]
    pub api_key: String,
    /// Mailing list ids offered to subscribers. Empty means none.
    pub allowed_mailing_lists: Vec<String>,
    /// Demographic fields offered to subscribers.
    pub demographics: Vec<DemographicSetting>,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
}

/// Per-field demographic exposure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DemographicSetting {
    /// Service-side field key.
    pub key: String,
    /// Offer the field to subscribers.
    pub available: bool,
    /// Subscribers must answer it.
    pub required: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            ssl: false,
            host: String::new(),
            port: None,
            api_key: String::new(),
            allowed_mailing_lists: Vec::new(),
            demographics: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiSettings {
    /// Both key and host are needed before any request is attempted.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.host.trim().is_empty()
    }

    /// Protocol, host and (for SSL only) port, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        let protocol = if self.ssl { "https://" } else { "http://" };
        let host = self.host.trim().trim_end_matches('/');
        match self.port {
            Some(port) if self.ssl => format!("{protocol}{host}:{port}"),
            _ => format!("{protocol}{host}"),
        }
    }

    /// Configured demographic settings that are exposed to subscribers.
    pub fn available_demographics(&self) -> impl Iterator<Item = &DemographicSetting> {
        self.demographics.iter().filter(|setting| setting.available)
    }
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("ssl", &self.ssl)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("allowed_mailing_lists", &self.allowed_mailing_lists)
            .field("demographics", &self.demographics)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(ssl: bool, port: Option<u16>) -> ApiSettings {
        ApiSettings {
            ssl,
            host: "se.api.anpdm.com".into(),
            port,
            api_key: "secret".into(),
            ..ApiSettings::default()
        }
    }

    #[test]
    fn port_is_only_used_with_ssl() {
        assert_eq!(settings(true, Some(8443)).base_url(), "https://se.api.anpdm.com:8443");
        assert_eq!(settings(false, Some(8443)).base_url(), "http://se.api.anpdm.com");
        assert_eq!(settings(true, None).base_url(), "https://se.api.anpdm.com");
    }

    #[test]
    fn requires_key_and_host() {
        assert!(settings(true, None).is_configured());
        assert!(!ApiSettings { api_key: String::new(), ..settings(true, None) }.is_configured());
        assert!(!ApiSettings { host: "  ".into(), ..settings(true, None) }.is_configured());
    }

    #[test]
    fn api_key_is_not_serialized_or_printed() {
        let settings = settings(true, None);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
        assert!(!format!("{settings:?}").contains("secret"));
    }

    #[test]
    fn filters_unavailable_demographics() {
        let settings = ApiSettings {
            demographics: vec![
                DemographicSetting { key: "City".into(), available: true, required: false },
                DemographicSetting { key: "Age".into(), available: false, required: true },
            ],
            ..ApiSettings::default()
        };
        let keys: Vec<_> = settings.available_demographics().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["City"]);
    }
}
