//! Conversions from external infrastructure errors into domain errors.

use apsis_domain::{ApsisError, TransportFailure};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ApsisError);

impl From<InfraError> for ApsisError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ApsisError> for InfraError {
    fn from(value: ApsisError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoApsisError {
    fn into_apsis(self) -> ApsisError;
}

/// Turns a transport error into the unclassified failure fed to the mapper.
pub trait IntoTransportFailure {
    fn into_transport_failure(self) -> TransportFailure;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportFailure */
/* -------------------------------------------------------------------------- */

impl IntoTransportFailure for HttpError {
    fn into_transport_failure(self) -> TransportFailure {
        let description = if self.is_timeout() {
            "HTTP request timed out".to_string()
        } else if self.is_connect() {
            format!("HTTP connection failure: {self}")
        } else {
            self.to_string()
        };

        match self.status() {
            Some(status) => TransportFailure::http(status.as_u16(), None, description),
            None => TransportFailure::connection(description),
        }
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_apsis())
    }
}

impl IntoApsisError for HttpError {
    fn into_apsis(self) -> ApsisError {
        if self.is_builder() {
            return ApsisError::Config(format!("invalid HTTP client configuration: {self}"));
        }
        if self.is_decode() {
            return ApsisError::Decode(self.to_string());
        }
        ApsisError::Internal(self.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml / io → ApsisError */
/* -------------------------------------------------------------------------- */

impl IntoApsisError for serde_json::Error {
    fn into_apsis(self) -> ApsisError {
        ApsisError::Decode(format!("invalid JSON payload at line {}: {self}", self.line()))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        Self(value.into_apsis())
    }
}

impl IntoApsisError for toml::de::Error {
    fn into_apsis(self) -> ApsisError {
        ApsisError::Config(format!("invalid TOML configuration: {self}"))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        Self(value.into_apsis())
    }
}

impl IntoApsisError for std::io::Error {
    fn into_apsis(self) -> ApsisError {
        ApsisError::Config(format!("failed to read configuration: {self}"))
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        Self(value.into_apsis())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;

    use super::*;

    #[tokio::test]
    async fn connection_refused_has_no_status() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let failure = error.into_transport_failure();
        assert_eq!(failure.http_status, None);
        assert!(failure.body.is_none());
        assert!(!failure.description.is_empty());
    }

    #[test]
    fn json_errors_map_to_decode() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mapped: ApsisError = InfraError::from(err).into();
        assert!(matches!(mapped, ApsisError::Decode(_)));
    }

    #[test]
    fn toml_errors_map_to_config() {
        let err = toml::from_str::<toml::Table>("host = ").unwrap_err();
        let mapped: ApsisError = InfraError::from(err).into();
        match mapped {
            ApsisError::Config(msg) => assert!(msg.contains("TOML")),
            other => panic!("expected config error, got {other:?}"),
        }
    }
}
