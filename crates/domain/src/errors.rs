//! Error types used throughout the client

use thiserror::Error;

use crate::taxonomy::{ClassifiedError, ErrorKind};

/// Main error type for the APSIS client
#[derive(Error, Debug)]
pub enum ApsisError {
    /// The service (or the transport on its way there) reported a failure.
    #[error(transparent)]
    Service(#[from] ClassifiedError),

    /// API key or host is missing, so no request was made.
    #[error("APSIS API is not configured")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApsisError {
    /// Kind of the underlying service failure, if this is one.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Service(error) => Some(error.kind()),
            _ => None,
        }
    }

    /// True for service failures of `kind` or one of its specialisations.
    #[must_use]
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind().is_some_and(|own| own.is_a(kind))
    }

    #[must_use]
    pub const fn as_classified(&self) -> Option<&ClassifiedError> {
        match self {
            Self::Service(error) => Some(error),
            _ => None,
        }
    }
}

/// Result type alias for APSIS client operations
pub type Result<T> = std::result::Result<T, ApsisError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{ServiceErrorBody, TransportFailure};

    fn opt_out() -> ApsisError {
        let body = ServiceErrorBody {
            code: Some(-2),
            message: Some("Subscriber with e-mail a@b.com exists on the Opt-out List.".into()),
        };
        ClassifiedError::new(ErrorKind::OptOutSubscriber, TransportFailure::http(400, Some(body), "HTTP 400"))
            .into()
    }

    #[test]
    fn service_errors_expose_their_kind() {
        let error = opt_out();
        assert_eq!(error.kind(), Some(ErrorKind::OptOutSubscriber));
        assert!(error.is_kind(ErrorKind::ValidationError));
        assert!(!error.is_kind(ErrorKind::Busy));
        assert_eq!(error.to_string(), "Subscriber with e-mail a@b.com exists on the Opt-out List.");
    }

    #[test]
    fn local_errors_have_no_kind() {
        assert_eq!(ApsisError::NotConfigured.kind(), None);
        assert!(!ApsisError::Decode("bad".into()).is_kind(ErrorKind::Generic));
        assert!(ApsisError::Queue("closed".into()).as_classified().is_none());
    }
}
