//! Error taxonomy reported by the APSIS service.
//!
//! APSIS signals failures with an HTTP status plus a service-specific error
//! code (the "state"). Several failures share a status, and two of them even
//! share the code: "no subscriber with this email" and "address is on the
//! opt-out list" both arrive as `400 / -2` and are only told apart by the
//! message text. [`ErrorKind`] is the closed set of outcomes and
//! [`KindDescriptor`] carries the data used to recognise each one.
//!
//! | Kind | HTTP | Code | Pattern |
//! |---|---|---|---|
//! | `Generic` | - | - | - |
//! | `ApiDisabled` | 503 | -6 | - |
//! | `BadRequest` | 503 | -7 | - |
//! | `Busy` | 503 | -5 | - |
//! | `InternalServerError` | 500 | -1 | - |
//! | `NotFound` | 404 | -3 | - |
//! | `Unauthorized` | 403 | -4 | - |
//! | `ValidationError` | 400 | -2 | - |
//! | `InvalidSubscriber` | 400 | -2 | `no subscriber with email` |
//! | `OptOutSubscriber` | 400 | -2 | `exists on the Opt-out` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every failure category the client distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Anything not recognised more precisely, including connection errors.
    Generic,
    /// API access is turned off for the account.
    ApiDisabled,
    /// The service rejected the request as malformed.
    BadRequest,
    /// The service is temporarily overloaded.
    Busy,
    /// The service failed while handling the request.
    InternalServerError,
    /// The addressed resource does not exist.
    NotFound,
    /// The API key was rejected.
    Unauthorized,
    /// A field failed server-side validation.
    ValidationError,
    /// Validation failure for an email the service does not know.
    InvalidSubscriber,
    /// Validation failure for an email on the account's opt-out list.
    OptOutSubscriber,
}

/// Recognition data for one [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    /// `Code` member of the service error body.
    pub service_code: Option<i32>,
    /// HTTP status the service answers with.
    pub http_status: Option<u16>,
    /// Regex matched against the service message.
    pub match_pattern: Option<&'static str>,
}

impl ErrorKind {
    /// All kinds, `Generic` first.
    pub const ALL: [Self; 10] = [
        Self::Generic,
        Self::ApiDisabled,
        Self::BadRequest,
        Self::Busy,
        Self::InternalServerError,
        Self::NotFound,
        Self::Unauthorized,
        Self::ValidationError,
        Self::InvalidSubscriber,
        Self::OptOutSubscriber,
    ];

    /// Look up the recognition data for this kind.
    #[must_use]
    pub const fn describe(self) -> KindDescriptor {
        let (service_code, http_status, match_pattern) = match self {
            Self::Generic => (None, None, None),
            Self::ApiDisabled => (Some(-6), Some(503), None),
            Self::BadRequest => (Some(-7), Some(503), None),
            Self::Busy => (Some(-5), Some(503), None),
            Self::InternalServerError => (Some(-1), Some(500), None),
            Self::NotFound => (Some(-3), Some(404), None),
            Self::Unauthorized => (Some(-4), Some(403), None),
            Self::ValidationError => (Some(-2), Some(400), None),
            Self::InvalidSubscriber => (Some(-2), Some(400), Some("no subscriber with email")),
            Self::OptOutSubscriber => (Some(-2), Some(400), Some("exists on the Opt-out")),
        };
        KindDescriptor { service_code, http_status, match_pattern }
    }

    /// Wire identifier, as used in configuration and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ApiDisabled => "api_disabled",
            Self::BadRequest => "bad_request",
            Self::Busy => "busy",
            Self::InternalServerError => "internal_server_error",
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::ValidationError => "validation_error",
            Self::InvalidSubscriber => "invalid_subscriber",
            Self::OptOutSubscriber => "opt_out_subscriber",
        }
    }

    /// The kind this one specialises. `Generic` has no parent.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Generic => None,
            Self::InvalidSubscriber | Self::OptOutSubscriber => Some(Self::ValidationError),
            _ => Some(Self::Generic),
        }
    }

    /// True when `self` is `other` or one of its specialisations.
    #[must_use]
    pub fn is_a(self, other: Self) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == other {
                return true;
            }
            current = kind.parent();
        }
        false
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a configuration names a kind that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);

impl FromStr for ErrorKind {
    type Err = UnknownErrorKind;

    /// Accepts the wire identifier (`opt_out_subscriber`) or the variant
    /// name (`OptOutSubscriber`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String =
            s.trim().chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().replace('_', "") == wanted)
            .ok_or_else(|| UnknownErrorKind(s.to_string()))
    }
}

/// `{Code, Message}` error body returned by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(rename = "Code", default)]
    pub code: Option<i32>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

/// A failed call as seen by the transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}")]
pub struct TransportFailure {
    /// Absent when no response was received.
    pub http_status: Option<u16>,
    /// Absent for connection errors or unparseable error bodies.
    pub body: Option<ServiceErrorBody>,
    /// Transport-level summary of the failure.
    pub description: String,
}

impl TransportFailure {
    /// A failure without any HTTP response.
    pub fn connection(description: impl Into<String>) -> Self {
        Self { http_status: None, body: None, description: description.into() }
    }

    /// A non-success HTTP response.
    pub fn http(status: u16, body: Option<ServiceErrorBody>, description: impl Into<String>) -> Self {
        Self { http_status: Some(status), body, description: description.into() }
    }

    #[must_use]
    pub fn service_code(&self) -> Option<i32> {
        self.body.as_ref().and_then(|body| body.code)
    }

    #[must_use]
    pub fn service_message(&self) -> Option<&str> {
        self.body.as_ref().and_then(|body| body.message.as_deref())
    }
}

/// A transport failure resolved to exactly one [`ErrorKind`].
///
/// The service message is kept verbatim; when the service sent none the
/// transport description is used instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    message: String,
    http_status: Option<u16>,
    #[source]
    cause: TransportFailure,
}

impl ClassifiedError {
    /// Wrap `cause` as `kind`, taking the service message when there is one.
    pub fn new(kind: ErrorKind, cause: TransportFailure) -> Self {
        let message = cause.service_message().map_or_else(|| cause.description.clone(), str::to_string);
        Self { kind, message, http_status: cause.http_status, cause }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    #[must_use]
    pub fn service_code(&self) -> Option<i32> {
        self.cause.service_code()
    }

    #[must_use]
    pub const fn cause(&self) -> &TransportFailure {
        &self.cause
    }

    /// True when the kind is `kind` or one of its specialisations.
    #[must_use]
    pub fn is_a(&self, kind: ErrorKind) -> bool {
        self.kind.is_a(kind)
    }
}
