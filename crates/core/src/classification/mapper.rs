//! Prioritised failure classifier.
//!
//! # Architecture
//!
//! Classification runs a fixed chain of strategies. Each one proposes zero
//! or more registered kinds, and the first strategy with any candidate
//! decides. Within a strategy the earliest registered candidate wins.
//!
//! 1. [`ClassificationStrategy::MessageMatch`]: kinds with a match pattern
//!    whose pattern matches the service message.
//! 2. [`ClassificationStrategy::CodeStatus`]: kinds without a pattern whose
//!    `(http status, service code)` equals the observed pair.
//! 3. [`ClassificationStrategy::Fallback`]: `Generic`.
//!
//! Pattern kinds are left out of step 2 because they share their pair with
//! `ValidationError`. An opt-out message therefore beats `400 / -2`, and a
//! `400 / -2` whose message matches no pattern only maps to
//! `ValidationError` when that kind is registered.
//!
//! Registration is validated up front: `Generic` (always the fallback),
//! duplicates and two pattern-less kinds claiming the same pair are
//! configuration errors.
//!
//! # Example
//!
//! ```
//! use apsis_core::ExceptionMapper;
//! use apsis_domain::{ErrorKind, ServiceErrorBody, TransportFailure};
//!
//! let mapper = ExceptionMapper::with_default_kinds()?;
//! let body = ServiceErrorBody { code: Some(-5), message: Some("Server busy".into()) };
//! let error = mapper.classify(&TransportFailure::http(503, Some(body), "HTTP 503"));
//! assert_eq!(error.kind(), ErrorKind::Busy);
//! # Ok::<(), apsis_domain::ApsisError>(())
//! ```

use apsis_domain::{ApsisError, ClassifiedError, ErrorKind, Result, TransportFailure};
use regex::Regex;
use tracing::debug;

/// Kinds registered by [`ExceptionMapper::with_default_kinds`], in
/// registration order.
pub const DEFAULT_KINDS: [ErrorKind; 9] = [
    ErrorKind::OptOutSubscriber,
    ErrorKind::InvalidSubscriber,
    ErrorKind::ApiDisabled,
    ErrorKind::BadRequest,
    ErrorKind::Busy,
    ErrorKind::InternalServerError,
    ErrorKind::NotFound,
    ErrorKind::Unauthorized,
    ErrorKind::ValidationError,
];

/// Classification steps, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationStrategy {
    /// Match the service message against each kind's pattern.
    MessageMatch,
    /// Match service code and HTTP status for kinds without a pattern.
    CodeStatus,
    /// Fall back to [`ErrorKind::Generic`].
    Fallback,
}

impl ClassificationStrategy {
    /// Steps in the order they are tried.
    pub const CHAIN: [Self; 3] = [Self::MessageMatch, Self::CodeStatus, Self::Fallback];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MessageMatch => "message_match",
            Self::CodeStatus => "code_status",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
struct RegisteredKind {
    kind: ErrorKind,
    pattern: Option<Regex>,
}

/// Maps transport failures to registered [`ErrorKind`]s.
#[derive(Debug, Clone, Default)]
pub struct ExceptionMapper {
    registered: Vec<RegisteredKind>,
}

impl ExceptionMapper {
    /// Empty mapper: everything classifies as `Generic`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapper with every specific kind registered.
    pub fn with_default_kinds() -> Result<Self> {
        Self::with_kinds(DEFAULT_KINDS)
    }

    /// Mapper with `kinds` registered in iteration order.
    pub fn with_kinds(kinds: impl IntoIterator<Item = ErrorKind>) -> Result<Self> {
        let mut mapper = Self::new();
        for kind in kinds {
            mapper.register(kind)?;
        }
        Ok(mapper)
    }

    /// Register a kind by its configuration name (`busy`, `OptOutSubscriber`).
    pub fn register_named(&mut self, name: &str) -> Result<()> {
        let kind = name.parse::<ErrorKind>().map_err(|e| ApsisError::Config(e.to_string()))?;
        self.register(kind)
    }

    /// Register a kind. Later registrations lose ties.
    pub fn register(&mut self, kind: ErrorKind) -> Result<()> {
        if kind == ErrorKind::Generic {
            return Err(ApsisError::Config(
                "generic is the fallback kind and cannot be registered".to_string(),
            ));
        }
        if self.registered.iter().any(|registered| registered.kind == kind) {
            return Err(ApsisError::Config(format!("error kind {kind} is already registered")));
        }

        let descriptor = kind.describe();
        let pattern = match descriptor.match_pattern {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                ApsisError::Config(format!("invalid match pattern for {kind}: {e}"))
            })?),
            None => {
                let pair = (descriptor.http_status, descriptor.service_code);
                if let Some(clash) = self.registered.iter().find(|registered| {
                    let other = registered.kind.describe();
                    registered.pattern.is_none() && (other.http_status, other.service_code) == pair
                }) {
                    return Err(ApsisError::Config(format!(
                        "error kinds {} and {kind} share the same status and code",
                        clash.kind
                    )));
                }
                None
            }
        };

        self.registered.push(RegisteredKind { kind, pattern });
        Ok(())
    }

    /// Registered kinds in registration order.
    pub fn registered_kinds(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        self.registered.iter().map(|registered| registered.kind)
    }

    /// Resolve `failure` to exactly one kind.
    #[must_use]
    pub fn classify(&self, failure: &TransportFailure) -> ClassifiedError {
        let (strategy, kind) = ClassificationStrategy::CHAIN
            .into_iter()
            .find_map(|strategy| {
                self.candidates(strategy, failure).into_iter().next().map(|kind| (strategy, kind))
            })
            .unwrap_or((ClassificationStrategy::Fallback, ErrorKind::Generic));

        debug!(
            kind = %kind,
            strategy = strategy.as_str(),
            http_status = ?failure.http_status,
            service_code = ?failure.service_code(),
            "Classified APSIS failure"
        );

        ClassifiedError::new(kind, failure.clone())
    }

    fn candidates(&self, strategy: ClassificationStrategy, failure: &TransportFailure) -> Vec<ErrorKind> {
        match strategy {
            ClassificationStrategy::MessageMatch => {
                let Some(message) = failure.service_message() else {
                    return Vec::new();
                };
                self.registered
                    .iter()
                    .filter(|registered| {
                        registered.pattern.as_ref().is_some_and(|pattern| pattern.is_match(message))
                    })
                    .map(|registered| registered.kind)
                    .collect()
            }
            ClassificationStrategy::CodeStatus => {
                let (Some(status), Some(code)) = (failure.http_status, failure.service_code()) else {
                    return Vec::new();
                };
                self.registered
                    .iter()
                    .filter(|registered| {
                        let descriptor = registered.kind.describe();
                        registered.pattern.is_none()
                            && descriptor.http_status == Some(status)
                            && descriptor.service_code == Some(code)
                    })
                    .map(|registered| registered.kind)
                    .collect()
            }
            ClassificationStrategy::Fallback => vec![ErrorKind::Generic],
        }
    }
}
