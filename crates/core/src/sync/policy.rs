//! What the queue worker does with an item after one attempt.
//!
//! | Outcome | Disposition |
//! |---|---|
//! | success | `Succeeded` |
//! | `OptOutSubscriber` | `Dropped` (notice) |
//! | `ValidationError`, `InvalidSubscriber` | `Dropped` (error) |
//! | `ApiDisabled`, `Busy`, `Unauthorized` | `SuspendQueue` |
//! | any other kind, including `Generic` | `Requeue` |
//!
//! Local errors map onto the same outcomes: missing configuration suspends
//! the queue like a credential failure, invalid input is dropped like a
//! validation failure, and anything else is retried.

use apsis_domain::{ApsisError, ErrorKind};

/// Log severity for dropped items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSeverity {
    Notice,
    Error,
}

/// Decision for one processed work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDisposition {
    /// Delivered; discard the item.
    Succeeded,
    /// Will never succeed; discard the item.
    Dropped(DropSeverity),
    /// Systemic failure; keep the item and halt the queue.
    SuspendQueue,
    /// Transient failure; retry the item later.
    Requeue,
}

impl QueueDisposition {
    /// Decide based on the outcome of the subscriber upsert.
    pub fn for_outcome<T>(outcome: &Result<T, ApsisError>) -> Self {
        outcome.as_ref().map_or_else(Self::for_error, |_| Self::Succeeded)
    }

    #[must_use]
    pub fn for_error(error: &ApsisError) -> Self {
        match error {
            ApsisError::Service(classified) => Self::for_kind(classified.kind()),
            ApsisError::NotConfigured | ApsisError::Config(_) => Self::SuspendQueue,
            ApsisError::InvalidInput(_) => Self::Dropped(DropSeverity::Error),
            ApsisError::Decode(_) | ApsisError::Queue(_) | ApsisError::Internal(_) => Self::Requeue,
        }
    }

    #[must_use]
    pub fn for_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::OptOutSubscriber => Self::Dropped(DropSeverity::Notice),
            ErrorKind::ValidationError | ErrorKind::InvalidSubscriber => Self::Dropped(DropSeverity::Error),
            ErrorKind::ApiDisabled | ErrorKind::Busy | ErrorKind::Unauthorized => Self::SuspendQueue,
            ErrorKind::Generic
            | ErrorKind::BadRequest
            | ErrorKind::InternalServerError
            | ErrorKind::NotFound => Self::Requeue,
        }
    }

    /// True when the item leaves the queue for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Dropped(_))
    }
}
