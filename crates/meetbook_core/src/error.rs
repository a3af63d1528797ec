//! Engine error taxonomy.
//!
//! # Responsibility
//! - Describe every way a contact/meeting operation can be refused.
//! - Map each refusal onto one coarse [`ErrorKind`] callers can branch on.
//!
//! # Invariants
//! - Every `ManagerError` variant maps to exactly one `ErrorKind`.
//! - Plain id lookups report absence as `Ok(None)`, never as an error.

use crate::model::ids::{ContactId, EntityId, MeetingId};
use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Coarse error classes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was absent (as opposed to empty).
    NullArgument,
    /// An argument was present but semantically unacceptable.
    InvalidArgument,
    /// The call was well formed but forbidden in the current temporal state.
    IllegalState,
}

/// Errors returned by the contact store, meeting repository and engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    /// Required argument was not supplied.
    MissingArgument(&'static str),
    /// Contact is not a member of the contact store.
    UnknownContact(ContactId),
    /// Meeting requires at least one contact.
    EmptyContactSet,
    /// Future meeting date is not strictly after now.
    DateNotInFuture {
        date: DateTime<Utc>,
        now: DateTime<Utc>,
    },
    /// No meeting has this id.
    MeetingNotFound(MeetingId),
    /// Meeting is classified as future, but a past meeting was requested.
    NotPastMeeting(MeetingId),
    /// Meeting is classified as past, but a future meeting was requested.
    NotFutureMeeting(MeetingId),
    /// Notes were added to a future meeting whose date has not passed yet.
    MeetingNotYetOccurred {
        id: MeetingId,
        date: DateTime<Utc>,
    },
    /// Same id used by two entities in one snapshot.
    DuplicateId(EntityId),
    /// Snapshot content violates an engine invariant.
    InvalidSnapshot(String),
    /// Every id up to `EntityId::MAX` has been issued or loaded.
    IdSpaceExhausted,
}

impl ManagerError {
    /// Returns the coarse class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument(_) => ErrorKind::NullArgument,
            Self::MeetingNotYetOccurred { .. } => ErrorKind::IllegalState,
            Self::UnknownContact(_)
            | Self::EmptyContactSet
            | Self::DateNotInFuture { .. }
            | Self::MeetingNotFound(_)
            | Self::NotPastMeeting(_)
            | Self::NotFutureMeeting(_)
            | Self::DuplicateId(_)
            | Self::InvalidSnapshot(_)
            | Self::IdSpaceExhausted => ErrorKind::InvalidArgument,
        }
    }

    /// Stable short code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingArgument(_) => "missing_argument",
            Self::UnknownContact(_) => "unknown_contact",
            Self::EmptyContactSet => "empty_contact_set",
            Self::DateNotInFuture { .. } => "date_not_in_future",
            Self::MeetingNotFound(_) => "meeting_not_found",
            Self::NotPastMeeting(_) => "not_past_meeting",
            Self::NotFutureMeeting(_) => "not_future_meeting",
            Self::MeetingNotYetOccurred { .. } => "meeting_not_yet_occurred",
            Self::DuplicateId(_) => "duplicate_id",
            Self::InvalidSnapshot(_) => "invalid_snapshot",
            Self::IdSpaceExhausted => "id_space_exhausted",
        }
    }
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArgument(name) => write!(f, "required argument `{name}` is missing"),
            Self::UnknownContact(id) => write!(f, "contact not found: {id}"),
            Self::EmptyContactSet => write!(f, "a meeting needs at least one contact"),
            Self::DateNotInFuture { date, now } => write!(
                f,
                "meeting date {} is not after current time {}",
                date.to_rfc3339(),
                now.to_rfc3339()
            ),
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::NotPastMeeting(id) => write!(f, "meeting {id} is a future meeting"),
            Self::NotFutureMeeting(id) => write!(f, "meeting {id} is a past meeting"),
            Self::MeetingNotYetOccurred { id, date } => write!(
                f,
                "meeting {id} has not happened yet (scheduled for {})",
                date.to_rfc3339()
            ),
            Self::DuplicateId(id) => write!(f, "id {id} is used more than once"),
            Self::InvalidSnapshot(message) => write!(f, "invalid snapshot: {message}"),
            Self::IdSpaceExhausted => write!(f, "no identifiers left to issue"),
        }
    }
}

impl Error for ManagerError {}
