//! Meeting domain model.
//!
//! # Responsibility
//! - Define the single concrete meeting record used for both past and
//!   future meetings.
//!
//! # Invariants
//! - `id`, `date` and the contact set never change after construction.
//! - `date` carries millisecond precision.
//! - Past/future classification is repository placement, not a field here.

use crate::clock::truncate_to_millis;
use crate::model::append_note;
use crate::model::ids::{ContactId, MeetingId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Repository placement of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Has occurred; may carry notes.
    Past,
    /// Scheduled ahead at creation time.
    Future,
}

impl Classification {
    /// Stable lowercase name used in storage and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Past => "past",
            Self::Future => "future",
        }
    }

    /// Parses the storage name produced by [`Classification::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "past" => Some(Self::Past),
            "future" => Some(Self::Future),
            _ => None,
        }
    }
}

/// A scheduled or recorded event with a fixed set of contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    id: MeetingId,
    /// Serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    date: DateTime<Utc>,
    contacts: BTreeSet<ContactId>,
    notes: String,
}

impl Meeting {
    /// Builds a meeting with verbatim notes; `date` is truncated to
    /// millisecond precision.
    pub fn new(
        id: MeetingId,
        date: DateTime<Utc>,
        contacts: BTreeSet<ContactId>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id,
            date: truncate_to_millis(date),
            contacts,
            notes: notes.into(),
        }
    }

    pub fn id(&self) -> MeetingId {
        self.id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Returns a copy of the participant ids.
    pub fn contact_ids(&self) -> BTreeSet<ContactId> {
        self.contacts.clone()
    }

    /// Returns whether `contact_id` takes part in this meeting.
    pub fn involves(&self, contact_id: ContactId) -> bool {
        self.contacts.contains(&contact_id)
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub(crate) fn add_notes(&mut self, note: &str) {
        append_note(&mut self.notes, note);
    }
}

impl PartialEq for Meeting {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Meeting {}

impl Display for Meeting {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let contacts = self
            .contacts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(
            f,
            "[Meeting-> Id: {}, Date: {}, Contacts: [{}]",
            self.id,
            self.date.format("%d-%m-%Y %H:%M"),
            contacts
        )?;
        if !self.notes.is_empty() {
            write!(f, ", Notes: {}", self.notes)?;
        }
        write!(f, "]")
    }
}
