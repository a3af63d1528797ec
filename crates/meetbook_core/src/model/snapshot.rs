//! Snapshot of the full contact store and meeting repository.
//!
//! # Invariants
//! - A snapshot is lossless: ids, names, notes, millisecond dates and each
//!   meeting's classification survive a save/load round trip.
//! - Contacts and meetings share one id namespace.

use crate::model::contact::Contact;
use crate::model::ids::EntityId;
use crate::model::meeting::Meeting;
use serde::{Deserialize, Serialize};

/// Serializable image of engine state, exchanged with persistence gateways.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Every known contact, ordered by id.
    pub contacts: Vec<Contact>,
    /// Meetings placed in the past collection.
    pub past_meetings: Vec<Meeting>,
    /// Meetings placed in the future collection.
    pub future_meetings: Vec<Meeting>,
}

impl Snapshot {
    /// Returns the largest id held by any contact or meeting, `0` when empty.
    pub fn max_id(&self) -> EntityId {
        let contact_ids = self.contacts.iter().map(Contact::id);
        let meeting_ids = self
            .past_meetings
            .iter()
            .chain(&self.future_meetings)
            .map(Meeting::id);
        contact_ids.chain(meeting_ids).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty() && self.past_meetings.is_empty() && self.future_meetings.is_empty()
    }
}
