//! Contact domain model.
//!
//! # Invariants
//! - `id` and `name` never change after construction.
//! - `notes` is append-only (see [`crate::model::NOTE_SEPARATOR`]).
//! - Equality, ordering and hashing consider `id` only.

use crate::model::append_note;
use crate::model::ids::ContactId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// A named party with free-text notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    id: ContactId,
    name: String,
    notes: String,
}

impl Contact {
    /// Builds a contact with a known id and verbatim notes.
    ///
    /// Used by the contact store and by snapshot loading; a contact built
    /// here is not known to any store until it is added there.
    pub fn new(id: ContactId, name: impl Into<String>, notes: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            notes: notes.into(),
        }
    }

    pub fn id(&self) -> ContactId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Appends one note fragment.
    pub fn add_notes(&mut self, note: &str) {
        append_note(&mut self.notes, note);
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[Contact-> Id: {}, Name: {}", self.id, self.name)?;
        if !self.notes.is_empty() {
            write!(f, ", Notes: {}", self.notes)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::Contact;

    #[test]
    fn equality_is_by_id_only() {
        let a = Contact::new(7, "mike", "");
        let b = Contact::new(7, "someone else", "other notes");
        let c = Contact::new(8, "mike", "");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn add_notes_appends_with_separator() {
        let mut contact = Contact::new(1, "sue", "met at conference");
        contact.add_notes("prefers email");
        assert_eq!(contact.notes(), "met at conference; prefers email");
    }

    #[test]
    fn display_omits_empty_notes() {
        let contact = Contact::new(3, "kevin", "");
        assert_eq!(contact.to_string(), "[Contact-> Id: 3, Name: kevin]");
    }
}
