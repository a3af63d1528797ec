//! Domain model for contacts, meetings and persisted snapshots.
//!
//! # Responsibility
//! - Define the canonical records shared by the store, repository and engine.
//! - Own the note-append rule used by both contacts and meetings.
//!
//! # Invariants
//! - Contacts and meetings draw ids from one shared namespace.
//! - Equality of contacts and meetings is identity (id) equality.
//! - Notes only ever grow; existing text is never rewritten.

pub mod contact;
pub mod ids;
pub mod meeting;
pub mod snapshot;

/// Separator placed between two note fragments.
pub const NOTE_SEPARATOR: &str = "; ";

/// Appends `note` to `notes` using the shared join rule.
///
/// Empty existing notes take the new fragment verbatim; otherwise the
/// fragment is joined with [`NOTE_SEPARATOR`].
pub(crate) fn append_note(notes: &mut String, note: &str) {
    if !notes.is_empty() {
        notes.push_str(NOTE_SEPARATOR);
    }
    notes.push_str(note);
}
