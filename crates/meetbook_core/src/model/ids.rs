//! Identifier authority shared by contacts and meetings.
//!
//! # Invariants
//! - The first issued id is `1`; every issue increments by exactly one.
//! - Ids never wrap: once `EntityId::MAX` is reached, issuing fails.
//! - `observe` only ever raises the floor, so ids issued after a load never
//!   collide with persisted ones.

use crate::error::{ManagerError, ManagerResult};
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifier type shared by every domain entity.
pub type EntityId = u32;

/// Stable identifier of a contact.
pub type ContactId = EntityId;

/// Stable identifier of a meeting.
pub type MeetingId = EntityId;

/// Issues unique ids across contacts and meetings.
///
/// The counter is atomic so one authority can be shared (via `Arc`) between
/// the contact store and the meeting repository, including across threads.
#[derive(Debug, Default)]
pub struct IdAuthority {
    last_issued: AtomicU32,
}

impl IdAuthority {
    /// Creates an authority whose first issued id is `1`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next id.
    ///
    /// # Errors
    /// - `IdSpaceExhausted` when the last issued id is `EntityId::MAX`; the
    ///   counter is left unchanged.
    pub fn next_id(&self) -> ManagerResult<EntityId> {
        self.last_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| last.checked_add(1))
            .map(|last| last + 1)
            .map_err(|_| ManagerError::IdSpaceExhausted)
    }

    /// Raises the floor to `id` when it exceeds the last issued id.
    ///
    /// Never lowers the counter.
    pub fn observe(&self, id: EntityId) {
        self.last_issued.fetch_max(id, Ordering::SeqCst);
    }

    /// Returns the most recently issued (or observed) id, `0` when none.
    pub fn last_issued(&self) -> EntityId {
        self.last_issued.load(Ordering::SeqCst)
    }
}
