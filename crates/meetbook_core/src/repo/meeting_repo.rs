//! In-memory meeting repository with past/future placement.
//!
//! # Responsibility
//! - Hold the two meeting collections and issue meeting ids.
//! - Provide placement primitives (insert, locate, promote) for the engine.
//!
//! # Invariants
//! - A meeting id lives in at most one collection.
//! - Meetings only ever move from `future` to `past`.
//! - Insertion order is not meaningful; callers sort reads by date.

use crate::error::{ManagerError, ManagerResult};
use crate::model::ids::{ContactId, IdAuthority, MeetingId};
use crate::model::meeting::{Classification, Meeting};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Past and future meeting collections.
#[derive(Debug)]
pub struct MeetingRepository {
    ids: Arc<IdAuthority>,
    past: Vec<Meeting>,
    future: Vec<Meeting>,
}

impl MeetingRepository {
    /// Creates an empty repository drawing ids from `ids`.
    pub fn new(ids: Arc<IdAuthority>) -> Self {
        Self {
            ids,
            past: Vec::new(),
            future: Vec::new(),
        }
    }

    /// Builds a meeting with a fresh id and places it in `classification`.
    ///
    /// Contact membership and date rules are checked by the engine.
    pub fn insert(
        &mut self,
        classification: Classification,
        date: DateTime<Utc>,
        contacts: BTreeSet<ContactId>,
        notes: &str,
    ) -> ManagerResult<MeetingId> {
        let id = self.ids.next_id()?;
        let meeting = Meeting::new(id, date, contacts, notes);
        self.collection_mut(classification).push(meeting);
        Ok(id)
    }

    /// Finds a meeting, searching `past` before `future`.
    pub fn locate(&self, id: MeetingId) -> Option<(Classification, &Meeting)> {
        [Classification::Past, Classification::Future]
            .into_iter()
            .find_map(|classification| {
                self.collection(classification)
                    .iter()
                    .find(|meeting| meeting.id() == id)
                    .map(|meeting| (classification, meeting))
            })
    }

    /// Moves a meeting from `future` to `past`.
    ///
    /// Returns `false` when the id is not in `future` (already past or
    /// unknown); nothing changes in that case.
    pub fn promote(&mut self, id: MeetingId) -> bool {
        let Some(index) = self.future.iter().position(|meeting| meeting.id() == id) else {
            return false;
        };
        let meeting = self.future.remove(index);
        self.past.push(meeting);
        true
    }

    /// Appends notes to a meeting in the `past` collection.
    pub fn append_past_notes(&mut self, id: MeetingId, text: &str) -> ManagerResult<()> {
        let meeting = self
            .past
            .iter_mut()
            .find(|meeting| meeting.id() == id)
            .ok_or(ManagerError::MeetingNotFound(id))?;
        meeting.add_notes(text);
        Ok(())
    }

    /// Iterates one collection in storage order.
    pub fn iter(&self, classification: Classification) -> impl Iterator<Item = &Meeting> {
        self.collection(classification).iter()
    }

    /// Iterates both collections, `past` first.
    pub fn iter_all(&self) -> impl Iterator<Item = &Meeting> {
        self.past.iter().chain(self.future.iter())
    }

    pub fn len(&self) -> usize {
        self.past.len() + self.future.len()
    }

    pub fn is_empty(&self) -> bool {
        self.past.is_empty() && self.future.is_empty()
    }

    /// Places an existing meeting without issuing an id (snapshot load path).
    pub(crate) fn restore(
        &mut self,
        classification: Classification,
        meeting: Meeting,
    ) -> ManagerResult<()> {
        if self.locate(meeting.id()).is_some() {
            return Err(ManagerError::DuplicateId(meeting.id()));
        }
        self.collection_mut(classification).push(meeting);
        Ok(())
    }

    fn collection(&self, classification: Classification) -> &Vec<Meeting> {
        match classification {
            Classification::Past => &self.past,
            Classification::Future => &self.future,
        }
    }

    fn collection_mut(&mut self, classification: Classification) -> &mut Vec<Meeting> {
        match classification {
            Classification::Past => &mut self.past,
            Classification::Future => &mut self.future,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MeetingRepository;
    use crate::model::ids::IdAuthority;
    use crate::model::meeting::Classification;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn repo() -> MeetingRepository {
        MeetingRepository::new(Arc::new(IdAuthority::new()))
    }

    #[test]
    fn insert_places_meeting_in_requested_collection() {
        let mut repo = repo();
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let future = repo
            .insert(Classification::Future, date, BTreeSet::from([1]), "")
            .unwrap();
        let past = repo
            .insert(Classification::Past, date, BTreeSet::from([1]), "done")
            .unwrap();

        assert_eq!(repo.locate(future).unwrap().0, Classification::Future);
        assert_eq!(repo.locate(past).unwrap().0, Classification::Past);
        assert!(repo.locate(past + 1).is_none());
    }

    #[test]
    fn promote_moves_future_meeting_once() {
        let mut repo = repo();
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let id = repo
            .insert(Classification::Future, date, BTreeSet::from([1]), "")
            .unwrap();

        assert!(repo.promote(id));
        assert_eq!(repo.locate(id).unwrap().0, Classification::Past);
        assert!(!repo.promote(id));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn append_past_notes_requires_past_placement() {
        let mut repo = repo();
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 10, 0, 0).unwrap();
        let id = repo
            .insert(Classification::Future, date, BTreeSet::from([1]), "")
            .unwrap();
        assert!(repo.append_past_notes(id, "early").is_err());

        repo.promote(id);
        repo.append_past_notes(id, "late").unwrap();
        assert_eq!(repo.locate(id).unwrap().1.notes(), "late");
    }
}
