//! Meeting lifecycle engine.
//!
//! # Responsibility
//! - Validate and apply contact/meeting use-cases over the contact store and
//!   meeting repository.
//! - Decide when a meeting moves from the future collection to the past one.
//! - Compose, filter and order queries across both collections.
//! - Produce and accept lossless snapshots for persistence gateways.
//!
//! # Invariants
//! - Meetings only reference contacts known to the store.
//! - A future meeting is created only for a date strictly after now.
//! - `add_meeting_notes` is the sole future -> past transition and refuses
//!   meetings whose date is still ahead.
//! - Every list result is sorted ascending by full timestamp (stable).
//! - Loading a snapshot never lowers the id counter.

use crate::clock::{calendar_day, truncate_to_millis, Clock, SystemClock};
use crate::error::{ManagerError, ManagerResult};
use crate::model::contact::Contact;
use crate::model::ids::{ContactId, EntityId, IdAuthority, MeetingId};
use crate::model::meeting::{Classification, Meeting};
use crate::model::snapshot::Snapshot;
use crate::repo::contact_store::ContactStore;
use crate::repo::meeting_repo::MeetingRepository;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Contact book and meeting scheduler facade.
#[derive(Debug)]
pub struct ContactManager<C: Clock = SystemClock> {
    clock: C,
    ids: Arc<IdAuthority>,
    contacts: ContactStore,
    meetings: MeetingRepository,
}

impl ContactManager<SystemClock> {
    /// Creates an empty manager using the wall clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for ContactManager<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> ContactManager<C> {
    /// Creates an empty manager using `clock` as its notion of now.
    pub fn with_clock(clock: C) -> Self {
        let ids = Arc::new(IdAuthority::new());
        Self {
            clock,
            contacts: ContactStore::new(Arc::clone(&ids)),
            meetings: MeetingRepository::new(Arc::clone(&ids)),
            ids,
        }
    }

    /// Creates a manager whose state is rebuilt from `snapshot`.
    pub fn from_snapshot(snapshot: Snapshot, clock: C) -> ManagerResult<Self> {
        let mut manager = Self::with_clock(clock);
        manager.load_snapshot(snapshot)?;
        Ok(manager)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Most recently issued id across contacts and meetings.
    pub fn last_issued_id(&self) -> EntityId {
        self.ids.last_issued()
    }

    /// Adds a contact; see [`ContactStore::add_contact`].
    pub fn add_contact(
        &mut self,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> ManagerResult<ContactId> {
        let id = self.contacts.add_contact(name, notes)?;
        info!("event=contact_add module=service status=ok contact_id={id}");
        Ok(id)
    }

    pub fn contacts_by_ids(&self, ids: &[ContactId]) -> ManagerResult<BTreeSet<Contact>> {
        self.contacts.contacts_by_ids(ids)
    }

    pub fn contacts_by_name(&self, text: Option<&str>) -> ManagerResult<BTreeSet<Contact>> {
        self.contacts.contacts_by_name(text)
    }

    pub fn add_contact_notes(&mut self, id: ContactId, text: Option<&str>) -> ManagerResult<()> {
        self.contacts.add_contact_notes(id, text)?;
        info!("event=contact_notes module=service status=ok contact_id={id}");
        Ok(())
    }

    pub fn contact(&self, id: ContactId) -> Option<Contact> {
        self.contacts.contact(id)
    }

    /// All contacts ordered by id.
    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.contacts()
    }

    /// Schedules a meeting strictly after now and returns its id.
    ///
    /// # Errors
    /// - `EmptyContactSet` / `UnknownContact` when the contact set is not a
    ///   non-empty subset of the store.
    /// - `DateNotInFuture` when `date` is at or before now (milliseconds).
    pub fn add_future_meeting(
        &mut self,
        contacts: &BTreeSet<Contact>,
        date: DateTime<Utc>,
    ) -> ManagerResult<MeetingId> {
        let contact_ids = self.resolve_members(contacts)?;
        let now = self.clock.now();
        let date = truncate_to_millis(date);
        if date <= now {
            debug!(
                "event=meeting_schedule module=service status=rejected error_code=date_not_in_future"
            );
            return Err(ManagerError::DateNotInFuture { date, now });
        }

        let id = self
            .meetings
            .insert(Classification::Future, date, contact_ids, "")?;
        info!(
            "event=meeting_schedule module=service status=ok meeting_id={id} contacts={}",
            contacts.len()
        );
        Ok(id)
    }

    /// Records a meeting that already took place and returns its id.
    ///
    /// The date is not checked against now: the caller asserts the meeting
    /// happened.
    ///
    /// # Errors
    /// - `MissingArgument` when any argument is `None`.
    /// - `EmptyContactSet` / `UnknownContact` for an invalid contact set.
    pub fn add_past_meeting(
        &mut self,
        contacts: Option<&BTreeSet<Contact>>,
        date: Option<DateTime<Utc>>,
        notes: Option<&str>,
    ) -> ManagerResult<MeetingId> {
        let contacts = contacts.ok_or(ManagerError::MissingArgument("contacts"))?;
        let date = date.ok_or(ManagerError::MissingArgument("date"))?;
        let notes = notes.ok_or(ManagerError::MissingArgument("notes"))?;
        let contact_ids = self.resolve_members(contacts)?;

        let id = self
            .meetings
            .insert(Classification::Past, date, contact_ids, notes)?;
        info!(
            "event=meeting_record module=service status=ok meeting_id={id} contacts={}",
            contacts.len()
        );
        Ok(id)
    }

    /// Returns a copy of the meeting with `id`, past or future.
    pub fn meeting(&self, id: MeetingId) -> Option<Meeting> {
        self.meetings.locate(id).map(|(_, meeting)| meeting.clone())
    }

    /// Returns copies of the contacts taking part in meeting `id`, or `None`
    /// when no meeting has that id.
    pub fn meeting_contacts(&self, id: MeetingId) -> Option<BTreeSet<Contact>> {
        self.meetings.locate(id).map(|(_, meeting)| {
            meeting
                .contact_ids()
                .into_iter()
                .filter_map(|contact_id| self.contacts.contact(contact_id))
                .collect()
        })
    }

    /// Returns the current placement of a meeting.
    pub fn classification(&self, id: MeetingId) -> Option<Classification> {
        self.meetings.locate(id).map(|(classification, _)| classification)
    }

    /// Returns a past meeting; `Ok(None)` when no meeting has `id`.
    ///
    /// # Errors
    /// - `NotPastMeeting` when the meeting is still in the future collection,
    ///   whatever its date.
    pub fn past_meeting(&self, id: MeetingId) -> ManagerResult<Option<Meeting>> {
        match self.meetings.locate(id) {
            None => Ok(None),
            Some((Classification::Future, _)) => Err(ManagerError::NotPastMeeting(id)),
            Some((Classification::Past, meeting)) => Ok(Some(meeting.clone())),
        }
    }

    /// Returns a future meeting; `Ok(None)` when no meeting has `id`.
    ///
    /// # Errors
    /// - `NotFutureMeeting` when the meeting is in the past collection.
    pub fn future_meeting(&self, id: MeetingId) -> ManagerResult<Option<Meeting>> {
        match self.meetings.locate(id) {
            None => Ok(None),
            Some((Classification::Past, _)) => Err(ManagerError::NotFutureMeeting(id)),
            Some((Classification::Future, meeting)) => Ok(Some(meeting.clone())),
        }
    }

    /// Meetings of one collection involving `contact`, sorted by date.
    pub fn meetings_for_contact(
        &self,
        contact: &Contact,
        classification: Classification,
    ) -> ManagerResult<Vec<Meeting>> {
        if !self.contacts.contains(contact) {
            return Err(ManagerError::UnknownContact(contact.id()));
        }

        let mut found = self
            .meetings
            .iter(classification)
            .filter(|meeting| meeting.involves(contact.id()))
            .cloned()
            .collect::<Vec<_>>();
        sort_by_date(&mut found);
        Ok(found)
    }

    pub fn past_meetings_for(&self, contact: &Contact) -> ManagerResult<Vec<Meeting>> {
        self.meetings_for_contact(contact, Classification::Past)
    }

    pub fn future_meetings_for(&self, contact: &Contact) -> ManagerResult<Vec<Meeting>> {
        self.meetings_for_contact(contact, Classification::Future)
    }

    /// Meetings in either collection on the same calendar day as `date`.
    ///
    /// Both collections are scanned: a future meeting may already lie in the
    /// past, and a recorded past meeting may carry a future date.
    pub fn meetings_on_date(&self, date: DateTime<Utc>) -> Vec<Meeting> {
        self.meetings_on_day(calendar_day(date))
    }

    /// Meetings in either collection falling on `day`, sorted by date.
    pub fn meetings_on_day(&self, day: NaiveDate) -> Vec<Meeting> {
        let mut found = self
            .meetings
            .iter_all()
            .filter(|meeting| calendar_day(meeting.date()) == day)
            .cloned()
            .collect::<Vec<_>>();
        sort_by_date(&mut found);
        found
    }

    /// Appends notes to a meeting, moving it to the past collection first
    /// when it was scheduled as a future meeting.
    ///
    /// # Errors
    /// - `MissingArgument` when `text` is `None`.
    /// - `MeetingNotFound` when no meeting has `id`.
    /// - `MeetingNotYetOccurred` when the meeting is a future meeting whose
    ///   date is still after now; nothing is changed.
    pub fn add_meeting_notes(&mut self, id: MeetingId, text: Option<&str>) -> ManagerResult<()> {
        let text = text.ok_or(ManagerError::MissingArgument("text"))?;
        let (classification, date) = self
            .meetings
            .locate(id)
            .map(|(classification, meeting)| (classification, meeting.date()))
            .ok_or(ManagerError::MeetingNotFound(id))?;

        if classification == Classification::Future {
            if date > self.clock.now() {
                warn!(
                    "event=meeting_notes module=service status=rejected meeting_id={id} error_code=meeting_not_yet_occurred"
                );
                return Err(ManagerError::MeetingNotYetOccurred { id, date });
            }
            self.meetings.promote(id);
            info!("event=meeting_promote module=service status=ok meeting_id={id}");
        }

        self.meetings.append_past_notes(id, text)?;
        info!("event=meeting_notes module=service status=ok meeting_id={id}");
        Ok(())
    }

    /// Captures a complete copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            contacts: self.contacts.contacts(),
            past_meetings: self.meetings.iter(Classification::Past).cloned().collect(),
            future_meetings: self
                .meetings
                .iter(Classification::Future)
                .cloned()
                .collect(),
        }
    }

    /// Replaces the current state with `snapshot`.
    ///
    /// The snapshot is validated in full before anything is replaced; on
    /// error the manager keeps its previous state. On success the id counter
    /// is raised to at least the largest loaded id.
    ///
    /// # Errors
    /// - `DuplicateId` when two entities share an id.
    /// - `InvalidSnapshot` when an entity carries id `0`, or a meeting has no
    ///   contacts or references an unknown contact.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> ManagerResult<()> {
        let max_id = snapshot.max_id();
        let mut seen = HashSet::new();
        let mut contacts = ContactStore::new(Arc::clone(&self.ids));
        let mut meetings = MeetingRepository::new(Arc::clone(&self.ids));

        for contact in snapshot.contacts {
            claim_id(&mut seen, contact.id())?;
            contacts.restore(contact)?;
        }

        let placed = snapshot
            .past_meetings
            .into_iter()
            .map(|meeting| (Classification::Past, meeting))
            .chain(
                snapshot
                    .future_meetings
                    .into_iter()
                    .map(|meeting| (Classification::Future, meeting)),
            );
        for (classification, meeting) in placed {
            claim_id(&mut seen, meeting.id())?;
            let contact_ids = meeting.contact_ids();
            if contact_ids.is_empty() {
                return Err(ManagerError::InvalidSnapshot(format!(
                    "meeting {} has no contacts",
                    meeting.id()
                )));
            }
            if let Some(missing) = contact_ids.iter().find(|id| !contacts.contains_id(**id)) {
                return Err(ManagerError::InvalidSnapshot(format!(
                    "meeting {} references unknown contact {missing}",
                    meeting.id()
                )));
            }
            meetings.restore(classification, meeting)?;
        }

        self.contacts = contacts;
        self.meetings = meetings;
        self.ids.observe(max_id);
        info!(
            "event=snapshot_load module=service status=ok contacts={} meetings={} max_id={max_id}",
            self.contacts.len(),
            self.meetings.len()
        );
        Ok(())
    }

    fn resolve_members(&self, contacts: &BTreeSet<Contact>) -> ManagerResult<BTreeSet<ContactId>> {
        if contacts.is_empty() {
            return Err(ManagerError::EmptyContactSet);
        }
        contacts
            .iter()
            .map(|contact| {
                if self.contacts.contains(contact) {
                    Ok(contact.id())
                } else {
                    Err(ManagerError::UnknownContact(contact.id()))
                }
            })
            .collect()
    }
}

fn claim_id(seen: &mut HashSet<EntityId>, id: EntityId) -> ManagerResult<()> {
    if id == 0 {
        return Err(ManagerError::InvalidSnapshot("id 0 is reserved".to_string()));
    }
    if !seen.insert(id) {
        return Err(ManagerError::DuplicateId(id));
    }
    Ok(())
}

fn sort_by_date(meetings: &mut [Meeting]) {
    meetings.sort_by_key(Meeting::date);
}
