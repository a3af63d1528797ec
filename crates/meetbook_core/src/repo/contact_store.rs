//! In-memory contact store.
//!
//! # Responsibility
//! - Own the set of known contacts and resolve ids/names to contacts.
//! - Issue contact ids from the shared [`IdAuthority`].
//!
//! # Invariants
//! - Contacts are never removed; only their notes grow.
//! - Every stored id was either issued by the authority or observed by it.

use crate::error::{ManagerError, ManagerResult};
use crate::model::contact::Contact;
use crate::model::ids::{ContactId, IdAuthority};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Set of known contacts keyed by id.
#[derive(Debug)]
pub struct ContactStore {
    ids: Arc<IdAuthority>,
    contacts: BTreeMap<ContactId, Contact>,
}

impl ContactStore {
    /// Creates an empty store drawing ids from `ids`.
    pub fn new(ids: Arc<IdAuthority>) -> Self {
        Self {
            ids,
            contacts: BTreeMap::new(),
        }
    }

    /// Creates and stores one contact, returning its fresh id.
    ///
    /// `None` for either argument is a missing argument; empty strings are
    /// accepted. Names are not deduplicated.
    pub fn add_contact(
        &mut self,
        name: Option<&str>,
        notes: Option<&str>,
    ) -> ManagerResult<ContactId> {
        let name = name.ok_or(ManagerError::MissingArgument("name"))?;
        let notes = notes.ok_or(ManagerError::MissingArgument("notes"))?;

        let id = self.ids.next_id()?;
        self.contacts.insert(id, Contact::new(id, name, notes));
        Ok(id)
    }

    /// Resolves every id, failing on the first unknown one.
    pub fn contacts_by_ids(&self, ids: &[ContactId]) -> ManagerResult<BTreeSet<Contact>> {
        ids.iter()
            .map(|id| {
                self.contacts
                    .get(id)
                    .cloned()
                    .ok_or(ManagerError::UnknownContact(*id))
            })
            .collect()
    }

    /// Returns all contacts whose name contains `text`; empty text matches all.
    pub fn contacts_by_name(&self, text: Option<&str>) -> ManagerResult<BTreeSet<Contact>> {
        let text = text.ok_or(ManagerError::MissingArgument("name"))?;
        Ok(self
            .contacts
            .values()
            .filter(|contact| contact.name().contains(text))
            .cloned()
            .collect())
    }

    /// Appends notes to one stored contact.
    pub fn add_contact_notes(&mut self, id: ContactId, text: Option<&str>) -> ManagerResult<()> {
        let text = text.ok_or(ManagerError::MissingArgument("text"))?;
        let contact = self
            .contacts
            .get_mut(&id)
            .ok_or(ManagerError::UnknownContact(id))?;
        contact.add_notes(text);
        Ok(())
    }

    /// Returns a copy of one contact.
    pub fn contact(&self, id: ContactId) -> Option<Contact> {
        self.contacts.get(&id).cloned()
    }

    /// Returns whether `contact` is a member (by id).
    pub fn contains(&self, contact: &Contact) -> bool {
        self.contains_id(contact.id())
    }

    pub fn contains_id(&self, id: ContactId) -> bool {
        self.contacts.contains_key(&id)
    }

    /// Returns copies of all contacts ordered by id.
    pub fn contacts(&self) -> Vec<Contact> {
        self.contacts.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Inserts a contact with an existing id (snapshot load path).
    pub(crate) fn restore(&mut self, contact: Contact) -> ManagerResult<()> {
        let id = contact.id();
        if self.contacts.contains_key(&id) {
            return Err(ManagerError::DuplicateId(id));
        }
        self.contacts.insert(id, contact);
        Ok(())
    }
}
