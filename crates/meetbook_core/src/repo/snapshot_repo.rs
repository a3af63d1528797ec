//! Snapshot persistence gateway contracts and SQLite implementation.
//!
//! # Responsibility
//! - Save and load complete [`Snapshot`] images of engine state.
//! - Keep SQL details inside the persistence boundary; the engine itself
//!   never performs I/O.
//!
//! # Invariants
//! - A save replaces every stored row in one transaction.
//! - Loads preserve ids, millisecond dates, notes and classification.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::contact::Contact;
use crate::model::ids::{ContactId, MeetingId};
use crate::model::meeting::{Classification, Meeting};
use crate::model::snapshot::Snapshot;
use chrono::{DateTime, Utc};
use log::{error, info};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type SnapshotRepoResult<T> = Result<T, SnapshotRepoError>;

/// Errors from snapshot persistence.
#[derive(Debug)]
pub enum SnapshotRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted into a valid snapshot.
    InvalidData(String),
}

impl Display for SnapshotRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted snapshot data: {message}"),
        }
    }
}

impl Error for SnapshotRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SnapshotRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SnapshotRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence gateway for whole-state snapshots.
pub trait SnapshotRepository {
    /// Replaces stored state with `snapshot`.
    fn save_snapshot(&self, snapshot: &Snapshot) -> SnapshotRepoResult<()>;
    /// Loads the stored state; an untouched database yields an empty snapshot.
    fn load_snapshot(&self) -> SnapshotRepoResult<Snapshot>;
}

/// SQLite-backed snapshot repository.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SnapshotRepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(SnapshotRepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn save_snapshot(&self, snapshot: &Snapshot) -> SnapshotRepoResult<()> {
        let started_at = Instant::now();
        let result = write_snapshot(self.conn, snapshot);
        match &result {
            Ok(()) => info!(
                "event=snapshot_save module=repo status=ok contacts={} past_meetings={} future_meetings={} duration_ms={}",
                snapshot.contacts.len(),
                snapshot.past_meetings.len(),
                snapshot.future_meetings.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_save module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn load_snapshot(&self) -> SnapshotRepoResult<Snapshot> {
        let started_at = Instant::now();
        let result = read_snapshot(self.conn);
        match &result {
            Ok(snapshot) => info!(
                "event=snapshot_load module=repo status=ok contacts={} past_meetings={} future_meetings={} duration_ms={}",
                snapshot.contacts.len(),
                snapshot.past_meetings.len(),
                snapshot.future_meetings.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_load module=repo status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

fn write_snapshot(conn: &Connection, snapshot: &Snapshot) -> SnapshotRepoResult<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute_batch(
        "DELETE FROM meeting_contacts;
         DELETE FROM meetings;
         DELETE FROM contacts;",
    )?;

    {
        let mut insert_contact =
            tx.prepare("INSERT INTO contacts (id, name, notes) VALUES (?1, ?2, ?3);")?;
        for contact in &snapshot.contacts {
            insert_contact.execute(params![contact.id(), contact.name(), contact.notes()])?;
        }

        let mut insert_meeting = tx.prepare(
            "INSERT INTO meetings (id, classification, occurs_at, notes, position)
             VALUES (?1, ?2, ?3, ?4, ?5);",
        )?;
        let mut insert_link = tx
            .prepare("INSERT INTO meeting_contacts (meeting_id, contact_id) VALUES (?1, ?2);")?;
        for (classification, meetings) in [
            (Classification::Past, &snapshot.past_meetings),
            (Classification::Future, &snapshot.future_meetings),
        ] {
            for (position, meeting) in meetings.iter().enumerate() {
                let position = i64::try_from(position).map_err(|_| {
                    SnapshotRepoError::InvalidData(format!(
                        "meeting position {position} does not fit storage"
                    ))
                })?;
                insert_meeting.execute(params![
                    meeting.id(),
                    classification.as_str(),
                    meeting.date().timestamp_millis(),
                    meeting.notes(),
                    position,
                ])?;
                for contact_id in meeting.contact_ids() {
                    insert_link.execute(params![meeting.id(), contact_id])?;
                }
            }
        }
    }

    tx.commit()?;
    Ok(())
}

fn read_snapshot(conn: &Connection) -> SnapshotRepoResult<Snapshot> {
    let mut snapshot = Snapshot::default();

    let mut stmt = conn.prepare("SELECT id, name, notes FROM contacts ORDER BY id ASC;")?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        snapshot.contacts.push(Contact::new(
            row.get::<_, ContactId>("id")?,
            row.get::<_, String>("name")?,
            row.get::<_, String>("notes")?,
        ));
    }

    let mut links = load_meeting_links(conn)?;

    let mut stmt = conn.prepare(
        "SELECT id, classification, occurs_at, notes
         FROM meetings
         ORDER BY classification ASC, position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: MeetingId = row.get("id")?;
        let classification_text: String = row.get("classification")?;
        let classification = Classification::parse(&classification_text).ok_or_else(|| {
            SnapshotRepoError::InvalidData(format!(
                "invalid classification `{classification_text}` in meetings.classification"
            ))
        })?;
        let occurs_at: i64 = row.get("occurs_at")?;
        let date = DateTime::<Utc>::from_timestamp_millis(occurs_at).ok_or_else(|| {
            SnapshotRepoError::InvalidData(format!(
                "invalid timestamp `{occurs_at}` in meetings.occurs_at"
            ))
        })?;
        let contacts = links.remove(&id).unwrap_or_default();
        let meeting = Meeting::new(id, date, contacts, row.get::<_, String>("notes")?);

        match classification {
            Classification::Past => snapshot.past_meetings.push(meeting),
            Classification::Future => snapshot.future_meetings.push(meeting),
        }
    }

    Ok(snapshot)
}

fn load_meeting_links(
    conn: &Connection,
) -> SnapshotRepoResult<BTreeMap<MeetingId, BTreeSet<ContactId>>> {
    let mut stmt = conn.prepare("SELECT meeting_id, contact_id FROM meeting_contacts;")?;
    let mut rows = stmt.query([])?;
    let mut links: BTreeMap<MeetingId, BTreeSet<ContactId>> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        links
            .entry(row.get("meeting_id")?)
            .or_default()
            .insert(row.get("contact_id")?);
    }
    Ok(links)
}
