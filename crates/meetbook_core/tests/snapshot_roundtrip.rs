use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use meetbook_core::db::{open_db, open_db_in_memory};
use meetbook_core::{
    Classification, Clock, Contact, ContactManager, EntityId, ErrorKind, ManagerError,
    ManualClock, Meeting, Snapshot, SnapshotRepoError, SnapshotRepository,
    SqliteSnapshotRepository,
};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

type TestManager = ContactManager<Arc<ManualClock>>;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap(),
    ))
}

/// Two contacts, one past meeting, one future meeting, one promoted meeting.
fn populated(clock: &Arc<ManualClock>) -> TestManager {
    let mut manager = ContactManager::with_clock(Arc::clone(clock));
    let mike = manager.add_contact(Some("mike"), Some("met at fair")).unwrap();
    let sue = manager.add_contact(Some("sue"), Some("")).unwrap();
    manager.add_contact_notes(sue, Some("call on fridays")).unwrap();
    let both = manager.contacts_by_ids(&[mike, sue]).unwrap();
    let only_mike = manager.contacts_by_ids(&[mike]).unwrap();

    manager
        .add_past_meeting(
            Some(&both),
            Some(clock.now() - TimeDelta::days(30) + TimeDelta::milliseconds(123)),
            Some("kickoff"),
        )
        .unwrap();
    manager
        .add_future_meeting(&only_mike, clock.now() + TimeDelta::days(10))
        .unwrap();
    let promoted = manager
        .add_future_meeting(&both, clock.now() + TimeDelta::hours(1))
        .unwrap();
    clock.advance(TimeDelta::hours(2));
    manager.add_meeting_notes(promoted, Some("retro")).unwrap();
    manager
}

fn assert_same_meetings(left: &[Meeting], right: &[Meeting]) {
    assert_eq!(left.len(), right.len());
    for (a, b) in left.iter().zip(right) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.date(), b.date());
        assert_eq!(a.contact_ids(), b.contact_ids());
        assert_eq!(a.notes(), b.notes());
    }
}

fn assert_same_snapshot(left: &Snapshot, right: &Snapshot) {
    assert_eq!(left.contacts.len(), right.contacts.len());
    for (a, b) in left.contacts.iter().zip(&right.contacts) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
        assert_eq!(a.notes(), b.notes());
    }
    assert_same_meetings(&left.past_meetings, &right.past_meetings);
    assert_same_meetings(&left.future_meetings, &right.future_meetings);
}

#[test]
fn in_memory_snapshot_round_trip_preserves_everything() {
    let clock = clock();
    let original = populated(&clock);
    let snapshot = original.snapshot();

    let restored = ContactManager::from_snapshot(snapshot.clone(), Arc::clone(&clock)).unwrap();

    assert_same_snapshot(&snapshot, &restored.snapshot());
    assert_eq!(restored.last_issued_id(), snapshot.max_id());
    for meeting in &snapshot.future_meetings {
        assert_eq!(
            restored.classification(meeting.id()),
            Some(Classification::Future)
        );
    }
}

#[test]
fn ids_issued_after_reload_never_collide() {
    let clock = clock();
    let original = populated(&clock);
    let snapshot = original.snapshot();
    let persisted_ids = snapshot
        .contacts
        .iter()
        .map(Contact::id)
        .chain(snapshot.past_meetings.iter().map(Meeting::id))
        .chain(snapshot.future_meetings.iter().map(Meeting::id))
        .collect::<HashSet<_>>();

    let mut restored = ContactManager::from_snapshot(snapshot, Arc::clone(&clock)).unwrap();
    let contact = restored.add_contact(Some("new"), Some("")).unwrap();
    let contacts = restored.contacts_by_ids(&[contact]).unwrap();
    let meeting = restored
        .add_future_meeting(&contacts, clock.now() + TimeDelta::days(1))
        .unwrap();

    assert!(!persisted_ids.contains(&contact));
    assert!(!persisted_ids.contains(&meeting));
    assert!(contact > *persisted_ids.iter().max().unwrap());
}

#[test]
fn loading_smaller_snapshot_never_lowers_counter() {
    let clock = clock();
    let mut manager = populated(&clock);
    let before = manager.last_issued_id();

    manager.load_snapshot(Snapshot::default()).unwrap();
    let id = manager.add_contact(Some("after"), Some("")).unwrap();

    assert_eq!(id, before + 1);
}

#[test]
fn load_rejects_inconsistent_snapshots_and_keeps_state() {
    let clock = clock();
    let mut manager = populated(&clock);
    let before = manager.snapshot();
    let date = clock.now();

    let dangling = Snapshot {
        contacts: vec![Contact::new(1, "mike", "")],
        past_meetings: vec![Meeting::new(2, date, BTreeSet::from([9]), "")],
        future_meetings: Vec::new(),
    };
    let err = manager.load_snapshot(dangling).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidSnapshot(_)));

    let duplicate = Snapshot {
        contacts: vec![Contact::new(1, "mike", "")],
        past_meetings: vec![Meeting::new(1, date, BTreeSet::from([1]), "")],
        future_meetings: Vec::new(),
    };
    let err = manager.load_snapshot(duplicate).unwrap_err();
    assert_eq!(err, ManagerError::DuplicateId(1));

    let empty = Snapshot {
        contacts: vec![Contact::new(1, "mike", "")],
        past_meetings: Vec::new(),
        future_meetings: vec![Meeting::new(2, date, BTreeSet::new(), "")],
    };
    assert!(manager.load_snapshot(empty).is_err());

    assert_same_snapshot(&before, &manager.snapshot());
}

#[test]
fn load_rejects_reserved_zero_id() {
    let clock = clock();
    let mut manager = populated(&clock);
    let before = manager.snapshot();
    let date = clock.now();

    let zero_contact = Snapshot {
        contacts: vec![Contact::new(0, "nobody", "")],
        ..Snapshot::default()
    };
    let err = manager.load_snapshot(zero_contact).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidSnapshot(_)));

    let zero_meeting = Snapshot {
        contacts: vec![Contact::new(1, "mike", "")],
        past_meetings: vec![Meeting::new(0, date, BTreeSet::from([1]), "")],
        future_meetings: Vec::new(),
    };
    let err = manager.load_snapshot(zero_meeting).unwrap_err();
    assert!(matches!(err, ManagerError::InvalidSnapshot(_)));

    assert_same_snapshot(&before, &manager.snapshot());
}

#[test]
fn loaded_maximum_id_exhausts_the_counter_without_reuse() {
    let clock = clock();
    let snapshot = Snapshot {
        contacts: vec![Contact::new(EntityId::MAX, "last", "")],
        ..Snapshot::default()
    };
    let mut manager = ContactManager::from_snapshot(snapshot, Arc::clone(&clock)).unwrap();
    assert_eq!(manager.last_issued_id(), EntityId::MAX);

    let err = manager.add_contact(Some("next"), Some("")).unwrap_err();
    assert_eq!(err, ManagerError::IdSpaceExhausted);
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let last = manager.contacts_by_ids(&[EntityId::MAX]).unwrap();
    let err = manager
        .add_future_meeting(&last, clock.now() + TimeDelta::days(1))
        .unwrap_err();
    assert_eq!(err, ManagerError::IdSpaceExhausted);
    let err = manager
        .add_past_meeting(Some(&last), Some(clock.now()), Some(""))
        .unwrap_err();
    assert_eq!(err, ManagerError::IdSpaceExhausted);

    assert_eq!(manager.contacts().len(), 1);
    assert!(manager.meeting(0).is_none());
    assert!(manager.meeting(1).is_none());
    assert_eq!(manager.last_issued_id(), EntityId::MAX);
}

#[test]
fn snapshot_serializes_with_millisecond_dates() {
    let date: DateTime<Utc> = Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()
        + TimeDelta::milliseconds(678);
    let snapshot = Snapshot {
        contacts: vec![Contact::new(1, "mike", "a; b")],
        past_meetings: Vec::new(),
        future_meetings: vec![Meeting::new(2, date, BTreeSet::from([1]), "")],
    };

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["contacts"][0]["name"], "mike");
    assert_eq!(json["contacts"][0]["notes"], "a; b");
    assert_eq!(json["future_meetings"][0]["date"], date.timestamp_millis());
    assert_eq!(json["future_meetings"][0]["contacts"][0], 1);

    let decoded: Snapshot = serde_json::from_value(json).unwrap();
    assert_same_snapshot(&snapshot, &decoded);
}

#[test]
fn sqlite_gateway_round_trip_preserves_everything() {
    let clock = clock();
    let original = populated(&clock);
    let snapshot = original.snapshot();

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    repo.save_snapshot(&snapshot).unwrap();
    let loaded = repo.load_snapshot().unwrap();

    assert_same_snapshot(&snapshot, &loaded);
}

#[test]
fn sqlite_gateway_save_replaces_previous_state() {
    let clock = clock();
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    repo.save_snapshot(&populated(&clock).snapshot()).unwrap();
    repo.save_snapshot(&Snapshot::default()).unwrap();

    assert!(repo.load_snapshot().unwrap().is_empty());
}

#[test]
fn sqlite_gateway_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meetbook.db");
    let clock = clock();
    let snapshot = populated(&clock).snapshot();

    {
        let conn = open_db(&path).unwrap();
        SqliteSnapshotRepository::try_new(&conn)
            .unwrap()
            .save_snapshot(&snapshot)
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let loaded = SqliteSnapshotRepository::try_new(&conn)
        .unwrap()
        .load_snapshot()
        .unwrap();
    let restored = ContactManager::from_snapshot(loaded, Arc::clone(&clock)).unwrap();
    assert_same_snapshot(&snapshot, &restored.snapshot());
}

#[test]
fn sqlite_gateway_rejects_unknown_classification() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "PRAGMA ignore_check_constraints = ON;
         INSERT INTO meetings (id, classification, occurs_at, notes, position)
         VALUES (5, 'someday', 0, '', 0);",
    )
    .unwrap();

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let err = repo.load_snapshot().unwrap_err();
    assert!(matches!(err, SnapshotRepoError::InvalidData(_)));
}
