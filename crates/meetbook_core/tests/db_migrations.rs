use meetbook_core::db::migrations::{apply_migrations, current_user_version, latest_version};
use meetbook_core::db::{open_db, open_db_in_memory, DbError};
use meetbook_core::{SnapshotRepoError, SqliteSnapshotRepository};
use rusqlite::{params, Connection};

const TABLES: [&str; 3] = ["contacts", "meetings", "meeting_contacts"];

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

#[test]
fn fresh_in_memory_book_is_fully_migrated() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let tables = table_names(&conn);
    for table in TABLES {
        assert!(tables.iter().any(|name| name == table), "missing table {table}");
    }
}

#[test]
fn reopening_a_book_runs_no_further_steps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.sqlite3");
    drop(open_db(&path).unwrap());

    let mut conn = Connection::open(&path).unwrap();
    assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
}

#[test]
fn unmigrated_file_gets_every_step() {
    let mut conn = Connection::open_in_memory().unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), 0);

    let applied = apply_migrations(&mut conn).unwrap();
    assert_eq!(applied, latest_version() as usize);
}

#[test]
fn missing_parent_directories_are_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("book.sqlite3");

    open_db(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn book_from_a_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("newer.sqlite3");
    Connection::open(&path)
        .unwrap()
        .execute_batch("PRAGMA user_version = 42;")
        .unwrap();

    let err = open_db(&path).unwrap_err();
    assert_eq!(err.code(), "db_schema_too_new");
    assert!(matches!(
        err,
        DbError::SchemaTooNew { found: 42, supported } if supported == latest_version()
    ));
}

#[test]
fn schema_rejects_unknown_classification_and_zero_ids() {
    let conn = open_db_in_memory().unwrap();

    let bad_class = conn.execute(
        "INSERT INTO meetings (id, classification, occurs_at, notes, position)
         VALUES (1, 'someday', 0, '', 0)",
        [],
    );
    assert!(bad_class.is_err());

    let zero_id = conn.execute(
        "INSERT INTO contacts (id, name, notes) VALUES (0, 'nobody', '')",
        [],
    );
    assert!(zero_id.is_err());
}

#[test]
fn links_require_existing_contacts_and_follow_meeting_deletes() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO contacts (id, name) VALUES (1, 'ann')", [])
        .unwrap();
    conn.execute(
        "INSERT INTO meetings (id, classification, occurs_at, position)
         VALUES (2, 'past', 1000, 0)",
        [],
    )
    .unwrap();

    let dangling = conn.execute(
        "INSERT INTO meeting_contacts (meeting_id, contact_id) VALUES (?1, ?2)",
        params![2, 99],
    );
    assert!(dangling.is_err());

    conn.execute(
        "INSERT INTO meeting_contacts (meeting_id, contact_id) VALUES (?1, ?2)",
        params![2, 1],
    )
    .unwrap();
    conn.execute("DELETE FROM meetings WHERE id = 2", []).unwrap();

    let links: i64 = conn
        .query_row("SELECT COUNT(*) FROM meeting_contacts", [], |row| row.get(0))
        .unwrap();
    assert_eq!(links, 0);
}

#[test]
fn snapshot_repository_requires_a_migrated_connection() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteSnapshotRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        SnapshotRepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}
