//! Embedded schema migrations for the contact book database.
//!
//! # Invariants
//! - Steps are listed in ascending `version` order with no gaps.
//! - Every step runs in its own transaction together with the
//!   `PRAGMA user_version` bump, so a failed step leaves the previous
//!   version intact.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    name: "contacts_and_meetings",
    sql: include_str!("0001_init.sql"),
}];

/// Schema version produced by running every embedded step.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Runs the steps newer than the version stamped on `conn`.
///
/// Returns the number of steps applied.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let found = current_user_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let mut applied = 0;
    for step in STEPS.iter().filter(|step| step.version > found) {
        let tx = conn.transaction()?;
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        tx.commit()?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
        applied += 1;
    }

    if applied > 0 {
        info!("event=db_migrate module=db status=ok from_version={found} to_version={supported} steps={applied}");
    }
    Ok(applied)
}

/// Reads `PRAGMA user_version` from `conn`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
