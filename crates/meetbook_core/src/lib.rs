//! Core domain logic for Meetbook.
//! This crate is the single source of truth for contact and meeting invariants.

pub mod clock;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorKind, ManagerError, ManagerResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::Contact;
pub use model::ids::{ContactId, EntityId, IdAuthority, MeetingId};
pub use model::meeting::{Classification, Meeting};
pub use model::snapshot::Snapshot;
pub use repo::snapshot_repo::{
    SnapshotRepoError, SnapshotRepoResult, SnapshotRepository, SqliteSnapshotRepository,
};
pub use service::contact_manager::ContactManager;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
