//! Repository layer: in-memory stores and the snapshot persistence gateway.
//!
//! # Responsibility
//! - Hold contacts and the two meeting collections behind placement APIs.
//! - Isolate SQLite details of snapshot persistence from engine logic.
//!
//! # Invariants
//! - In-memory stores never perform I/O.
//! - Ids are issued only through the shared `IdAuthority`.

pub mod contact_store;
pub mod meeting_repo;
pub mod snapshot_repo;
