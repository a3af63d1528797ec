//! Core use-case services.
//!
//! # Responsibility
//! - Enforce meeting lifecycle rules above the repository layer.
//! - Keep CLI callers decoupled from storage details.

pub mod contact_manager;
