//! # aide-memory
//!
//! Persistent notes, reminders, and audit log for aide (SQLite-backed).

pub mod audit;
pub mod store;

pub use audit::AuditLogger;
pub use store::Store;
