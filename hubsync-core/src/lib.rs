//! Foundation types for the hubsync mirror pipeline: the error taxonomy,
//! line-oriented file helpers, and the persisted progress ledger that makes
//! re-runs idempotent.

pub mod error;
pub mod file_system;
pub mod ledger;

pub use error::{HubSyncError, Result};
