//! Data models for shelfmirror
//!
//! Canonical records produced by the import pipeline. Field names are
//! camelCase on the wire so the caller can persist results as-is.

pub mod activity;
pub mod book;
pub mod outcome;
pub mod shelf;

pub use activity::{ActivityEntry, ActivityRecord};
pub use book::{Book, ShelfInfo};
pub use outcome::{ImportOutcome, ImportRequest};
pub use shelf::{ShelfStatus, ShelfSyncState};
