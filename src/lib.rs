//! shelfmirror - federated book-shelf importer and activity aggregator
//!
//! Mirrors a reader's public Bookwyrm shelves into canonical book records,
//! enriched with their own review and rating activity, and fingerprints
//! each record's embedding text so downstream semantic search knows when a
//! cached vector must be regenerated.
//!
//! The caller owns persistence: it feeds the prior per-shelf sync state
//! back in and stores the refreshed state, books, and activity map that
//! come out.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::ImporterConfig;
pub use crate::error::{ImportError, Result};
pub use crate::models::{
    ActivityEntry, ActivityRecord, Book, ImportOutcome, ImportRequest, ShelfStatus, ShelfSyncState,
};
pub use crate::services::ImportOrchestrator;
