//! Import request and result types

use crate::models::{ActivityRecord, Book, ShelfSyncState};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One import run's input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Instance domain, with or without scheme (`bookwyrm.social`)
    pub instance_domain: String,
    pub username: String,
    /// Shelf slugs to synchronize, caller-normalized (lowercase, trimmed)
    pub shelves: Vec<String>,
    /// Prior per-shelf sync state enabling conditional requests
    #[serde(default)]
    pub shelf_state: HashMap<String, ShelfSyncState>,
}

/// One import run's output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    /// Deduplicated books in shelf-request order, then remote page order
    pub books: Vec<Book>,
    /// Refreshed sync state for every requested shelf
    pub shelf_states: HashMap<String, ShelfSyncState>,
    /// Every aggregated activity record, keyed by canonical edition id
    pub activity_by_book: HashMap<String, ActivityRecord>,
}
