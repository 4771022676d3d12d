//! Canonical book records

use crate::models::ActivityRecord;
use serde::{Deserialize, Serialize};

/// Slug + display name of the shelf a book was imported from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfInfo {
    pub slug: String,
    pub name: String,
}

/// Normalized book record
///
/// Identity is `id` (the edition's canonical URI); ids are unique within one
/// import result. `embedding_hash` is always the SHA-256 hex digest of
/// `embedding_input` computed from this record's state; the pair must never
/// be persisted or compared independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Primary author display name
    pub author: String,
    pub authors: Vec<String>,
    /// Slug of the requested shelf this book came from
    pub shelf: String,
    pub shelf_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn13: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    /// Description with HTML stripped
    pub description: String,
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_id: Option<String>,
    pub url: String,
    pub instance_domain: String,
    /// Personal activity for this edition, when the outbox had any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityRecord>,
    /// Deterministic plain-text serialization handed to the embedding model
    pub embedding_input: String,
    /// SHA-256 hex digest of `embedding_input`
    pub embedding_hash: String,
}
