//! Personal reading activity

use serde::{Deserialize, Serialize};

/// One user action (review, rating, note) referencing an edition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Lowercased remote object type ("review", "rating", "note", ...)
    #[serde(rename = "type")]
    pub entry_type: String,
    /// ISO-8601 timestamp as reported by the instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Plain text, length-capped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_scale_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating_scale_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Per-edition aggregate built from one outbox scan
///
/// `entries` holds at most the few most recent actions, newest first;
/// entries with no timestamp sort last. `average_rating` is the arithmetic
/// mean of all numeric ratings, rounded to two decimals half away from
/// zero, and is absent when no ratings were seen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub entries: Vec<ActivityEntry>,
    pub ratings_count: u32,
    pub review_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub rating_scale_min: f64,
    pub rating_scale_max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<String>,
}
