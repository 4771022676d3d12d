//! Per-shelf synchronization state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal state of one shelf synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShelfStatus {
    /// Shelf content was (re)fetched this run
    #[serde(rename = "updated")]
    Updated,
    /// Server answered 304; prior import remains valid
    #[serde(rename = "not-modified")]
    NotModified,
}

/// Caching metadata for one shelf, refreshed on every run
///
/// The caller persists this between runs and feeds it back as prior state so
/// the next run can issue conditional requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelfSyncState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Editions resolved for this shelf in the run that produced this state
    pub item_count: usize,
    /// Display name reported by the instance (slug when unknown)
    pub name: String,
    pub status: ShelfStatus,
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_form() {
        assert_eq!(
            serde_json::to_string(&ShelfStatus::Updated).unwrap(),
            "\"updated\""
        );
        assert_eq!(
            serde_json::to_string(&ShelfStatus::NotModified).unwrap(),
            "\"not-modified\""
        );
    }
}
