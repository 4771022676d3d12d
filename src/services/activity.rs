//! Activity aggregator
//!
//! Scans the user's outbox for review/rating activity, groups entries by
//! the edition they reference, and computes per-edition rating statistics
//! plus a trimmed recent-entry list. Enrichment is best-effort: the
//! orchestrator substitutes an empty map when anything here fails, so
//! activity problems never abort an import.

use crate::error::Result;
use crate::models::{ActivityEntry, ActivityRecord};
use crate::services::fetcher::ActivityPubClient;
use crate::services::paginator::collect_pages;
use crate::utils::urls::{canonicalize_link, clean_url, ensure_json_url};
use crate::utils::{strip_html, truncate, unwrap_first_link};
use serde_json::Value;
use std::collections::HashMap;

/// Fields that may hold the referenced edition, checked in order
const EDITION_REF_KEYS: &[&str] = &["inReplyToBook", "book", "inReplyTo"];

const CONTENT_CAP_CHARS: usize = 600;
const DEFAULT_SCALE_MIN: f64 = 0.0;
const DEFAULT_SCALE_MAX: f64 = 5.0;

/// A rating extracted from one of the remote shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingInfo {
    pub value: f64,
    pub scale_min: f64,
    pub scale_max: f64,
}

/// Scan the outbox and build the edition → activity map.
///
/// A 404 outbox or one without a `first` page is an expected condition on
/// minimal profiles and yields an empty map.
pub async fn aggregate_activity(
    client: &ActivityPubClient,
    instance_base: &str,
    username: &str,
    scan_limit: usize,
    entries_kept: usize,
) -> Result<HashMap<String, ActivityRecord>> {
    let outbox_url = format!("{}/user/{}/outbox.json", instance_base, username);
    let outcome = client.fetch(&outbox_url, None, &[404]).await?;

    let Some(outbox) = outcome.body else {
        tracing::debug!(url = %outbox_url, status = outcome.status, "no outbox; skipping activity");
        return Ok(HashMap::new());
    };
    let Some(first_link) = outbox.get("first").and_then(unwrap_first_link) else {
        return Ok(HashMap::new());
    };

    let activities = collect_pages(client, instance_base, &first_link, Some(scan_limit)).await?;

    let mut builders: HashMap<String, RecordBuilder> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for activity in &activities {
        let Some((edition_id, entry)) = build_activity_entry(activity, instance_base) else {
            continue;
        };
        if !builders.contains_key(&edition_id) {
            order.push(edition_id.clone());
        }
        builders.entry(edition_id).or_default().push(entry);
    }

    let mut aggregated = HashMap::with_capacity(builders.len());
    for edition_id in order {
        if let Some(builder) = builders.remove(&edition_id) {
            aggregated.insert(edition_id, builder.finish(entries_kept));
        }
    }

    tracing::info!(
        user = %username,
        scanned = activities.len(),
        editions = aggregated.len(),
        "activity aggregation complete"
    );

    Ok(aggregated)
}

/// Extract the referenced edition id and a normalized entry from one raw
/// outbox activity. Entries referencing nothing resolvable, or carrying
/// neither text nor a rating, yield `None` and are skipped.
pub fn build_activity_entry(activity: &Value, instance_base: &str) -> Option<(String, ActivityEntry)> {
    let object = activity.get("object").unwrap_or(activity);

    let edition_id = EDITION_REF_KEYS
        .iter()
        .filter_map(|key| object.get(*key))
        .filter_map(unwrap_first_link)
        .find_map(|link| canonicalize_link(instance_base, &link))?;

    let raw_text = object
        .get("content")
        .or_else(|| object.get("summary"))
        .or_else(|| object.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let content = truncate(&strip_html(raw_text), CONTENT_CAP_CHARS);
    let rating = extract_rating(object);

    if content.is_empty() && rating.is_none() {
        return None;
    }

    let entry_type = object
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "note".to_string());

    let published_at = ["published", "updated"]
        .iter()
        .filter_map(|key| object.get(*key))
        .chain(["published", "updated"].iter().filter_map(|key| activity.get(*key)))
        .find_map(|v| v.as_str().map(str::to_string));

    let activity_id = object
        .get("id")
        .or_else(|| activity.get("id"))
        .and_then(Value::as_str)
        .and_then(clean_url)
        .map(str::to_string);

    let url = object
        .get("url")
        .or_else(|| activity.get("url"))
        .and_then(Value::as_str)
        .and_then(clean_url)
        .map(str::to_string)
        .or_else(|| activity_id.clone());

    let entry = ActivityEntry {
        id: activity_id.as_deref().and_then(ensure_json_url),
        entry_type,
        published_at,
        content: if content.is_empty() { None } else { Some(content) },
        rating: rating.map(|r| r.value),
        rating_scale_min: rating.map(|r| r.scale_min),
        rating_scale_max: rating.map(|r| r.scale_max),
        url,
    };

    Some((edition_id, entry))
}

/// Extract a rating, tolerating the shapes instances emit: a bare number,
/// a nested object with `value`/`rating`/`score` and optional scale
/// bounds, or a top-level numeric `score` on the default 0–5 scale.
pub fn extract_rating(object: &Value) -> Option<RatingInfo> {
    let candidate = object
        .get("rating")
        .or_else(|| object.get("reviewRating"))
        .or_else(|| object.get("review_rating"));

    let candidate = match candidate {
        Some(Value::Null) | None => {
            let score = object.get("score").and_then(Value::as_f64)?;
            return Some(RatingInfo {
                value: score,
                scale_min: DEFAULT_SCALE_MIN,
                scale_max: DEFAULT_SCALE_MAX,
            });
        }
        Some(c) => c,
    };

    if let Some(value) = candidate.as_f64() {
        return Some(RatingInfo {
            value,
            scale_min: DEFAULT_SCALE_MIN,
            scale_max: DEFAULT_SCALE_MAX,
        });
    }

    let map = candidate.as_object()?;
    let value = ["value", "rating", "score"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(numeric)?;
    let scale_max = ["scaleMax", "max", "bestRating"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(numeric)
        .unwrap_or(DEFAULT_SCALE_MAX);
    let scale_min = ["scaleMin", "min", "worstRating"]
        .iter()
        .filter_map(|key| map.get(*key))
        .find_map(numeric)
        .unwrap_or(DEFAULT_SCALE_MIN);

    Some(RatingInfo {
        value,
        scale_min,
        scale_max,
    })
}

/// Numeric coercion: JSON numbers, or numeric strings some instances emit.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Round half away from zero to two decimals.
pub fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
struct RecordBuilder {
    entries: Vec<ActivityEntry>,
    ratings_count: u32,
    ratings_total: f64,
    review_count: u32,
    scale_min: Option<f64>,
    scale_max: Option<f64>,
    last_activity_at: Option<String>,
}

impl RecordBuilder {
    fn push(&mut self, entry: ActivityEntry) {
        if let Some(rating) = entry.rating {
            self.ratings_count += 1;
            self.ratings_total += rating;
            if entry.rating_scale_max.is_some() {
                self.scale_max = entry.rating_scale_max;
            }
            if entry.rating_scale_min.is_some() {
                self.scale_min = entry.rating_scale_min;
            }
        }

        if entry.entry_type == "review" && entry.content.is_some() {
            self.review_count += 1;
        }

        if let Some(published) = &entry.published_at {
            let newer = self
                .last_activity_at
                .as_ref()
                .map_or(true, |latest| published > latest);
            if newer {
                self.last_activity_at = Some(published.clone());
            }
        }

        self.entries.push(entry);
    }

    fn finish(mut self, entries_kept: usize) -> ActivityRecord {
        // Newest first; entries without a timestamp sort after all
        // timestamped ones. The sort is stable, preserving outbox order
        // among equals.
        self.entries.sort_by(|a, b| match (&a.published_at, &b.published_at) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some(a), Some(b)) => b.cmp(a),
        });
        self.entries.truncate(entries_kept);

        let average_rating = if self.ratings_count > 0 {
            Some(round_two_decimals(
                self.ratings_total / self.ratings_count as f64,
            ))
        } else {
            None
        };

        ActivityRecord {
            entries: self.entries,
            ratings_count: self.ratings_count,
            review_count: self.review_count,
            average_rating,
            rating_scale_min: self.scale_min.unwrap_or(DEFAULT_SCALE_MIN),
            rating_scale_max: self.scale_max.unwrap_or(DEFAULT_SCALE_MAX),
            last_activity_at: self.last_activity_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://bw.test";

    #[test]
    fn test_extract_rating_bare_number() {
        let rating = extract_rating(&json!({"rating": 4})).unwrap();
        assert_eq!(rating.value, 4.0);
        assert_eq!(rating.scale_max, 5.0);
        assert_eq!(rating.scale_min, 0.0);
    }

    #[test]
    fn test_extract_rating_nested_object() {
        let rating =
            extract_rating(&json!({"rating": {"value": 9, "scaleMax": 10, "scaleMin": 1}}))
                .unwrap();
        assert_eq!(rating.value, 9.0);
        assert_eq!(rating.scale_max, 10.0);
        assert_eq!(rating.scale_min, 1.0);
    }

    #[test]
    fn test_extract_rating_best_rating_alias() {
        let rating = extract_rating(&json!({"reviewRating": {"score": "3", "bestRating": 10}}))
            .unwrap();
        assert_eq!(rating.value, 3.0);
        assert_eq!(rating.scale_max, 10.0);
    }

    #[test]
    fn test_extract_rating_top_level_score_fallback() {
        let rating = extract_rating(&json!({"score": 2.5})).unwrap();
        assert_eq!(rating.value, 2.5);
        assert_eq!(rating.scale_max, 5.0);
    }

    #[test]
    fn test_extract_rating_absent() {
        assert_eq!(extract_rating(&json!({"content": "words"})), None);
        assert_eq!(extract_rating(&json!({"rating": "not a number"})), None);
    }

    #[test]
    fn test_build_entry_skips_unreferenced_and_empty() {
        // No edition reference at all.
        assert!(build_activity_entry(&json!({"object": {"content": "hi"}}), BASE).is_none());
        // Reference but neither text nor rating.
        let empty = json!({"object": {"inReplyToBook": "https://bw.test/book/1", "content": "<p> </p>"}});
        assert!(build_activity_entry(&empty, BASE).is_none());
    }

    #[test]
    fn test_build_entry_normalizes_reference_and_type() {
        let activity = json!({
            "type": "Create",
            "published": "2024-02-02T00:00:00Z",
            "object": {
                "type": "Review",
                "id": "https://bw.test/review/1",
                "inReplyToBook": {"id": "/book/7"},
                "content": "<p>Great stuff.</p>",
                "rating": {"value": 5, "scaleMax": 5}
            }
        });
        let (edition_id, entry) = build_activity_entry(&activity, BASE).unwrap();
        assert_eq!(edition_id, "https://bw.test/book/7.json");
        assert_eq!(entry.entry_type, "review");
        assert_eq!(entry.content.as_deref(), Some("Great stuff."));
        assert_eq!(entry.rating, Some(5.0));
        assert_eq!(entry.id.as_deref(), Some("https://bw.test/review/1.json"));
        // Object has no published; falls back to the activity's.
        assert_eq!(entry.published_at.as_deref(), Some("2024-02-02T00:00:00Z"));
    }

    #[test]
    fn test_record_builder_statistics() {
        let mut builder = RecordBuilder::default();
        for (rating, ts) in [(4.0, "2024-01-02"), (5.0, "2024-01-05"), (2.0, "2024-01-01")] {
            builder.push(ActivityEntry {
                id: None,
                entry_type: "rating".to_string(),
                published_at: Some(ts.to_string()),
                content: None,
                rating: Some(rating),
                rating_scale_min: Some(0.0),
                rating_scale_max: Some(5.0),
                url: None,
            });
        }
        let record = builder.finish(3);
        assert_eq!(record.ratings_count, 3);
        assert_eq!(record.average_rating, Some(3.67));
        assert_eq!(record.review_count, 0);
        assert_eq!(record.last_activity_at.as_deref(), Some("2024-01-05"));
        assert_eq!(record.entries[0].published_at.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_entries_sorted_newest_first_missing_timestamps_last() {
        let mut builder = RecordBuilder::default();
        for (content, ts) in [
            ("first", None),
            ("old", Some("2023-01-01")),
            ("new", Some("2024-01-01")),
            ("second", None),
        ] {
            builder.push(ActivityEntry {
                id: None,
                entry_type: "review".to_string(),
                published_at: ts.map(str::to_string),
                content: Some(content.to_string()),
                rating: None,
                rating_scale_min: None,
                rating_scale_max: None,
                url: None,
            });
        }
        let record = builder.finish(4);
        let order: Vec<_> = record
            .entries
            .iter()
            .map(|e| e.content.as_deref().unwrap())
            .collect();
        // Stable: the two undated entries keep their outbox order.
        assert_eq!(order, vec!["new", "old", "first", "second"]);
        assert_eq!(record.review_count, 4);
    }

    #[test]
    fn test_entries_truncated_to_recent() {
        let mut builder = RecordBuilder::default();
        for day in 1..=5 {
            builder.push(ActivityEntry {
                id: None,
                entry_type: "note".to_string(),
                published_at: Some(format!("2024-01-0{}", day)),
                content: Some(format!("entry {}", day)),
                rating: None,
                rating_scale_min: None,
                rating_scale_max: None,
                url: None,
            });
        }
        let record = builder.finish(3);
        assert_eq!(record.entries.len(), 3);
        assert_eq!(record.entries[0].content.as_deref(), Some("entry 5"));
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 2.375 is exactly representable; the tie rounds up, not to even.
        assert_eq!(round_two_decimals(2.375), 2.38);
        assert_eq!(round_two_decimals(11.0 / 3.0), 3.67);
        assert_eq!(round_two_decimals(4.0), 4.0);
    }
}
