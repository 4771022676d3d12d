//! Edition normalization and content fingerprinting
//!
//! Turns a raw edition document into a canonical `Book`, attaches the
//! reader's activity record when one matches, and builds the deterministic
//! embedding-input text whose SHA-256 digest decides downstream whether a
//! cached embedding vector is still valid.

use crate::models::{ActivityRecord, Book, ShelfInfo};
use crate::utils::urls::{clean_url, ensure_json_url};
use crate::utils::{strip_html, unwrap_first_link};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

const ISBN10_KEYS: &[&str] = &["isbn", "isbn_10", "isbn10"];
const ISBN13_KEYS: &[&str] = &["isbn_13", "isbn13"];
const PUBLISHED_DATE_KEYS: &[&str] = &[
    "published_date",
    "publishedDate",
    "first_published_date",
    "firstPublishedDate",
];

/// Normalize a raw edition document into a `Book`.
///
/// Documents without an `id` are dropped: a synthetic identifier would feed
/// nondeterminism into the embedding input and break fingerprint stability.
pub fn normalize_edition(edition: &Value, shelf: &ShelfInfo, instance_domain: &str) -> Option<Book> {
    let id = edition
        .get("id")
        .and_then(Value::as_str)
        .and_then(clean_url)?
        .to_string();

    let title = string_field(edition, &["title", "name"]).unwrap_or_else(|| "Untitled".to_string());
    let subtitle = string_field(edition, &["subtitle"]);
    let authors = extract_author_names(edition);
    let author = authors
        .first()
        .cloned()
        .unwrap_or_else(|| "Unknown Author".to_string());

    let description = strip_html(
        &edition
            .get("description")
            .or_else(|| edition.get("summary"))
            .and_then(nested_text)
            .unwrap_or_default(),
    );

    Some(Book {
        url: id.clone(),
        id,
        title,
        subtitle,
        author,
        authors,
        shelf: shelf.slug.clone(),
        shelf_label: shelf.name.clone(),
        isbn: extract_isbn(edition, ISBN10_KEYS),
        isbn13: extract_isbn(edition, ISBN13_KEYS),
        cover_url: extract_cover(edition),
        description,
        subjects: extract_subjects(edition),
        published_date: string_field(edition, PUBLISHED_DATE_KEYS),
        work_id: edition.get("work").and_then(unwrap_first_link),
        instance_domain: instance_domain.to_string(),
        activity: None,
        embedding_input: String::new(),
        embedding_hash: String::new(),
    })
}

/// Attach a matching activity record, if the map knows this edition.
///
/// Match candidates are the canonical id and its `.json`-suffixed form.
pub fn attach_activity(book: &mut Book, activity: &HashMap<String, ActivityRecord>) {
    let candidates = [ensure_json_url(&book.id), Some(book.id.clone())];
    for candidate in candidates.into_iter().flatten() {
        if let Some(record) = activity.get(&candidate) {
            book.activity = Some(record.clone());
            return;
        }
    }
}

/// Compute and store `embedding_input` and `embedding_hash` for a book.
pub fn finalize_book(book: &mut Book) {
    book.embedding_input = build_embedding_input(book);
    book.embedding_hash = fingerprint(&book.embedding_input);
}

/// Build the ordered, labeled plain-text serialization of a book.
///
/// Absent fields omit their line entirely; no placeholder text. Any change
/// to title, description, subjects, shelf, or activity changes this text
/// and therefore the fingerprint.
pub fn build_embedding_input(book: &Book) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Title: {}.", book.title));

    if let Some(subtitle) = &book.subtitle {
        lines.push(format!("Subtitle: {}.", subtitle));
    }
    if !book.author.is_empty() {
        lines.push(format!("Author: {}.", book.author));
    }
    if book.authors.len() > 1 {
        lines.push(format!("Contributing authors: {}.", book.authors.join(", ")));
    }
    if !book.shelf_label.is_empty() {
        lines.push(format!("Shelf: {}.", book.shelf_label));
    }
    if let Some(date) = &book.published_date {
        lines.push(format!("Publication date: {}.", date));
    }
    if let Some(isbn) = &book.isbn {
        lines.push(format!("ISBN: {}.", isbn));
    }
    if let Some(isbn13) = &book.isbn13 {
        lines.push(format!("ISBN-13: {}.", isbn13));
    }
    if !book.subjects.is_empty() {
        lines.push(format!("Subjects: {}.", book.subjects.join(", ")));
    }
    if !book.description.is_empty() {
        lines.push(format!("Description: {}", book.description));
    }

    if let Some(activity) = &book.activity {
        if let Some(average) = activity.average_rating {
            if activity.ratings_count > 0 {
                let plural = if activity.ratings_count == 1 { "" } else { "s" };
                lines.push(format!(
                    "Personal average rating: {:.2} out of {}. ({} rating{} recorded.)",
                    average,
                    format_scale(activity.rating_scale_max),
                    activity.ratings_count,
                    plural
                ));
            }
        }

        if !activity.entries.is_empty() {
            lines.push("Recent personal activity:".to_string());
            for entry in activity.entries.iter().take(3) {
                let mut fragments = Vec::new();
                if let Some(rating) = entry.rating {
                    match entry.rating_scale_max.filter(|s| *s > 0.0) {
                        Some(scale) => {
                            fragments.push(format!("Rating: {:.1}/{:.1}.", rating, scale))
                        }
                        None => fragments.push(format!("Rating: {:.1}.", rating)),
                    }
                }
                if let Some(content) = &entry.content {
                    fragments.push(content.clone());
                }
                if let Some(published) = &entry.published_at {
                    fragments.push(format!("Logged on {}.", published));
                }
                if !fragments.is_empty() {
                    lines.push(fragments.join(" "));
                }
            }
        }
    }

    lines.join("\n")
}

/// SHA-256 hex digest of the embedding input.
pub fn fingerprint(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Render a rating scale bound the way the instance reports it: whole
/// numbers without a decimal point.
fn format_scale(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .filter_map(Value::as_str)
        .find_map(|s| clean_url(s).map(str::to_string))
}

fn nested_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => ["content", "summary", "value"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| v.as_str().map(str::to_string)),
        _ => None,
    }
}

fn extract_isbn(edition: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(raw) = edition.get(*key) {
            let text = match raw {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => continue,
            };
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn extract_author_names(edition: &Value) -> Vec<String> {
    let Some(authors) = edition.get("authors").and_then(Value::as_array) else {
        return Vec::new();
    };
    authors
        .iter()
        .filter_map(|author| match author {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map
                .get("name")
                .or_else(|| map.get("preferredName"))
                .and_then(Value::as_str),
            _ => None,
        })
        .filter_map(clean_url)
        .map(str::to_string)
        .collect()
}

fn extract_subjects(edition: &Value) -> Vec<String> {
    let subjects = edition
        .get("subjects")
        .or_else(|| edition.get("tags"))
        .and_then(Value::as_array);
    let Some(subjects) = subjects else {
        return Vec::new();
    };
    subjects
        .iter()
        .filter_map(|subject| match subject {
            Value::String(s) => Some(s.as_str()),
            Value::Object(map) => map.get("name").and_then(Value::as_str),
            _ => None,
        })
        .filter_map(clean_url)
        .map(str::to_string)
        .collect()
}

fn extract_cover(edition: &Value) -> Option<String> {
    match edition.get("cover") {
        Some(Value::String(s)) => clean_url(s).map(str::to_string),
        Some(Value::Object(map)) => map
            .get("url")
            .and_then(Value::as_str)
            .and_then(clean_url)
            .map(str::to_string),
        _ => None,
    }
}
