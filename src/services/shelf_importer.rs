//! Shelf importer
//!
//! One shelf per call, as a small state machine:
//! Requested → Fetching → {NotModified, Empty, Updated}.
//!
//! The conditional fetch short-circuits unchanged shelves; otherwise the
//! shelf's ordered collection is paginated, every item resolved to an
//! edition, and the editions normalized into books. Every terminal state
//! emits a refreshed `ShelfSyncState` for the caller to persist.

use crate::error::Result;
use crate::models::{Book, ShelfInfo, ShelfStatus, ShelfSyncState};
use crate::services::fetcher::{ActivityPubClient, ConditionalHeaders};
use crate::services::normalizer::normalize_edition;
use crate::services::paginator::collect_pages;
use crate::services::resolver::EditionResolver;
use crate::utils::unwrap_first_link;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Books plus refreshed sync state for one shelf
#[derive(Debug)]
pub struct ShelfImportOutput {
    pub books: Vec<Book>,
    pub state: ShelfSyncState,
}

/// Synchronize one shelf.
///
/// `resolver` is shared across all shelves of a run so repeated editions
/// cost one fetch. `checked_at` is the run's single sync timestamp.
#[allow(clippy::too_many_arguments)]
pub async fn import_shelf(
    client: &ActivityPubClient,
    instance_base: &str,
    instance_domain: &str,
    username: &str,
    slug: &str,
    prior: Option<&ShelfSyncState>,
    resolver: &mut EditionResolver,
    checked_at: DateTime<Utc>,
) -> Result<ShelfImportOutput> {
    let shelf_url = format!("{}/user/{}/shelf/{}.json", instance_base, username, slug);

    let conditional = ConditionalHeaders {
        etag: prior.and_then(|p| p.etag.clone()),
        last_modified: prior.and_then(|p| p.last_modified.clone()),
    };

    let outcome = client.fetch(&shelf_url, Some(&conditional), &[]).await?;

    // Prefer fresh caching headers; a 304 typically omits them, in which
    // case the stored values stay valid.
    let etag = outcome
        .etag
        .clone()
        .or_else(|| prior.and_then(|p| p.etag.clone()));
    let last_modified = outcome
        .last_modified
        .clone()
        .or_else(|| prior.and_then(|p| p.last_modified.clone()));
    let name = outcome
        .body
        .as_ref()
        .and_then(|b| b.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| prior.map(|p| p.name.clone()))
        .unwrap_or_else(|| slug.to_string());

    if outcome.is_not_modified() {
        tracing::info!(shelf = %slug, "shelf unchanged; skipping pagination");
        return Ok(ShelfImportOutput {
            books: Vec::new(),
            state: ShelfSyncState {
                etag,
                last_modified,
                item_count: prior.map(|p| p.item_count).unwrap_or(0),
                name,
                status: ShelfStatus::NotModified,
                checked_at,
            },
        });
    }

    let first_link = outcome
        .body
        .as_ref()
        .and_then(|b| b.get("first"))
        .and_then(unwrap_first_link);

    let Some(first_link) = first_link else {
        tracing::info!(shelf = %slug, "shelf exposes no first page; empty shelf");
        return Ok(ShelfImportOutput {
            books: Vec::new(),
            state: ShelfSyncState {
                etag,
                last_modified,
                item_count: 0,
                name,
                status: ShelfStatus::Updated,
                checked_at,
            },
        });
    };

    let items = collect_pages(client, instance_base, &first_link, None).await?;

    let shelf_info = ShelfInfo {
        slug: slug.to_string(),
        name: name.clone(),
    };

    let mut resolved_count = 0usize;
    let mut books = Vec::new();
    for item in &items {
        // Unresolvable items are dropped, never fatal.
        let Some(edition) = resolver.resolve(item).await? else {
            tracing::debug!(shelf = %slug, "skipping unresolvable collection item");
            continue;
        };
        resolved_count += 1;
        if let Some(book) = normalize_edition(&edition, &shelf_info, instance_domain) {
            books.push(book);
        }
    }

    tracing::info!(
        shelf = %slug,
        items = items.len(),
        editions = resolved_count,
        books = books.len(),
        "shelf imported"
    );

    Ok(ShelfImportOutput {
        books,
        state: ShelfSyncState {
            etag,
            last_modified,
            item_count: resolved_count,
            name,
            status: ShelfStatus::Updated,
            checked_at,
        },
    })
}
