//! Ordered-collection paginator
//!
//! Walks a `first` → `next` page chain, accumulating raw items. A
//! visited-URL set terminates the walk if a malformed or malicious server
//! links back to an earlier page; that guard is a correctness requirement,
//! not an optimization.

use crate::error::Result;
use crate::services::fetcher::ActivityPubClient;
use crate::utils::urls::canonicalize_link;
use crate::utils::unwrap_first_link;
use serde_json::Value;
use std::collections::HashSet;

/// Collect items from an ordered collection starting at `first_link`.
///
/// `limit` bounds the total item count eagerly (activity scans); `None`
/// walks every linked page (shelf collections). Pages prefer
/// `orderedItems` over `items`. The walk stops on the limit, a 304, or a
/// `next` link that is absent, null, or already visited.
pub async fn collect_pages(
    client: &ActivityPubClient,
    instance_base: &str,
    first_link: &str,
    limit: Option<usize>,
) -> Result<Vec<Value>> {
    let mut results = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut next_url = canonicalize_link(instance_base, first_link);

    while let Some(url) = next_url {
        if !visited.insert(url.clone()) {
            tracing::warn!(url = %url, "pagination cycle detected; stopping walk");
            break;
        }
        if limit.is_some_and(|cap| results.len() >= cap) {
            break;
        }

        let outcome = client.fetch(&url, None, &[]).await?;
        if outcome.is_not_modified() {
            break;
        }
        let page = match outcome.body {
            Some(page) => page,
            None => break,
        };

        let items = page
            .get("orderedItems")
            .and_then(Value::as_array)
            .or_else(|| page.get("items").and_then(Value::as_array));

        if let Some(items) = items {
            for item in items {
                results.push(item.clone());
                if limit.is_some_and(|cap| results.len() >= cap) {
                    break;
                }
            }
        }

        next_url = page
            .get("next")
            .and_then(unwrap_first_link)
            .and_then(|link| canonicalize_link(instance_base, &link));
    }

    tracing::debug!(
        first = %first_link,
        pages = visited.len(),
        items = results.len(),
        "collection walk complete"
    );

    Ok(results)
}
