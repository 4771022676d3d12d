//! Edition resolver
//!
//! Shelf pages and activities reference editions in several shapes: a bare
//! link, an inline Edition, a Work pointing at its preferred edition, an
//! activity wrapper with an `object` field, or an untyped object that at
//! least carries an id. Each shape gets an explicit variant and its own
//! resolution branch. Resolved documents are cached per run so an edition
//! shared by several shelves costs one fetch.

use crate::error::Result;
use crate::services::fetcher::ActivityPubClient;
use crate::utils::urls::{canonicalize_link, clean_url};
use crate::utils::unwrap_first_link;
use serde_json::Value;
use std::collections::HashMap;

/// Field names under which a Work may declare its preferred edition
const PREFERRED_EDITION_KEYS: &[&str] = &["preferredEdition", "default_edition", "defaultEdition"];

/// Classification of one raw collection item
#[derive(Debug, Clone, PartialEq)]
pub enum EditionRef {
    /// Bare identifier string
    Link(String),
    /// Wrapper whose `object` field holds the real reference
    Wrapped(Value),
    /// Inline object already typed `Edition`
    Edition(Value),
    /// Object typed `Work`; resolve through its preferred edition
    Work(Value),
    /// Unknown type but carries an id worth fetching
    Identified(String),
    /// Nothing usable; the item is dropped, never an error
    Unresolvable,
}

/// Classify a raw reference into its resolution variant.
pub fn classify(value: &Value) -> EditionRef {
    if let Value::String(s) = value {
        return match clean_url(s) {
            Some(link) => EditionRef::Link(link.to_string()),
            None => EditionRef::Unresolvable,
        };
    }

    let Value::Object(map) = value else {
        return EditionRef::Unresolvable;
    };

    if let Some(inner) = map.get("object") {
        return EditionRef::Wrapped(inner.clone());
    }

    match map.get("type").and_then(Value::as_str) {
        Some("Edition") => return EditionRef::Edition(value.clone()),
        Some("Work") => return EditionRef::Work(value.clone()),
        _ => {}
    }

    match map.get("id").and_then(Value::as_str).and_then(clean_url) {
        Some(id) => EditionRef::Identified(id.to_string()),
        None => EditionRef::Unresolvable,
    }
}

/// Run-scoped resolver with an identifier → document cache
///
/// Owned by the orchestrator for the lifetime of one import run; repeated
/// or concurrent runs never share entries.
pub struct EditionResolver {
    client: ActivityPubClient,
    instance_base: String,
    max_depth: u8,
    cache: HashMap<String, Value>,
}

impl EditionResolver {
    pub fn new(client: ActivityPubClient, instance_base: String, max_depth: u8) -> Self {
        Self {
            client,
            instance_base,
            max_depth,
            cache: HashMap::new(),
        }
    }

    /// Resolve a raw reference to an edition document.
    ///
    /// `None` means the reference is unresolvable and should be skipped;
    /// remote fetch failures propagate as errors.
    pub async fn resolve(&mut self, value: &Value) -> Result<Option<Value>> {
        self.resolve_at(value, 0).await
    }

    async fn resolve_at(&mut self, value: &Value, depth: u8) -> Result<Option<Value>> {
        if depth >= self.max_depth {
            tracing::warn!(depth, "resolution depth bound hit; dropping reference");
            return Ok(None);
        }

        match classify(value) {
            EditionRef::Link(link) => self.fetch_and_follow(&link, depth).await,
            EditionRef::Wrapped(inner) => Box::pin(self.resolve_at(&inner, depth + 1)).await,
            EditionRef::Edition(edition) => {
                if let Some(id) = edition.get("id").and_then(Value::as_str) {
                    self.cache.insert(id.to_string(), edition.clone());
                }
                Ok(Some(edition))
            }
            EditionRef::Work(work) => {
                let preferred = PREFERRED_EDITION_KEYS
                    .iter()
                    .filter_map(|key| work.get(*key))
                    .find_map(unwrap_first_link);
                match preferred {
                    Some(link) => self.fetch_and_follow(&link, depth).await,
                    // A Work without a declared edition: fall back to its
                    // own document, which normalization handles generically.
                    None => match work.get("id").and_then(Value::as_str).and_then(clean_url) {
                        Some(id) => self.fetch_edition(id).await,
                        None => Ok(None),
                    },
                }
            }
            EditionRef::Identified(id) => self.fetch_and_follow(&id, depth).await,
            EditionRef::Unresolvable => Ok(None),
        }
    }

    /// Fetch by identifier, then follow one more hop if the fetched
    /// document turns out to be a Work rather than an Edition.
    async fn fetch_and_follow(&mut self, id: &str, depth: u8) -> Result<Option<Value>> {
        let Some(document) = self.fetch_edition(id).await? else {
            return Ok(None);
        };
        if document.get("type").and_then(Value::as_str) == Some("Work") {
            return Box::pin(self.resolve_at(&document, depth + 1)).await;
        }
        Ok(Some(document))
    }

    async fn fetch_edition(&mut self, id: &str) -> Result<Option<Value>> {
        let Some(id) = clean_url(id) else {
            return Ok(None);
        };
        if let Some(cached) = self.cache.get(id) {
            return Ok(Some(cached.clone()));
        }

        let Some(url) = canonicalize_link(&self.instance_base, id) else {
            return Ok(None);
        };
        let document = self.client.fetch_json(&url).await?;
        if let Some(doc_id) = document.get("id").and_then(Value::as_str) {
            self.cache.insert(doc_id.to_string(), document.clone());
        }
        Ok(Some(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_link() {
        assert_eq!(
            classify(&json!("https://a.test/book/1")),
            EditionRef::Link("https://a.test/book/1".to_string())
        );
        assert_eq!(classify(&json!("   ")), EditionRef::Unresolvable);
    }

    #[test]
    fn test_classify_wrapped_takes_priority_over_type() {
        let value = json!({"type": "Edition", "object": {"id": "https://a.test/book/1"}});
        match classify(&value) {
            EditionRef::Wrapped(inner) => {
                assert_eq!(inner["id"], "https://a.test/book/1");
            }
            other => panic!("expected Wrapped, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_typed_objects() {
        assert!(matches!(
            classify(&json!({"type": "Edition", "id": "x", "title": "T"})),
            EditionRef::Edition(_)
        ));
        assert!(matches!(
            classify(&json!({"type": "Work", "id": "x"})),
            EditionRef::Work(_)
        ));
    }

    #[test]
    fn test_classify_untyped_with_id_falls_back_to_fetch() {
        assert_eq!(
            classify(&json!({"id": "https://a.test/book/9"})),
            EditionRef::Identified("https://a.test/book/9".to_string())
        );
    }

    #[test]
    fn test_classify_rejects_garbage() {
        assert_eq!(classify(&json!(null)), EditionRef::Unresolvable);
        assert_eq!(classify(&json!(7)), EditionRef::Unresolvable);
        assert_eq!(classify(&json!({"name": "no id"})), EditionRef::Unresolvable);
    }
}
