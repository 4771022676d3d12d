//! URL canonicalization for federated resources
//!
//! Bookwyrm object identifiers come in several loosely normalized forms:
//! relative paths, absolute URLs, link objects (`{id}` / `{href}`), and
//! arrays of any of those. Everything that goes on the wire is first made
//! absolute against the instance base and given a `.json` suffix so the
//! server answers with the ActivityPub document rather than HTML.

use serde_json::Value;

/// Trim a candidate URL, rejecting empty strings.
pub fn clean_url(url: &str) -> Option<&str> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Split a caller-supplied instance address into (base URL, bare domain).
///
/// `bookwyrm.social` → (`https://bookwyrm.social`, `bookwyrm.social`);
/// an explicit `http://` prefix is honored so local instances and test
/// servers can be reached without TLS.
pub fn split_instance(input: &str) -> (String, String) {
    let trimmed = input.trim().trim_end_matches('/');
    if let Some(rest) = trimmed.strip_prefix("http://") {
        let domain = rest.trim_end_matches('/').to_string();
        (format!("http://{}", domain), domain)
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        let domain = rest.trim_end_matches('/').to_string();
        (format!("https://{}", domain), domain)
    } else {
        (format!("https://{}", trimmed), trimmed.to_string())
    }
}

/// Resolve a possibly-relative link against the instance base URL.
pub fn to_absolute_url(instance_base: &str, url: &str) -> Option<String> {
    let cleaned = clean_url(url)?;
    if cleaned.starts_with("http://") || cleaned.starts_with("https://") {
        return Some(cleaned.to_string());
    }
    Some(format!(
        "{}/{}",
        instance_base.trim_end_matches('/'),
        cleaned.trim_start_matches('/')
    ))
}

/// Append a `.json` suffix before the query string unless one is present.
pub fn ensure_json_url(url: &str) -> Option<String> {
    let cleaned = clean_url(url)?;
    if cleaned.contains(".json") {
        return Some(cleaned.to_string());
    }
    match cleaned.split_once('?') {
        Some((base, query)) => Some(format!("{}.json?{}", base, query)),
        None => Some(format!("{}.json", cleaned)),
    }
}

/// Canonical fetchable form of a link: absolute + `.json`-suffixed.
pub fn canonicalize_link(instance_base: &str, url: &str) -> Option<String> {
    to_absolute_url(instance_base, url).and_then(|abs| ensure_json_url(&abs))
}

/// Extract the first usable link from a loosely-typed reference value.
///
/// Accepts a bare string, a link object carrying `id` or `href`, or an
/// array whose first element is any of those.
pub fn unwrap_first_link(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_url(s).map(str::to_string),
        Value::Array(items) => items.first().and_then(unwrap_first_link),
        Value::Object(map) => {
            if let Some(Value::String(id)) = map.get("id") {
                return clean_url(id).map(str::to_string);
            }
            if let Some(Value::String(href)) = map.get("href") {
                return clean_url(href).map(str::to_string);
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_instance_strips_scheme_and_slashes() {
        let (base, domain) = split_instance("https://bookwyrm.social/");
        assert_eq!(base, "https://bookwyrm.social");
        assert_eq!(domain, "bookwyrm.social");

        let (base, domain) = split_instance("bookwyrm.social");
        assert_eq!(base, "https://bookwyrm.social");
        assert_eq!(domain, "bookwyrm.social");
    }

    #[test]
    fn test_split_instance_keeps_plain_http() {
        let (base, domain) = split_instance("http://127.0.0.1:4000");
        assert_eq!(base, "http://127.0.0.1:4000");
        assert_eq!(domain, "127.0.0.1:4000");
    }

    #[test]
    fn test_to_absolute_url() {
        assert_eq!(
            to_absolute_url("https://a.test", "/book/1").as_deref(),
            Some("https://a.test/book/1")
        );
        assert_eq!(
            to_absolute_url("https://a.test", "https://b.test/book/2").as_deref(),
            Some("https://b.test/book/2")
        );
        assert_eq!(to_absolute_url("https://a.test", "   "), None);
    }

    #[test]
    fn test_ensure_json_url_preserves_query() {
        assert_eq!(
            ensure_json_url("https://a.test/book/1?page=2").as_deref(),
            Some("https://a.test/book/1.json?page=2")
        );
        assert_eq!(
            ensure_json_url("https://a.test/book/1.json").as_deref(),
            Some("https://a.test/book/1.json")
        );
    }

    #[test]
    fn test_unwrap_first_link_variants() {
        assert_eq!(
            unwrap_first_link(&json!("https://a.test/x")).as_deref(),
            Some("https://a.test/x")
        );
        assert_eq!(
            unwrap_first_link(&json!({"id": "https://a.test/x"})).as_deref(),
            Some("https://a.test/x")
        );
        assert_eq!(
            unwrap_first_link(&json!({"href": "https://a.test/x"})).as_deref(),
            Some("https://a.test/x")
        );
        assert_eq!(
            unwrap_first_link(&json!([{"id": "https://a.test/x"}, "ignored"])).as_deref(),
            Some("https://a.test/x")
        );
        assert_eq!(unwrap_first_link(&json!(null)), None);
        assert_eq!(unwrap_first_link(&json!(42)), None);
    }
}
