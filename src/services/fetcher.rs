//! ActivityPub resource fetcher
//!
//! Single conditional GET against a remote resource. 304 and explicitly
//! allowed statuses (a missing outbox, say) come back as body-less outcomes;
//! anything else non-2xx is fatal and carries the URL, status, and a
//! truncated response body for diagnostics.

use crate::config::ImporterConfig;
use crate::error::{ImportError, Result};
use crate::utils::truncate;
use serde_json::Value;

const ACTIVITY_STREAMS_ACCEPT: &str =
    "application/activity+json, application/ld+json; profile=\"https://www.w3.org/ns/activitystreams\"";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// Conditional request headers derived from prior sync state
#[derive(Debug, Clone, Default)]
pub struct ConditionalHeaders {
    /// Sent as `If-None-Match`
    pub etag: Option<String>,
    /// Sent as `If-Modified-Since`
    pub last_modified: Option<String>,
}

/// Outcome of one fetch
///
/// `body` is `None` for 304 and allowed-status responses.
#[derive(Debug)]
pub struct FetchOutcome {
    pub status: u16,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: Option<Value>,
}

impl FetchOutcome {
    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

/// HTTP client speaking the ActivityPub document flavor Bookwyrm serves
#[derive(Debug, Clone)]
pub struct ActivityPubClient {
    http: reqwest::Client,
}

impl ActivityPubClient {
    pub fn new(config: &ImporterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ImportError::Network {
                url: String::new(),
                detail: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { http })
    }

    /// Issue one GET, optionally conditional, tolerating `allowed_statuses`.
    pub async fn fetch(
        &self,
        url: &str,
        conditional: Option<&ConditionalHeaders>,
        allowed_statuses: &[u16],
    ) -> Result<FetchOutcome> {
        let mut request = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, ACTIVITY_STREAMS_ACCEPT);

        if let Some(cond) = conditional {
            if let Some(etag) = &cond.etag {
                request = request.header(reqwest::header::IF_NONE_MATCH, etag);
            }
            if let Some(last_modified) = &cond.last_modified {
                request = request.header(reqwest::header::IF_MODIFIED_SINCE, last_modified);
            }
        }

        tracing::debug!(url = %url, "fetching remote resource");

        let response = request.send().await.map_err(|e| ImportError::Network {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let etag = header_value(&response, reqwest::header::ETAG);
        let last_modified = header_value(&response, reqwest::header::LAST_MODIFIED);

        if status == 304 || allowed_statuses.contains(&status) {
            tracing::debug!(url = %url, status, "body-less outcome");
            return Ok(FetchOutcome {
                status,
                etag,
                last_modified,
                body: None,
            });
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImportError::RemoteResource {
                url: url.to_string(),
                status,
                body: truncate(&body, ERROR_BODY_PREVIEW_CHARS),
            });
        }

        let text = response.text().await.map_err(|e| ImportError::Network {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        let body: Value =
            serde_json::from_str(&text).map_err(|e| ImportError::MalformedResource {
                url: url.to_string(),
                detail: e.to_string(),
            })?;

        Ok(FetchOutcome {
            status,
            etag,
            last_modified,
            body: Some(body),
        })
    }

    /// Fetch a document that must exist and carry a body.
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let outcome = self.fetch(url, None, &[]).await?;
        outcome.body.ok_or_else(|| ImportError::RemoteResource {
            url: url.to_string(),
            status: outcome.status,
            body: String::new(),
        })
    }
}

fn header_value(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ActivityPubClient::new(&ImporterConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_conditional_headers_default_empty() {
        let cond = ConditionalHeaders::default();
        assert!(cond.etag.is_none());
        assert!(cond.last_modified.is_none());
    }
}
