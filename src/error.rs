//! Error types for shelfmirror
//!
//! Required-path failures (shelf, edition, work fetches) are fatal to the
//! import run and propagate to the caller unretried. Soft conditions
//! (unresolvable collection items, activity aggregation problems) are
//! handled at the component that observes them and never appear here.

use thiserror::Error;

/// Result type for importer operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Fatal importer errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// Remote server answered a required fetch with an unexpected status
    #[error("remote resource {url} returned status {status}: {body}")]
    RemoteResource {
        url: String,
        status: u16,
        /// Response body, truncated for log hygiene
        body: String,
    },

    /// Response body was not a well-formed ActivityPub document
    #[error("malformed resource at {url}: {detail}")]
    MalformedResource { url: String, detail: String },

    /// Transport-level failure (DNS, connect, timeout)
    #[error("network error for {url}: {detail}")]
    Network { url: String, detail: String },

    /// Import request rejected before any network activity
    #[error("invalid import request: {0}")]
    Validation(String),
}
