//! Importer configuration
//!
//! Tunables with sensible defaults; a couple of operational knobs can be
//! overridden through the environment for deployments that need them.

use std::time::Duration;
use tracing::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACTIVITY_SCAN_LIMIT: usize = 200;
const DEFAULT_MAX_RESOLVE_DEPTH: u8 = 3;
const DEFAULT_RECENT_ENTRIES_KEPT: usize = 3;

/// Runtime configuration for one importer instance
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Per-request deadline; remote instances must not hang the importer
    pub request_timeout: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Maximum outbox items scanned per run
    pub activity_scan_limit: usize,
    /// Recursion bound for Work → Edition → link indirection
    pub max_resolve_depth: u8,
    /// Recent activity entries kept per edition
    pub recent_entries_kept: usize,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: concat!("shelfmirror/", env!("CARGO_PKG_VERSION")).to_string(),
            activity_scan_limit: DEFAULT_ACTIVITY_SCAN_LIMIT,
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
            recent_entries_kept: DEFAULT_RECENT_ENTRIES_KEPT,
        }
    }
}

impl ImporterConfig {
    /// Build a config from defaults plus environment overrides
    ///
    /// `SHELFMIRROR_TIMEOUT_SECS` and `SHELFMIRROR_ACTIVITY_LIMIT` are
    /// honored when parseable; bad values fall back with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("SHELFMIRROR_TIMEOUT_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout = Duration::from_secs(secs),
                _ => warn!(value = %raw, "ignoring invalid SHELFMIRROR_TIMEOUT_SECS"),
            }
        }

        if let Ok(raw) = std::env::var("SHELFMIRROR_ACTIVITY_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => config.activity_scan_limit = limit,
                _ => warn!(value = %raw, "ignoring invalid SHELFMIRROR_ACTIVITY_LIMIT"),
            }
        }

        config
    }
}
