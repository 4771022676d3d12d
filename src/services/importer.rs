//! Import orchestrator
//!
//! Drives one import run: validates the request, launches the activity
//! scan concurrently, processes shelves sequentially over a shared edition
//! cache, deduplicates, merges activity through the normalizer, and
//! assembles the final outcome.

use crate::config::ImporterConfig;
use crate::error::{ImportError, Result};
use crate::models::{ActivityRecord, Book, ImportOutcome, ImportRequest, ShelfSyncState};
use crate::services::activity::aggregate_activity;
use crate::services::fetcher::ActivityPubClient;
use crate::services::normalizer::{attach_activity, finalize_book};
use crate::services::resolver::EditionResolver;
use crate::services::shelf_importer::import_shelf;
use crate::utils::urls::split_instance;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::task::JoinHandle;

/// One-run import orchestrator
pub struct ImportOrchestrator {
    config: ImporterConfig,
    client: ActivityPubClient,
}

impl ImportOrchestrator {
    pub fn new(config: ImporterConfig) -> Result<Self> {
        let client = ActivityPubClient::new(&config)?;
        Ok(Self { config, client })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(ImporterConfig::default())
    }

    /// Run one import across the requested shelf set.
    ///
    /// Required-path failures (shelf or edition fetches) abort the run with
    /// a single descriptive error; activity enrichment is best-effort and
    /// degrades to an empty map.
    pub async fn run(&self, request: ImportRequest) -> Result<ImportOutcome> {
        validate(&request)?;

        let (instance_base, instance_domain) = split_instance(&request.instance_domain);
        let checked_at = Utc::now();

        // The outbox scan only meets shelf processing again at the final
        // merge, so it runs on its own task from the start.
        let activity_task = self.spawn_activity_scan(&instance_base, &request.username);

        let mut resolver = EditionResolver::new(
            self.client.clone(),
            instance_base.clone(),
            self.config.max_resolve_depth,
        );

        let mut collected: Vec<Book> = Vec::new();
        let mut shelf_states: HashMap<String, ShelfSyncState> = HashMap::new();

        // Sequential on purpose: the resolver cache is warm for later
        // shelves and conditional-header state stays race-free.
        for slug in &request.shelves {
            let slug = slug.trim();
            if slug.is_empty() {
                continue;
            }
            let prior = request.shelf_state.get(slug);
            let output = match import_shelf(
                &self.client,
                &instance_base,
                &instance_domain,
                &request.username,
                slug,
                prior,
                &mut resolver,
                checked_at,
            )
            .await
            {
                Ok(output) => output,
                Err(e) => {
                    activity_task.abort();
                    return Err(e);
                }
            };
            collected.extend(output.books);
            shelf_states.insert(slug.to_string(), output.state);
        }

        let mut books = dedupe_by_id(collected);

        let activity_by_book = match activity_task.await {
            Ok(Ok(map)) => map,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "activity aggregation failed; continuing without it");
                HashMap::new()
            }
            Err(e) => {
                tracing::warn!(error = %e, "activity task did not complete; continuing without it");
                HashMap::new()
            }
        };

        for book in &mut books {
            attach_activity(book, &activity_by_book);
            finalize_book(book);
        }

        tracing::info!(
            books = books.len(),
            shelves = shelf_states.len(),
            activity_records = activity_by_book.len(),
            "import run complete"
        );

        Ok(ImportOutcome {
            books,
            shelf_states,
            activity_by_book,
        })
    }

    fn spawn_activity_scan(
        &self,
        instance_base: &str,
        username: &str,
    ) -> JoinHandle<Result<HashMap<String, ActivityRecord>>> {
        let client = self.client.clone();
        let instance_base = instance_base.to_string();
        let username = username.to_string();
        let scan_limit = self.config.activity_scan_limit;
        let entries_kept = self.config.recent_entries_kept;
        tokio::spawn(async move {
            aggregate_activity(&client, &instance_base, &username, scan_limit, entries_kept).await
        })
    }
}

fn validate(request: &ImportRequest) -> Result<()> {
    if request.instance_domain.trim().is_empty() {
        return Err(ImportError::Validation(
            "instanceDomain is required".to_string(),
        ));
    }
    if request.username.trim().is_empty() {
        return Err(ImportError::Validation("username is required".to_string()));
    }
    if request.shelves.iter().all(|s| s.trim().is_empty()) {
        return Err(ImportError::Validation(
            "at least one shelf must be provided".to_string(),
        ));
    }
    Ok(())
}

/// Drop cross-shelf duplicate editions; the first occurrence wins and
/// overall order is preserved.
fn dedupe_by_id(books: Vec<Book>) -> Vec<Book> {
    let mut seen: HashSet<String> = HashSet::with_capacity(books.len());
    books
        .into_iter()
        .filter(|book| seen.insert(book.id.clone()))
        .collect()
}
