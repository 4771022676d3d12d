//! shelfmirror - command-line import runner
//!
//! Runs one import against a Bookwyrm instance and prints the result as
//! JSON. With `--state-file`, prior per-shelf sync state is loaded before
//! the run and the refreshed state written back afterwards, enabling
//! incremental re-sync via conditional requests.

use anyhow::{Context, Result};
use clap::Parser;
use shelfmirror::models::ShelfSyncState;
use shelfmirror::{ImporterConfig, ImportOrchestrator, ImportRequest};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shelfmirror", version, about = "Mirror Bookwyrm shelves into a local library")]
struct Cli {
    /// Instance domain, e.g. bookwyrm.social
    #[arg(long, env = "SHELFMIRROR_INSTANCE")]
    instance_domain: String,

    /// Username whose public shelves to import
    #[arg(long, env = "SHELFMIRROR_USERNAME")]
    username: String,

    /// Shelf slugs to synchronize (lowercase, trimmed)
    #[arg(long = "shelf", required = true)]
    shelves: Vec<String>,

    /// JSON file holding per-shelf sync state between runs
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Write the import result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!("shelfmirror {}", env!("CARGO_PKG_VERSION"));

    let shelf_state = match &cli.state_file {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading state file {}", path.display()))?;
            let state: HashMap<String, ShelfSyncState> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing state file {}", path.display()))?;
            info!(shelves = state.len(), "loaded prior shelf state");
            state
        }
        _ => HashMap::new(),
    };

    let orchestrator = ImportOrchestrator::new(ImporterConfig::from_env())?;
    let outcome = orchestrator
        .run(ImportRequest {
            instance_domain: cli.instance_domain,
            username: cli.username,
            shelves: cli.shelves,
            shelf_state,
        })
        .await?;

    info!(
        books = outcome.books.len(),
        shelves = outcome.shelf_states.len(),
        "import finished"
    );

    if let Some(path) = &cli.state_file {
        let serialized = serde_json::to_string_pretty(&outcome.shelf_states)?;
        std::fs::write(path, serialized)
            .with_context(|| format!("writing state file {}", path.display()))?;
        info!(path = %path.display(), "shelf state saved");
    }

    let rendered = serde_json::to_string_pretty(&outcome)?;
    match &cli.output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("writing output {}", path.display()))?;
            info!(path = %path.display(), "result written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
