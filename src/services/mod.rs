//! Import pipeline components
//!
//! Leaf-first: the fetcher issues conditional GETs, the paginator walks
//! ordered collections, the resolver turns loose references into edition
//! documents, the shelf importer and activity aggregator build the two
//! halves of a run, and the orchestrator merges them through the
//! normalizer.

pub mod activity;
pub mod fetcher;
pub mod importer;
pub mod normalizer;
pub mod paginator;
pub mod resolver;
pub mod shelf_importer;

pub use activity::aggregate_activity;
pub use fetcher::{ActivityPubClient, ConditionalHeaders, FetchOutcome};
pub use importer::ImportOrchestrator;
pub use normalizer::{build_embedding_input, fingerprint, normalize_edition};
pub use paginator::collect_pages;
pub use resolver::{classify, EditionRef, EditionResolver};
pub use shelf_importer::{import_shelf, ShelfImportOutput};
