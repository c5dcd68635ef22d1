//! # cinedex
//!
//! Analytics and query engine for streaming catalogues.
//!
//! cinedex derives typed records from a raw catalogue export and answers
//! analytical questions over them: ranked frequency breakdowns, two-key
//! cross-tabulations, description keywords, value co-occurrence, prioritised
//! search and sampled recommendations.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! cinedex --input titles.json count genre --top 10
//! cinedex --input titles.json recommend --kind movie --rating PG
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use cinedex::prelude::*;
//!
//! let catalogue = load_catalogue("titles.json").unwrap();
//!
//! // Ranked frequency breakdown
//! let genres = catalogue.genres();
//! for (genre, count) in genres.top(10) {
//!     println!("{genre}: {count}");
//! }
//!
//! // Prioritised search
//! let hits = catalogue.search("smith");
//!
//! // Up to five random picks
//! let picks = catalogue.recommend(&Preferences::default().with_kind(ContentKind::Movie));
//! ```
//!
//! ## Crate Structure
//!
//! - [`cinedex-core`](https://docs.rs/cinedex-core) - Record model, derivation, counting, text statistics, queries
//! - [`cinedex-ingest`](https://docs.rs/cinedex-ingest) - JSON / JSON Lines loading with column validation

// Re-export core types
pub use cinedex_core::{
    Bucket, Catalogue, ContentKind, ContentRecord, Counts, CrossTab, Duration, Error,
    ListField, Pair, PairCount, Preferences, RawRecord, RecommendConfig, Recommendation,
    Recommender, Result, SearchField, TermCount, TextConfig,
};

// Re-export ingestion
pub use cinedex_ingest::{load_catalogue, load_path, InputFormat};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Bucket, Catalogue, ContentKind, ContentRecord, Counts, CrossTab, Error, ListField, Pair,
        PairCount, Preferences, RawRecord, Recommendation, Result, TermCount, TextConfig,
        load_catalogue, load_path,
    };
}

/// Counting primitives for custom reports
pub mod aggregate {
    pub use cinedex_core::aggregate::{count_by, count_fan_out, cross_tabulate, cross_tabulate_fan_out};
}
