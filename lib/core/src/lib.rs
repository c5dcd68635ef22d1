//! # cinedex Core
//!
//! Core library for the cinedex catalogue analytics engine.
//!
//! This crate provides the record model and every analytical operation:
//!
//! - [`RawRecord`] / [`ContentRecord`] - rows before and after field derivation
//! - [`fields`] - date, duration and list parsing with per-field degradation
//! - [`Counts`] / [`CrossTab`] - ranked single-key, fan-out and two-key counts
//! - [`text`] - keyword frequencies and value co-occurrence
//! - [`query`] - prioritised search and sampled recommendations
//! - [`Catalogue`] - the derived record set with every report attached
//!
//! ## Example
//!
//! ```rust
//! use cinedex_core::{Catalogue, ContentKind, Preferences, RawRecord};
//!
//! let raw = vec![
//!     RawRecord::new("Midnight Heist", "Movie")
//!         .with_release_year(2019)
//!         .with_rating("PG-13")
//!         .with_duration("110 min")
//!         .with_genres("Action & Adventure, Thrillers"),
//!     RawRecord::new("Harbour Lights", "TV Show")
//!         .with_duration("2 Seasons")
//!         .with_genres("British TV Shows"),
//! ];
//! let catalogue = Catalogue::from_raw(&raw).with_seed(7);
//!
//! assert_eq!(catalogue.content_kinds().get(&ContentKind::Movie), 1);
//! assert_eq!(catalogue.genres().get(&"Thrillers".to_string()), 1);
//!
//! let picks = catalogue.recommend(&Preferences::default().with_genre("thrill"));
//! assert_eq!(picks.len(), 1);
//! ```

pub mod aggregate;
pub mod catalogue;
pub mod fields;
pub mod error;
pub mod query;
pub mod record;
pub mod text;

pub use aggregate::{
    count_by, count_fan_out, cross_tabulate, cross_tabulate_fan_out, Bucket, Counts, CrossTab,
};
pub use catalogue::{Catalogue, DurationStats, DurationSummary, ListField, Overview, RatingRuntime};
pub use fields::{derive, derive_record, parse_date_added, parse_duration, split_list};
pub use error::{Error, Result};
pub use query::{
    search, search_hits, Preferences, RecommendConfig, Recommendation, Recommender, SearchField,
    SearchHit,
};
pub use record::{ContentKind, ContentRecord, Duration, RawRecord};
pub use text::{co_occurrences, word_frequencies, Pair, PairCount, TermCount, TextConfig};
