//! # cinedex Ingest
//!
//! Loads a catalogue export into [`RawRecord`](cinedex_core::RawRecord)s.
//!
//! Accepted inputs are a JSON array of row objects, or JSON Lines (one object
//! per line) for `.jsonl` / `.ndjson` files. Cells are read leniently: a
//! missing or unusable cell becomes `None` and is left to field derivation.
//! The one fatal condition is a required column that no row carries at all,
//! reported as [`Error::MissingColumns`](cinedex_core::Error::MissingColumns).

pub mod loader;

pub use loader::{
    from_reader, from_rows, load_catalogue, load_path, missing_columns, InputFormat,
    REQUIRED_COLUMNS,
};
