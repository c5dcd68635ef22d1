//! Field derivation
//!
//! Turns [`RawRecord`]s into [`ContentRecord`]s. Each field is derived on its
//! own: a bad date or an unreadable duration degrades that one field to
//! `None`/[`Duration::Unknown`] and leaves the rest of the record intact.

use chrono::{Datelike, NaiveDate};

use crate::record::{ContentKind, ContentRecord, Duration, RawRecord};

/// Format of the `date_added` column, e.g. `September 25, 2021`
pub const DATE_ADDED_FORMAT: &str = "%B %d, %Y";

/// Separator used by the multi-valued columns (`listed_in`, `cast`, `director`)
pub const LIST_SEPARATOR: &str = ", ";

/// Derive every record, preserving input order.
pub fn derive(raw: &[RawRecord]) -> Vec<ContentRecord> {
    raw.iter().map(derive_record).collect()
}

pub fn derive_record(raw: &RawRecord) -> ContentRecord {
    let date_added = raw.date_added.as_deref().and_then(parse_date_added);

    ContentRecord {
        title: raw.title.as_deref().map(str::trim).unwrap_or_default().to_string(),
        description: raw.description.clone().unwrap_or_default(),
        kind: ContentKind::from_raw(raw.kind.as_deref()),
        country: clean_text(raw.country.as_deref()),
        release_year: raw.release_year,
        rating: clean_text(raw.rating.as_deref()),
        genres: split_list(raw.listed_in.as_deref()),
        cast: split_list(raw.cast.as_deref()),
        director: split_list(raw.director.as_deref()),
        date_added,
        year_added: date_added.map(|d| d.year()),
        month_added: date_added.map(|d| d.format("%B").to_string()),
        day_added: date_added.map(|d| d.format("%A").to_string()),
        duration: raw.duration.as_deref().map(parse_duration).unwrap_or(Duration::Unknown),
    }
}

/// Classify a free-text duration such as `"90 min"` or `"3 Seasons"`.
///
/// A string mentioning `min` yields minutes; otherwise one mentioning
/// `Season` yields a season count. The number is the leading
/// whitespace-delimited token. Anything else is [`Duration::Unknown`].
pub fn parse_duration(raw: &str) -> Duration {
    let leading = || raw.split_whitespace().next().and_then(|t| t.parse::<u32>().ok());

    if raw.contains("min") {
        leading().map(Duration::Minutes).unwrap_or(Duration::Unknown)
    } else if raw.contains("Season") {
        leading().map(Duration::Seasons).unwrap_or(Duration::Unknown)
    } else {
        Duration::Unknown
    }
}

/// Parse a `"Month Day, Year"` date, tolerating surrounding whitespace.
pub fn parse_date_added(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_ADDED_FORMAT).ok()
}

/// Split a comma-separated listing into trimmed, non-empty elements.
///
/// `None` and blank input both give an empty list.
pub fn split_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(text) => text
            .split(LIST_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn clean_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
