//! Catalogue queries
//!
//! - [`search`] - case-insensitive substring search over title, cast,
//!   director and description, in that priority, without duplicates
//! - [`Recommender`] - conjunctive preference filter followed by a uniform
//!   random sample of at most [`RecommendConfig::limit`] titles

use rand::rngs::StdRng;
use rand::{seq::index, SeedableRng};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::record::{ContentKind, ContentRecord};
use crate::{Error, Result};

/// Default number of titles returned by a recommendation
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Searchable fields, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Cast,
    Director,
    Description,
}

impl SearchField {
    pub const PRIORITY: [SearchField; 4] = [
        SearchField::Title,
        SearchField::Cast,
        SearchField::Director,
        SearchField::Description,
    ];

    fn text<'a>(&self, record: &'a ContentRecord) -> Cow<'a, str> {
        match self {
            SearchField::Title => Cow::Borrowed(&record.title),
            SearchField::Cast => Cow::Owned(record.cast_text()),
            SearchField::Director => Cow::Owned(record.director_text()),
            SearchField::Description => Cow::Borrowed(&record.description),
        }
    }
}

/// A search result together with the highest-priority field it matched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit<'a> {
    pub field: SearchField,
    pub record: &'a ContentRecord,
}

/// Search and report which field each record matched on.
pub fn search_hits<'a>(records: &'a [ContentRecord], query: &str) -> Vec<SearchHit<'a>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut taken = vec![false; records.len()];
    let mut hits = Vec::new();

    for field in SearchField::PRIORITY {
        for (i, record) in records.iter().enumerate() {
            if taken[i] {
                continue;
            }
            if field.text(record).to_lowercase().contains(&needle) {
                taken[i] = true;
                hits.push(SearchHit { field, record });
            }
        }
    }

    hits
}

/// Records matching `query`: title matches in record order, then cast,
/// director and description matches not already listed.
///
/// A blank query returns nothing.
pub fn search<'a>(records: &'a [ContentRecord], query: &str) -> Vec<&'a ContentRecord> {
    search_hits(records, query).into_iter().map(|hit| hit.record).collect()
}

/// Viewer preferences. Every set criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub kind: Option<ContentKind>,
    /// Case-insensitive substring of the joined genre listing
    pub genre: Option<String>,
    /// Case-insensitive exact rating
    pub rating: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Preferences {
    #[must_use]
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && non_blank(self.genre.as_deref()).is_none()
            && non_blank(self.rating.as_deref()).is_none()
    }

    pub fn matches(&self, record: &ContentRecord) -> bool {
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }

        if let Some(genre) = non_blank(self.genre.as_deref()) {
            let listing = record.genre_text().to_lowercase();
            if !listing.contains(&genre.to_lowercase()) {
                return false;
            }
        }

        if let Some(rating) = non_blank(self.rating.as_deref()) {
            match record.rating.as_deref() {
                Some(r) if r.eq_ignore_ascii_case(rating) => {}
                _ => return false,
            }
        }

        true
    }

    /// All records satisfying the preferences, in record order
    pub fn candidates<'a>(&self, records: &'a [ContentRecord]) -> Vec<&'a ContentRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendConfig {
    pub limit: usize,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMENDATIONS,
        }
    }
}

impl RecommendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(Error::InvalidConfig("recommendation limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "titles", rename_all = "snake_case")]
pub enum Recommendation<'a> {
    Picks(Vec<&'a ContentRecord>),
    NoMatch,
}

impl<'a> Recommendation<'a> {
    pub fn is_no_match(&self) -> bool {
        matches!(self, Recommendation::NoMatch)
    }

    pub fn picks(&self) -> &[&'a ContentRecord] {
        match self {
            Recommendation::Picks(picks) => picks,
            Recommendation::NoMatch => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.picks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks().is_empty()
    }
}

/// Preference filter with a reseedable random sampler
#[derive(Debug, Clone)]
pub struct Recommender {
    rng: StdRng,
    config: RecommendConfig,
}

impl Recommender {
    /// Seeded from the operating system
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            config: RecommendConfig::default(),
        }
    }

    /// Deterministic sampler for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config: RecommendConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RecommendConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> RecommendConfig {
        self.config
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Pick up to `limit` distinct candidates, uniformly without replacement.
    ///
    /// Fewer candidates than the limit are all returned, in sampled order.
    pub fn recommend<'a>(
        &mut self,
        records: &'a [ContentRecord],
        preferences: &Preferences,
    ) -> Recommendation<'a> {
        let candidates = preferences.candidates(records);
        if candidates.is_empty() {
            return Recommendation::NoMatch;
        }

        let amount = self.config.limit.min(candidates.len());
        let picks = index::sample(&mut self.rng, candidates.len(), amount)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        Recommendation::Picks(picks)
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new()
    }
}
