// Keyword and co-occurrence statistics
use ahash::AHashSet;
use serde::Serialize;
use smallvec::SmallVec;

use crate::aggregate::Tally;
use crate::{Error, Result};

/// Common English words ignored by keyword statistics
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those", "i", "you", "he", "she", "it", "we", "they", "them", "their", "what",
    "which", "who", "when", "where", "why", "how", "all", "any", "both", "each", "few",
    "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so",
    "than", "too", "very", "just", "now",
];

/// Tokens shorter than this many characters are ignored
pub const DEFAULT_MIN_LENGTH: usize = 4;

/// Settings for keyword statistics
#[derive(Debug, Clone, PartialEq)]
pub struct TextConfig {
    pub stopwords: AHashSet<String>,
    pub min_length: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            min_length: DEFAULT_MIN_LENGTH,
        }
    }
}

impl TextConfig {
    /// Replace the stopword set. Words are case-folded to match tokens.
    #[must_use]
    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stopwords = stopwords.into_iter().map(|s| s.as_ref().to_lowercase()).collect();
        self
    }

    #[must_use]
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_length == 0 {
            return Err(Error::InvalidConfig("min_length must be at least 1".to_string()));
        }
        Ok(())
    }

    #[inline]
    fn keeps(&self, token: &str) -> bool {
        token.chars().count() >= self.min_length && !self.stopwords.contains(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// An unordered pair of distinct values, stored in lexical order
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pair(String, String);

impl Pair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            Pair(a, b)
        } else {
            Pair(b, a)
        }
    }

    pub fn first(&self) -> &str {
        &self.0
    }

    pub fn second(&self) -> &str {
        &self.1
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0 == value || self.1 == value
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} & {}", self.0, self.1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub pair: Pair,
    pub count: usize,
}

/// Lowercase, then split on whitespace. Punctuation stays attached.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Rank the terms of every item's text by frequency.
///
/// Ties are ordered by where the term first appears in the token stream,
/// walking items in order.
pub fn word_frequencies<T, F>(items: &[T], text: F, config: &TextConfig) -> Vec<TermCount>
where
    F: Fn(&T) -> &str,
{
    let mut tally = Tally::new();
    for item in items {
        for token in tokenize(text(item)) {
            if config.keeps(&token) {
                tally.bump(token);
            }
        }
    }

    tally
        .into_ranked()
        .into_iter()
        .map(|(term, count)| TermCount { term, count })
        .collect()
}

/// Count every unordered pair of distinct values sharing an item.
///
/// Repeated values within one item are collapsed first, so an item adds at
/// most one to each pair. Items with fewer than two distinct values are
/// skipped. Ranking matches [`word_frequencies`].
pub fn co_occurrences<T, F>(items: &[T], values: F) -> Vec<PairCount>
where
    F: Fn(&T) -> &[String],
{
    let mut tally = Tally::new();
    for item in items {
        let mut distinct: SmallVec<[&str; 8]> = SmallVec::new();
        for value in values(item) {
            if !distinct.contains(&value.as_str()) {
                distinct.push(value.as_str());
            }
        }
        if distinct.len() < 2 {
            continue;
        }

        for (i, a) in distinct.iter().enumerate() {
            for b in &distinct[i + 1..] {
                tally.bump(Pair::new(*a, *b));
            }
        }
    }

    tally
        .into_ranked()
        .into_iter()
        .map(|(pair, count)| PairCount { pair, count })
        .collect()
}
