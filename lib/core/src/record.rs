use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A catalogue row as supplied by ingestion, before any field is derived.
///
/// Every field is optional: a missing cell is a `None`, never a rejected row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub country: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub listed_in: Option<String>,
    pub cast: Option<String>,
    pub director: Option<String>,
    pub description: Option<String>,
    pub date_added: Option<String>,
}

impl RawRecord {
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    #[must_use]
    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    #[must_use]
    pub fn with_rating(mut self, rating: impl Into<String>) -> Self {
        self.rating = Some(rating.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    #[must_use]
    pub fn with_genres(mut self, listed_in: impl Into<String>) -> Self {
        self.listed_in = Some(listed_in.into());
        self
    }

    #[must_use]
    pub fn with_cast(mut self, cast: impl Into<String>) -> Self {
        self.cast = Some(cast.into());
        self
    }

    #[must_use]
    pub fn with_director(mut self, director: impl Into<String>) -> Self {
        self.director = Some(director.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_date_added(mut self, date_added: impl Into<String>) -> Self {
        self.date_added = Some(date_added.into());
        self
    }
}

/// Whether a title is a movie or an episodic series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentKind {
    Movie,
    #[serde(rename = "TV Show")]
    Series,
}

impl ContentKind {
    /// Anything other than exactly `"Movie"` is a series.
    #[inline]
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("Movie") => ContentKind::Movie,
            _ => ContentKind::Series,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Movie => "Movie",
            ContentKind::Series => "TV Show",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" | "movies" => Ok(ContentKind::Movie),
            "series" | "show" | "tv show" | "tv" => Ok(ContentKind::Series),
            other => Err(format!("unknown content kind: {}", other)),
        }
    }
}

/// Parsed runtime: minutes for films, a season count for series, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Duration {
    Minutes(u32),
    Seasons(u32),
    Unknown,
}

impl Duration {
    #[inline]
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Duration::Minutes(m) => Some(*m),
            _ => None,
        }
    }

    #[inline]
    pub fn seasons(&self) -> Option<u32> {
        match self {
            Duration::Seasons(s) => Some(*s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Duration::Unknown)
    }
}

/// A fully derived catalogue entry. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    pub title: String,
    pub description: String,
    pub kind: ContentKind,
    pub country: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<String>,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: Vec<String>,
    pub date_added: Option<NaiveDate>,
    pub year_added: Option<i32>,
    pub month_added: Option<String>,
    pub day_added: Option<String>,
    pub duration: Duration,
}

impl ContentRecord {
    #[inline]
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration.minutes()
    }

    #[inline]
    pub fn seasons(&self) -> Option<u32> {
        self.duration.seasons()
    }

    #[inline]
    pub fn is_movie(&self) -> bool {
        self.kind == ContentKind::Movie
    }

    /// Genres joined the way they appeared in the source listing
    pub fn genre_text(&self) -> String {
        self.genres.join(", ")
    }

    pub fn cast_text(&self) -> String {
        self.cast.join(", ")
    }

    pub fn director_text(&self) -> String {
        self.director.join(", ")
    }
}
