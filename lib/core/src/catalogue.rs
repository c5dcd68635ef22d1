use ahash::AHashMap;
use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregate::{
    count_by, count_fan_out, cross_tabulate, cross_tabulate_fan_out, Bucket, Counts, CrossTab,
};
use crate::fields::derive;
use crate::query::{self, Preferences, RecommendConfig, Recommendation, Recommender, SearchHit};
use crate::record::{ContentKind, ContentRecord, Duration, RawRecord};
use crate::text::{self, PairCount, TermCount, TextConfig};
use crate::Result;

/// Multi-valued record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListField {
    Genres,
    Cast,
    Director,
}

impl ListField {
    #[inline]
    pub fn values(self, record: &ContentRecord) -> &[String] {
        match self {
            ListField::Genres => &record.genres,
            ListField::Cast => &record.cast,
            ListField::Director => &record.director,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub min: u32,
    pub max: u32,
}

impl DurationStats {
    fn collect<I: IntoIterator<Item = u32>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0u64;
        let mut min = u32::MAX;
        let mut max = 0u32;
        for v in values {
            count += 1;
            sum += u64::from(v);
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| DurationStats {
            count,
            mean: sum as f64 / count as f64,
            min,
            max,
        })
    }
}

/// Runtime statistics: minutes for movies, seasons for series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationSummary {
    pub movie_minutes: Option<DurationStats>,
    pub series_seasons: Option<DurationStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRuntime {
    pub rating: Bucket<String>,
    pub mean_minutes: f64,
    pub titles: usize,
}

/// Headline single-key reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub titles: usize,
    pub content_kinds: Counts<ContentKind>,
    pub countries: Counts<String>,
    pub release_years: Vec<(Bucket<i32>, usize)>,
    pub ratings: Counts<String>,
    pub genres: Counts<String>,
    pub years_added: Vec<(Bucket<i32>, usize)>,
}

/// An immutable, derived catalogue and every report over it.
///
/// All reports are pure reads; the only interior state is the sampler behind
/// [`Catalogue::recommend`], so a catalogue can be shared across threads.
pub struct Catalogue {
    records: Vec<ContentRecord>,
    text: TextConfig,
    recommender: Mutex<Recommender>,
}

impl Catalogue {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records,
            text: TextConfig::default(),
            recommender: Mutex::new(Recommender::new()),
        }
    }

    /// Derive every raw row and build the catalogue.
    pub fn from_raw(raw: &[RawRecord]) -> Self {
        let records = derive(raw);
        let no_duration = records.iter().filter(|r| !r.duration.is_known()).count();
        let no_date = records.iter().filter(|r| r.date_added.is_none()).count();
        info!(
            "Derived {} records ({} without duration, {} without date added)",
            records.len(),
            no_duration,
            no_date
        );
        Self::new(records)
    }

    /// Use a deterministic sampler for recommendations
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        self.recommender.lock().reseed(seed);
        self
    }

    pub fn with_text_config(mut self, config: TextConfig) -> Result<Self> {
        config.validate()?;
        self.text = config;
        Ok(self)
    }

    pub fn with_recommend_config(self, config: RecommendConfig) -> Result<Self> {
        {
            let mut recommender = self.recommender.lock();
            *recommender = recommender.clone().with_config(config)?;
        }
        Ok(self)
    }

    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn text_config(&self) -> &TextConfig {
        &self.text
    }

    pub fn content_kinds(&self) -> Counts<ContentKind> {
        count_by(&self.records, |r| Some(r.kind))
    }

    pub fn countries(&self) -> Counts<String> {
        count_by(&self.records, |r| r.country.clone())
    }

    pub fn release_years(&self) -> Counts<i32> {
        count_by(&self.records, |r| r.release_year)
    }

    pub fn ratings(&self) -> Counts<String> {
        count_by(&self.records, |r| r.rating.clone())
    }

    pub fn years_added(&self) -> Counts<i32> {
        count_by(&self.records, |r| r.year_added)
    }

    pub fn months_added(&self) -> Counts<String> {
        count_by(&self.records, |r| r.month_added.clone())
    }

    /// Fan-out count over a multi-valued field
    pub fn list_counts(&self, field: ListField) -> Counts<String> {
        count_fan_out(&self.records, |r| field.values(r))
    }

    pub fn genres(&self) -> Counts<String> {
        self.list_counts(ListField::Genres)
    }

    pub fn cast(&self) -> Counts<String> {
        self.list_counts(ListField::Cast)
    }

    pub fn directors(&self) -> Counts<String> {
        self.list_counts(ListField::Director)
    }

    pub fn kind_by_release_year(&self) -> CrossTab<i32, ContentKind> {
        cross_tabulate(&self.records, |r| r.release_year, |r| Some(r.kind))
    }

    pub fn kind_by_country(&self) -> CrossTab<String, ContentKind> {
        cross_tabulate(&self.records, |r| r.country.clone(), |r| Some(r.kind))
    }

    pub fn rating_by_release_year(&self) -> CrossTab<i32, String> {
        cross_tabulate(&self.records, |r| r.release_year, |r| r.rating.clone())
    }

    pub fn kind_by_rating(&self) -> CrossTab<ContentKind, String> {
        cross_tabulate(&self.records, |r| Some(r.kind), |r| r.rating.clone())
    }

    pub fn director_by_kind(&self) -> CrossTab<String, ContentKind> {
        cross_tabulate_fan_out(&self.records, |r| r.director.as_slice(), |r| Some(r.kind))
    }

    pub fn genre_by_kind(&self) -> CrossTab<String, ContentKind> {
        cross_tabulate_fan_out(&self.records, |r| r.genres.as_slice(), |r| Some(r.kind))
    }

    /// The `top_n` most listed genres by release year, years ascending.
    pub fn genre_trends(&self, top_n: usize) -> CrossTab<String, i32> {
        let genres = self.genres();
        let top: Vec<&str> = genres.known().take(top_n).map(|(g, _)| g.as_str()).collect();

        let projected: Vec<(Vec<String>, Option<i32>)> = self
            .records
            .iter()
            .filter_map(|r| {
                let kept: Vec<String> = r
                    .genres
                    .iter()
                    .filter(|g| top.contains(&g.as_str()))
                    .cloned()
                    .collect();
                (!kept.is_empty()).then_some((kept, r.release_year))
            })
            .collect();

        cross_tabulate_fan_out(&projected, |p| p.0.as_slice(), |p| p.1)
            .top_rows(top_n)
            .sorted_columns()
    }

    /// Ranked description keywords under the catalogue's [`TextConfig`]
    pub fn keywords(&self) -> Vec<TermCount> {
        self.keywords_with(&self.text)
    }

    pub fn keywords_with(&self, config: &TextConfig) -> Vec<TermCount> {
        text::word_frequencies(&self.records, |r| r.description.as_str(), config)
    }

    /// Ranked pairs of values sharing a title
    pub fn co_occurrences(&self, field: ListField) -> Vec<PairCount> {
        text::co_occurrences(&self.records, |r| field.values(r))
    }

    pub fn duration_summary(&self) -> DurationSummary {
        DurationSummary {
            movie_minutes: DurationStats::collect(self.records.iter().filter_map(|r| {
                match (r.kind, r.duration) {
                    (ContentKind::Movie, Duration::Minutes(m)) => Some(m),
                    _ => None,
                }
            })),
            series_seasons: DurationStats::collect(self.records.iter().filter_map(|r| {
                match (r.kind, r.duration) {
                    (ContentKind::Series, Duration::Seasons(s)) => Some(s),
                    _ => None,
                }
            })),
        }
    }

    /// Mean movie runtime per rating, longest first
    pub fn average_runtime_by_rating(&self) -> Vec<RatingRuntime> {
        let mut slots: AHashMap<Bucket<String>, usize> = AHashMap::new();
        let mut sums: Vec<(Bucket<String>, u64, usize)> = Vec::new();

        for record in self.records.iter().filter(|r| r.is_movie()) {
            let Some(minutes) = record.duration_minutes() else {
                continue;
            };
            let key = Bucket::from(record.rating.clone());
            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                sums.push((key, 0, 0));
                sums.len() - 1
            });
            sums[slot].1 += u64::from(minutes);
            sums[slot].2 += 1;
        }

        let mut runtimes: Vec<RatingRuntime> = sums
            .into_iter()
            .map(|(rating, total, titles)| RatingRuntime {
                rating,
                mean_minutes: total as f64 / titles as f64,
                titles,
            })
            .collect();
        runtimes.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.mean_minutes)));
        runtimes
    }

    pub fn search(&self, query: &str) -> Vec<&ContentRecord> {
        let results = query::search(&self.records, query);
        debug!("Search {:?} matched {} titles", query, results.len());
        results
    }

    pub fn search_hits(&self, query: &str) -> Vec<SearchHit<'_>> {
        query::search_hits(&self.records, query)
    }

    pub fn recommend(&self, preferences: &Preferences) -> Recommendation<'_> {
        let outcome = self.recommender.lock().recommend(&self.records, preferences);
        debug!("Recommendation for {:?} returned {} titles", preferences, outcome.len());
        outcome
    }

    /// Reseed the recommendation sampler
    pub fn reseed(&self, seed: u64) {
        self.recommender.lock().reseed(seed);
    }

    /// The headline reports, computed in parallel
    pub fn overview(&self) -> Overview {
        let ((content_kinds, countries), ((release_years, ratings), (genres, years_added))) =
            rayon::join(
                || rayon::join(|| self.content_kinds(), || self.countries()),
                || {
                    rayon::join(
                        || rayon::join(|| self.release_years(), || self.ratings()),
                        || rayon::join(|| self.genres(), || self.years_added()),
                    )
                },
            );

        Overview {
            titles: self.len(),
            content_kinds,
            countries,
            release_years: release_years.sorted_by_key(),
            ratings,
            genres,
            years_added: years_added.sorted_by_key(),
        }
    }
}

impl std::fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalogue")
            .field("records", &self.records.len())
            .field("text", &self.text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_catalogue() -> Catalogue {
        let raw = vec![
            RawRecord::new("Midnight Heist", "Movie")
                .with_country("United States")
                .with_release_year(2019)
                .with_rating("PG-13")
                .with_duration("110 min")
                .with_genres("Action & Adventure, Thrillers")
                .with_director("Ana Ruiz, Ben Cole")
                .with_cast("Lee Park, Maya Chen")
                .with_description("A crew plans one final heist")
                .with_date_added("March 1, 2020"),
            RawRecord::new("Harbour Lights", "TV Show")
                .with_country("United Kingdom")
                .with_release_year(2019)
                .with_rating("TV-MA")
                .with_duration("2 Seasons")
                .with_genres("British TV Shows, Crime TV Shows")
                .with_cast("Maya Chen")
                .with_description("A detective returns to her harbour town")
                .with_date_added("April 3, 2021"),
            RawRecord::new("Paper Moons", "Movie")
                .with_country("United States")
                .with_release_year(2020)
                .with_rating("PG-13")
                .with_duration("90 min")
                .with_genres("Thrillers")
                .with_director("Ana Ruiz")
                .with_description("A heist goes wrong"),
            RawRecord::new("Unlisted", "Movie").with_duration("n/a"),
        ];
        Catalogue::from_raw(&raw).with_seed(11)
    }

    #[test]
    fn test_single_key_reports() {
        let catalogue = sample_catalogue();
        let kinds = catalogue.content_kinds();
        assert_eq!(kinds.get(&ContentKind::Movie), 3);
        assert_eq!(kinds.get(&ContentKind::Series), 1);
        assert_eq!(kinds.unknown(), 0);

        let countries = catalogue.countries();
        assert_eq!(countries.get(&"United States".to_string()), 2);
        assert_eq!(countries.unknown(), 1);
        assert_eq!(countries.total(), catalogue.len());

        let years = catalogue.release_years();
        assert_eq!(years.get(&2019), 2);
        assert_eq!(catalogue.years_added().unknown(), 2);
    }

    #[test]
    fn test_fan_out_reports() {
        let catalogue = sample_catalogue();
        let genres = catalogue.genres();
        assert_eq!(genres.get(&"Thrillers".to_string()), 2);
        assert_eq!(genres.get(&"Crime TV Shows".to_string()), 1);
        assert_eq!(genres.unknown(), 1);

        let directors = catalogue.directors();
        assert_eq!(directors.known().next(), Some((&"Ana Ruiz".to_string(), 2)));
    }

    #[test]
    fn test_cross_tab_reports() {
        let catalogue = sample_catalogue();
        let tab = catalogue.kind_by_release_year();
        assert_eq!(tab.get(&2019, &ContentKind::Movie), 1);
        assert_eq!(tab.get(&2019, &ContentKind::Series), 1);
        assert_eq!(tab.get(&2020, &ContentKind::Series), 0);
        assert_eq!(tab.row_totals(), catalogue.release_years());

        let directors = catalogue.director_by_kind();
        assert_eq!(directors.get(&"Ana Ruiz".to_string(), &ContentKind::Movie), 2);
        assert_eq!(directors.get(&"Ben Cole".to_string(), &ContentKind::Series), 0);
    }

    #[test]
    fn test_genre_trends() {
        let catalogue = sample_catalogue();
        let trends = catalogue.genre_trends(1);
        assert_eq!(trends.rows(), &[Bucket::Known("Thrillers".to_string())]);
        assert_eq!(trends.columns(), &[Bucket::Known(2019), Bucket::Known(2020)]);
        assert_eq!(trends.cells()[0], vec![1, 1]);
    }

    #[test]
    fn test_genre_trends_keep_ranking_order_on_ties() {
        let raw = vec![
            RawRecord::new("Dust Road", "Movie")
                .with_release_year(2021)
                .with_genres("Westerns"),
            RawRecord::new("Paper Sky", "Movie")
                .with_release_year(2018)
                .with_genres("Anime Features"),
        ];
        let trends = Catalogue::from_raw(&raw).genre_trends(2);
        assert_eq!(
            trends.rows(),
            &[
                Bucket::Known("Westerns".to_string()),
                Bucket::Known("Anime Features".to_string()),
            ]
        );
        assert_eq!(trends.columns(), &[Bucket::Known(2018), Bucket::Known(2021)]);
        assert_eq!(trends.cells(), &[vec![0, 1], vec![1, 0]]);
    }

    #[test]
    fn test_keywords_with_custom_config() {
        let catalogue = sample_catalogue();
        let short = TextConfig::default().with_min_length(3);
        let keywords = catalogue.keywords_with(&short);
        assert!(keywords.iter().any(|k| k.term == "one"));
        assert!(catalogue.keywords().iter().all(|k| k.term != "one"));
    }

    #[test]
    fn test_keywords_and_pairs() {
        let catalogue = sample_catalogue();
        let keywords = catalogue.keywords();
        assert_eq!(keywords[0].term, "heist");
        assert_eq!(keywords[0].count, 2);

        let pairs = catalogue.co_occurrences(ListField::Genres);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.count == 1));
    }

    #[test]
    fn test_duration_summary() {
        let summary = sample_catalogue().duration_summary();
        let movies = summary.movie_minutes.unwrap();
        assert_eq!(movies.count, 2);
        assert_eq!(movies.min, 90);
        assert_eq!(movies.max, 110);
        assert!((movies.mean - 100.0).abs() < f64::EPSILON);
        let series = summary.series_seasons.unwrap();
        assert_eq!(series.count, 1);
        assert_eq!(series.max, 2);
    }

    #[test]
    fn test_average_runtime_by_rating() {
        let runtimes = sample_catalogue().average_runtime_by_rating();
        assert_eq!(runtimes.len(), 1);
        assert_eq!(runtimes[0].rating, Bucket::Known("PG-13".to_string()));
        assert_eq!(runtimes[0].titles, 2);
    }

    #[test]
    fn test_search_and_recommend() {
        let catalogue = sample_catalogue();
        let hits = catalogue.search("maya");
        assert_eq!(hits.len(), 2);

        let prefs = Preferences::default()
            .with_kind(ContentKind::Movie)
            .with_rating("pg-13");
        let picks = catalogue.recommend(&prefs);
        assert_eq!(picks.len(), 2);

        let none = catalogue.recommend(&Preferences::default().with_genre("Anime"));
        assert!(none.is_no_match());
    }

    #[test]
    fn test_overview_matches_individual_reports() {
        let catalogue = sample_catalogue();
        let overview = catalogue.overview();
        assert_eq!(overview.titles, 4);
        assert_eq!(overview.content_kinds, catalogue.content_kinds());
        assert_eq!(overview.genres, catalogue.genres());
        assert_eq!(overview.release_years, catalogue.release_years().sorted_by_key());
    }

    #[test]
    fn test_reports_are_idempotent() {
        let catalogue = sample_catalogue();
        assert_eq!(catalogue.kind_by_country(), catalogue.kind_by_country());
        assert_eq!(catalogue.keywords(), catalogue.keywords());
        assert_eq!(catalogue.search("heist"), catalogue.search("heist"));
    }
}
