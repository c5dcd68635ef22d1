use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use cinedex::{Catalogue, ContentKind, ListField, Preferences, TextConfig};

/// Analytics and queries over a streaming catalogue export
#[derive(Parser, Debug)]
#[command(name = "cinedex")]
#[command(about = "Catalogue analytics: breakdowns, cross-tabs, keywords, search and picks", long_about = None)]
struct Args {
    /// Catalogue export (JSON array, or JSON Lines for .jsonl/.ndjson)
    #[arg(short, long)]
    input: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seed for reproducible recommendations
    #[arg(long)]
    seed: Option<u64>,

    /// Limit ranked output to the first N entries
    #[arg(long)]
    top: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline single-key reports
    Overview,
    /// Ranked counts for one field
    Count {
        #[arg(value_enum)]
        field: CountField,
    },
    /// Two-key count table
    Crosstab {
        #[arg(value_enum)]
        report: CrossReport,
    },
    /// Most frequent description keywords
    Keywords {
        /// Ignore tokens shorter than this
        #[arg(long, default_value_t = 4)]
        min_length: usize,
    },
    /// Values that most often appear together on one title
    Pairs {
        #[arg(value_enum)]
        field: PairField,
    },
    /// Runtime statistics for movies and series
    Durations,
    /// Mean movie runtime per rating
    Runtimes,
    /// Search titles, cast, directors and descriptions
    Search { query: String },
    /// Random picks matching every given preference
    Recommend {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        rating: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CountField {
    Kind,
    Country,
    ReleaseYear,
    Rating,
    Genre,
    Cast,
    Director,
    YearAdded,
    MonthAdded,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CrossReport {
    KindByYear,
    KindByCountry,
    RatingByYear,
    KindByRating,
    DirectorByKind,
    GenreByKind,
    GenreTrends,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PairField {
    Genre,
    Cast,
    Director,
}

impl From<PairField> for ListField {
    fn from(field: PairField) -> Self {
        match field {
            PairField::Genre => ListField::Genres,
            PairField::Cast => ListField::Cast,
            PairField::Director => ListField::Director,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Movie,
    Series,
}

impl From<KindArg> for ContentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => ContentKind::Movie,
            KindArg::Series => ContentKind::Series,
        }
    }
}

const DEFAULT_TREND_GENRES: usize = 5;

fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn head<T>(items: Vec<T>, top: Option<usize>) -> Vec<T> {
    match top {
        Some(n) => items.into_iter().take(n).collect(),
        None => items,
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting cinedex v{}", env!("CARGO_PKG_VERSION"));
    info!("Catalogue: {:?}", args.input);

    let mut catalogue = cinedex::load_catalogue(&args.input)?;
    if let Some(seed) = args.seed {
        catalogue = catalogue.with_seed(seed);
    }

    run(&catalogue, args.command, args.top)
}

fn run(catalogue: &Catalogue, command: Command, top: Option<usize>) -> anyhow::Result<()> {
    let limit = |n: usize| top.unwrap_or(n);
    let all = usize::MAX;

    match command {
        Command::Overview => emit(&catalogue.overview()),
        Command::Count { field } => match field {
            CountField::Kind => emit(&catalogue.content_kinds().head(limit(all))),
            CountField::Country => emit(&catalogue.countries().head(limit(all))),
            CountField::ReleaseYear => emit(&catalogue.release_years().head(limit(all))),
            CountField::Rating => emit(&catalogue.ratings().head(limit(all))),
            CountField::Genre => emit(&catalogue.genres().head(limit(all))),
            CountField::Cast => emit(&catalogue.cast().head(limit(all))),
            CountField::Director => emit(&catalogue.directors().head(limit(all))),
            CountField::YearAdded => emit(&catalogue.years_added().head(limit(all))),
            CountField::MonthAdded => emit(&catalogue.months_added().head(limit(all))),
        },
        Command::Crosstab { report } => match report {
            CrossReport::KindByYear => emit(&catalogue.kind_by_release_year().sorted_by_key()),
            CrossReport::KindByCountry => emit(&catalogue.kind_by_country().top_rows(limit(all))),
            CrossReport::RatingByYear => emit(&catalogue.rating_by_release_year().sorted_by_key()),
            CrossReport::KindByRating => emit(&catalogue.kind_by_rating()),
            CrossReport::DirectorByKind => emit(&catalogue.director_by_kind().top_rows(limit(all))),
            CrossReport::GenreByKind => emit(&catalogue.genre_by_kind().top_rows(limit(all))),
            CrossReport::GenreTrends => emit(&catalogue.genre_trends(limit(DEFAULT_TREND_GENRES))),
        },
        Command::Keywords { min_length } => {
            let config = TextConfig::default().with_min_length(min_length);
            config.validate()?;
            emit(&head(catalogue.keywords_with(&config), top))
        }
        Command::Pairs { field } => emit(&head(catalogue.co_occurrences(field.into()), top)),
        Command::Durations => emit(&catalogue.duration_summary()),
        Command::Runtimes => emit(&head(catalogue.average_runtime_by_rating(), top)),
        Command::Search { query } => emit(&head(catalogue.search(&query), top)),
        Command::Recommend { kind, genre, rating } => {
            let preferences = Preferences {
                kind: kind.map(ContentKind::from),
                genre,
                rating,
            };
            emit(&catalogue.recommend(&preferences))
        }
    }
}
