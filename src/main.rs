use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use setlist_vault::catalog::models::{Show, SourceType};
use setlist_vault::catalog::Catalog;
use setlist_vault::config::AppConfig;
use setlist_vault::store::{JsonFileStore, ShowStore};

#[derive(Parser)]
#[command(name = "setlist-vault", version, about = "Browse a catalog of live show recordings")]
struct Cli {
    /// Path to the enriched show document (JSON)
    #[arg(long, global = true)]
    shows: Option<PathBuf>,

    /// Path to the category document (JSON)
    #[arg(long, global = true)]
    categories: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    #[value(alias = "sbd")]
    Soundboard,
    #[value(alias = "aud")]
    Audience,
    Matrix,
    Other,
}

impl From<SourceArg> for SourceType {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Soundboard => SourceType::Soundboard,
            SourceArg::Audience => SourceType::Audience,
            SourceArg::Matrix => SourceType::Matrix,
            SourceArg::Other => SourceType::Other,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show catalog statistics
    Stats,

    /// View a show's details and track list
    Show {
        /// Show identifier (exact, or any unique-enough substring such as 77-05-08)
        id: String,
    },

    /// Pick a random show
    Random,

    /// Shows performed on this day in history
    Today {
        /// Reference date instead of today (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,

        /// Pick one at random instead of listing all
        #[arg(long)]
        pick: bool,
    },

    /// Shows performed between two dates, inclusive
    Range {
        /// Start date (YYYY-MM-DD)
        from: String,
        /// End date (YYYY-MM-DD)
        to: String,
    },

    /// Highest-scored shows
    Top {
        /// Number of results
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Only shows from this kind of recording
        #[arg(short, long, value_enum)]
        source: Option<SourceArg>,
    },

    /// List facet names and their bucket counts
    Facets,

    /// Browse one facet, or the shows in one of its buckets
    Facet {
        /// Facet name (e.g. by_era, iconic_venues, by_rating, by_state)
        name: String,
        /// Bucket within the facet (e.g. 1970s, 5_stars)
        bucket: Option<String>,
    },

    /// Manage favorite shows
    Favorite {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// List shows recorded in the listening history
    ///
    /// The history file is written by players built on the library
    /// (`PlaybackCoordinator::with_history`); this command only reads it.
    History,
}

#[derive(Subcommand)]
enum FavoriteAction {
    /// Mark a show as a favorite
    Add { id: String },
    /// Remove a show from favorites
    Remove { id: String },
    /// List favorite shows
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();

    // Resolve document paths: CLI > config > XDG default
    let enriched_path = cli.shows.unwrap_or_else(|| config.resolve_enriched_path());
    let category_path = cli.categories.or_else(|| config.resolve_category_path());
    log::info!("Shows: {}", enriched_path.display());

    let catalog = setlist_vault::catalog::load_files(category_path.as_deref(), &enriched_path)
        .context("Failed to load catalog")?;

    match cli.command {
        Commands::Stats => print_stats(&catalog),

        Commands::Show { id } => {
            let Some(show) = catalog.get_show(&id) else {
                println!("No show matching \"{}\".", id);
                return Ok(());
            };
            let favorites = JsonFileStore::open(&config.resolve_favorites_path())
                .context("Failed to open favorites")?;
            print_show(&catalog, &show, favorites.has(&show.identifier));
        }

        Commands::Random => {
            let mut rng = make_rng(config.random_seed);
            match catalog.random_show_with(&mut rng) {
                Some(show) => print_show(&catalog, &show, false),
                None => println!("Catalog is empty."),
            }
        }

        Commands::Today { date, pick } => {
            let reference = match date {
                Some(d) => parse_cli_date(&d)?,
                None => chrono::Local::now().date_naive(),
            };
            let label = reference.format("%B %-d");
            if pick {
                let mut rng = make_rng(config.random_seed);
                match catalog.random_show_on_this_day_with(&reference, &mut rng) {
                    Some(show) => print_show(&catalog, &show, false),
                    None => println!("No shows on {}.", label),
                }
                return Ok(());
            }
            let shows = catalog.shows_on_this_day(&reference);
            if shows.is_empty() {
                println!("No shows on {}.", label);
                return Ok(());
            }
            println!("{} shows on {}:", shows.len(), label);
            println!();
            print_show_table(&shows);
        }

        Commands::Range { from, to } => {
            let (from, to) = (parse_cli_date(&from)?, parse_cli_date(&to)?);
            if from > to {
                anyhow::bail!("Start date {} is after end date {}", from, to);
            }
            let shows = catalog.shows_between(from, to);
            if shows.is_empty() {
                println!("No shows between {} and {}.", from, to);
                return Ok(());
            }
            println!("{} shows between {} and {}:", shows.len(), from, to);
            println!();
            print_show_table(&shows);
        }

        Commands::Top { limit, source } => {
            let shows = match source {
                Some(source) => catalog.top_rated_by_source(source.into(), limit),
                None => catalog.top_rated(limit),
            };
            if shows.is_empty() {
                println!("No results found.");
                return Ok(());
            }
            println!("Top {} shows by score:", shows.len());
            println!();
            print_show_table(&shows);
        }

        Commands::Facets => {
            let names = catalog.facet_names();
            if names.is_empty() {
                println!("No category document loaded.");
                return Ok(());
            }
            println!("{:<24} {:>8}", "Facet", "Buckets");
            println!("{}", "-".repeat(33));
            for name in names {
                if let Some(facet) = catalog.facet_by_name(name) {
                    println!("{:<24} {:>8}", name, facet.len());
                }
            }
        }

        Commands::Facet { name, bucket } => {
            let Some(facet) = catalog.facet_by_name(&name) else {
                println!("Unknown facet \"{}\". Run `setlist-vault facets` to list them.", name);
                return Ok(());
            };
            match bucket {
                Some(bucket) => {
                    let ids = facet.get(&bucket);
                    let shows = catalog.resolve(ids);
                    if shows.is_empty() {
                        println!("No shows in {} / {}.", name, bucket);
                        return Ok(());
                    }
                    println!("{} / {}: {} shows", name, bucket, shows.len());
                    if shows.len() < ids.len() {
                        println!("({} listed identifiers have no show record)", ids.len() - shows.len());
                    }
                    println!();
                    print_show_table(&shows);
                }
                None => {
                    println!("{:<32} {:>6}", "Bucket", "Shows");
                    println!("{}", "-".repeat(39));
                    for (bucket, ids) in facet.buckets() {
                        println!("{:<32} {:>6}", bucket, ids.len());
                    }
                }
            }
        }

        Commands::Favorite { action } => {
            let path = config.resolve_favorites_path();
            let favorites = JsonFileStore::open(&path).context("Failed to open favorites")?;
            match action {
                FavoriteAction::Add { id } => {
                    let show = catalog
                        .get_show(&id)
                        .with_context(|| format!("No show matching \"{}\"", id))?;
                    favorites
                        .add(&show.identifier)
                        .context("Failed to save favorites")?;
                    println!("Added {} to favorites", show.identifier);
                }
                FavoriteAction::Remove { id } => {
                    // Exact stored identifier first, then catalog lookup
                    let target = favorites
                        .list()
                        .into_iter()
                        .find(|f| *f == id)
                        .or_else(|| catalog.get_show(&id).map(|s| s.identifier.clone()))
                        .unwrap_or(id);
                    if !favorites.has(&target) {
                        println!("{} is not a favorite.", target);
                        return Ok(());
                    }
                    favorites.remove(&target).context("Failed to save favorites")?;
                    println!("Removed {} from favorites", target);
                }
                FavoriteAction::List => {
                    print_stored(&catalog, &favorites.list(), "favorites");
                }
            }
        }

        Commands::History => {
            let history = JsonFileStore::open(&config.resolve_history_path())
                .context("Failed to open history")?;
            print_stored(&catalog, &history.list(), "history");
        }
    }

    Ok(())
}

fn parse_cli_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date \"{}\" (expected YYYY-MM-DD)", s))
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            log::debug!("Using random seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    }
}

fn print_stats(catalog: &Catalog) {
    let info = catalog.info();
    let shows = catalog.all_shows();
    let total_hours: f64 = shows.values().map(|s| s.total_duration_secs()).sum::<f64>() / 3600.0;
    let tracks: usize = shows.values().map(|s| s.tracks.len()).sum();

    println!("Catalog Statistics");
    println!("==================");
    println!("Shows:            {}", catalog.len());
    println!("Tracks:           {}", tracks);
    println!("Total duration:   {:.1} hours", total_hours);

    let mut dates = shows.values().filter_map(|s| s.date());
    if let Some(first) = dates.next() {
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        println!("Date range:       {} to {}", min, max);
    }
    if let Some(updated) = &info.last_updated {
        println!("Last updated:     {}", updated);
    }
    println!();

    println!("Sources:");
    for source in [
        SourceType::Soundboard,
        SourceType::Audience,
        SourceType::Matrix,
        SourceType::Other,
    ] {
        let count = catalog.shows_by_source(source).len();
        if count > 0 {
            println!("  {:<8} {}", source.label(), count);
        }
    }

    let facets = catalog.categories();
    if !facets.is_empty() {
        println!();
        println!("Facets: {}", facets.len());
        if let Some(version) = info.format_version {
            println!("Category format:  v{}", version);
        }
    }
}

fn print_show(catalog: &Catalog, show: &Show, favorite: bool) {
    let star = if favorite { " *" } else { "" };
    println!("{}{}", show.identifier, star);
    if let Some(title) = &show.title {
        println!("{}", title);
    }
    match show.date() {
        Some(date) => println!("Date:     {}", date),
        None => println!("Date:     unknown"),
    }
    println!("Venue:    {}", show.location.display());
    println!(
        "Source:   {}  (rating {:.2}, {} reviews, {} downloads)",
        show.recording.source.label(),
        show.recording.avg_rating,
        show.recording.num_reviews,
        show.recording.downloads
    );
    println!("Score:    {:.2}", show.score);
    if let Some(lineage) = &show.lineage {
        println!("Lineage:  {}", lineage);
    }

    let memberships: Vec<String> = catalog
        .facet_names()
        .into_iter()
        .filter_map(|name| {
            let facet = catalog.facet_by_name(name)?;
            let buckets: Vec<&str> = facet.buckets_for(&show.identifier).collect();
            (!buckets.is_empty()).then(|| format!("{}={}", name, buckets.join(",")))
        })
        .collect();
    if !memberships.is_empty() {
        println!("Facets:   {}", memberships.join("  "));
    }
    println!();

    println!("{:>3}  {:<40} {:>8}", "#", "Title", "Length");
    println!("{}", "-".repeat(53));
    for track in &show.tracks {
        println!(
            "{:>3}  {:<40} {:>8}",
            track.position,
            truncate(&track.title, 40),
            track.duration
        );
    }
    println!();
    println!("Total: {:.1} min", show.total_duration_secs() / 60.0);
}

fn print_show_table(shows: &[Arc<Show>]) {
    println!(
        "{:<40} {:>10} {:<30} {:>6} {:>5}",
        "Identifier", "Date", "Venue", "Src", "Score"
    );
    println!("{}", "-".repeat(95));
    for show in shows {
        let date = show
            .date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!(
            "{:<40} {:>10} {:<30} {:>6} {:>5.2}",
            truncate(&show.identifier, 40),
            date,
            truncate(&show.location.venue, 30),
            show.recording.source.label(),
            show.score
        );
    }
}

fn print_stored(catalog: &Catalog, ids: &[String], what: &str) {
    if ids.is_empty() {
        println!("No shows in {}.", what);
        return;
    }
    let shows = catalog.resolve(ids);
    print_show_table(&shows);
    let missing = ids.len() - shows.len();
    if missing > 0 {
        println!();
        println!("({} stored identifiers are not in the current catalog)", missing);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
