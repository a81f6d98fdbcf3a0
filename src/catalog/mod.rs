pub mod date;
pub mod facets;
pub mod loader;
pub mod models;

#[cfg(test)]
pub(crate) mod testdata;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::Datelike;
use rand::seq::{IndexedRandom, IteratorRandom};
use rand::Rng;
use thiserror::Error;

use date::ShowDate;
use facets::{CategoryIndex, Facet, FacetKind, RatingTier};
use models::{Show, SourceType};

pub use loader::{load, load_files, load_in_background};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{document} document does not match schema: {source}")]
    Schema {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("enriched show document contains no shows")]
    EmptyDataset,
    #[error("invalid show '{key}': {reason}")]
    InvalidShow { key: String, reason: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Document-level metadata, passed through untouched.
#[derive(Debug, Clone, Default)]
pub struct CatalogInfo {
    pub format_version: Option<i64>,
    pub description: Option<String>,
    pub generated_at: Option<String>,
    pub last_updated: Option<String>,
    pub stats: serde_json::Value,
}

/// The loaded show collection and its facets. Read-only once built.
#[derive(Debug)]
pub struct Catalog {
    info: CatalogInfo,
    categories: CategoryIndex,
    shows: BTreeMap<String, Arc<Show>>,
    /// Enriched-document keys that differ from the identifier they hold.
    document_keys: BTreeMap<String, String>,
    /// Shows with a parseable date, ordered by (date, identifier).
    dated: Vec<(ShowDate, Arc<Show>)>,
}

impl Catalog {
    pub(crate) fn new(
        info: CatalogInfo,
        categories: CategoryIndex,
        shows: BTreeMap<String, Arc<Show>>,
        document_keys: BTreeMap<String, String>,
    ) -> Self {
        let mut dated: Vec<(ShowDate, Arc<Show>)> = shows
            .values()
            .filter_map(|s| s.date().map(|d| (d, Arc::clone(s))))
            .collect();
        dated.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| a.identifier.cmp(&b.identifier)));

        Self {
            info,
            categories,
            shows,
            document_keys,
            dated,
        }
    }

    pub fn info(&self) -> &CatalogInfo {
        &self.info
    }

    pub fn categories(&self) -> &CategoryIndex {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.shows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shows.is_empty()
    }

    // --- Lookup ---

    /// Exact identifier lookup, then the key the show had in the enriched
    /// document, then the lexicographically smallest identifier that contains
    /// `identifier` (so "77-05-08" finds Cornell).
    pub fn get_show(&self, identifier: &str) -> Option<Arc<Show>> {
        if identifier.is_empty() {
            return None;
        }
        if let Some(show) = self.shows.get(identifier) {
            return Some(Arc::clone(show));
        }
        if let Some(show) = self
            .document_keys
            .get(identifier)
            .and_then(|id| self.shows.get(id))
        {
            return Some(Arc::clone(show));
        }
        self.shows
            .iter()
            .find(|(id, _)| id.contains(identifier))
            .map(|(_, show)| Arc::clone(show))
    }

    /// Every show, keyed by its own identifier.
    pub fn all_shows(&self) -> &BTreeMap<String, Arc<Show>> {
        &self.shows
    }

    /// Map a set of identifiers (e.g. a facet bucket) to loaded shows.
    /// Identifiers without a show record are skipped.
    pub fn resolve<'a, I>(&self, identifiers: I) -> Vec<Arc<Show>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        identifiers
            .into_iter()
            .filter_map(|id| self.shows.get(id).cloned())
            .collect()
    }

    // --- Random picks ---

    pub fn random_show(&self) -> Option<Arc<Show>> {
        self.random_show_with(&mut rand::rng())
    }

    /// Uniform pick over all shows using the caller's RNG.
    pub fn random_show_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<Show>> {
        self.shows.values().choose(rng).cloned()
    }

    // --- Dates ---

    /// Shows performed on the same month and day as `reference`, any year.
    /// Ordered by identifier.
    pub fn shows_on_this_day<D: Datelike>(&self, reference: &D) -> Vec<Arc<Show>> {
        let mut hits: Vec<Arc<Show>> = self
            .dated
            .iter()
            .filter(|(d, _)| d.is_anniversary_of(reference))
            .map(|(_, s)| Arc::clone(s))
            .collect();
        hits.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        hits
    }

    pub fn random_show_on_this_day<D: Datelike>(&self, reference: &D) -> Option<Arc<Show>> {
        self.random_show_on_this_day_with(reference, &mut rand::rng())
    }

    pub fn random_show_on_this_day_with<D: Datelike, R: Rng + ?Sized>(
        &self,
        reference: &D,
        rng: &mut R,
    ) -> Option<Arc<Show>> {
        self.shows_on_this_day(reference).choose(rng).cloned()
    }

    /// Shows dated within `[start, end]`, oldest first.
    pub fn shows_between(&self, start: impl Into<ShowDate>, end: impl Into<ShowDate>) -> Vec<Arc<Show>> {
        let (start, end) = (start.into(), end.into());
        self.dated
            .iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .map(|(_, s)| Arc::clone(s))
            .collect()
    }

    // --- Rankings ---

    pub fn shows_by_source(&self, source: SourceType) -> Vec<Arc<Show>> {
        self.shows
            .values()
            .filter(|s| s.recording.source == source)
            .cloned()
            .collect()
    }

    /// Highest score first; ties broken by identifier.
    pub fn top_rated(&self, limit: usize) -> Vec<Arc<Show>> {
        rank(self.shows.values().cloned().collect(), limit)
    }

    /// `top_rated`, restricted to one kind of recording.
    pub fn top_rated_by_source(&self, source: SourceType, limit: usize) -> Vec<Arc<Show>> {
        rank(self.shows_by_source(source), limit)
    }

    // --- Facets ---

    pub fn facet(&self, kind: FacetKind) -> &Facet {
        self.categories.facet(kind)
    }

    pub fn facet_by_name(&self, name: &str) -> Option<&Facet> {
        self.categories.facet_by_name(name)
    }

    pub fn facet_names(&self) -> Vec<&str> {
        self.categories.names()
    }

    pub fn by_era(&self, era: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::Era).get(era)
    }

    pub fn by_venue(&self, venue: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::IconicVenue).get(venue)
    }

    pub fn by_rating(&self, tier: RatingTier) -> &BTreeSet<String> {
        self.facet(FacetKind::Rating).get(tier.bucket())
    }

    pub fn by_region(&self, region: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::Region).get(region)
    }

    pub fn by_season(&self, season: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::Season).get(season)
    }

    pub fn by_recording_type(&self, recording_type: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::RecordingType).get(recording_type)
    }

    pub fn by_venue_type(&self, venue_type: &str) -> &BTreeSet<String> {
        self.facet(FacetKind::VenueType).get(venue_type)
    }

    pub fn states(&self) -> &Facet {
        self.facet(FacetKind::State)
    }

    pub fn decades(&self) -> &Facet {
        self.facet(FacetKind::Decade)
    }

    pub fn years(&self) -> &Facet {
        self.facet(FacetKind::Year)
    }

    pub fn months(&self) -> &Facet {
        self.facet(FacetKind::Month)
    }

    pub fn notable_performances(&self) -> &Facet {
        self.facet(FacetKind::NotablePerformance)
    }

    /// First-show / last-show buckets.
    pub fn special_shows(&self) -> &Facet {
        self.facet(FacetKind::Special)
    }
}

fn rank(mut shows: Vec<Arc<Show>>, limit: usize) -> Vec<Arc<Show>> {
    shows.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.identifier.cmp(&b.identifier))
    });
    shows.truncate(limit);
    shows
}

/// Current catalog, replaced wholesale on reload.
#[derive(Debug)]
pub struct SharedCatalog {
    current: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// Snapshot of the catalog in effect right now.
    pub fn current(&self) -> Arc<Catalog> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Swap in a freshly loaded catalog. Readers holding the old snapshot keep it.
    pub fn replace(&self, catalog: Catalog) {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(catalog);
        log::info!("Catalog replaced ({} shows)", guard.len());
    }
}
