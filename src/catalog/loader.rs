use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::facets::{CategoryIndex, Facet, FacetKind, RawFacet};
use super::models::{Location, Recording, Show, SourceType, Track};
use super::{Catalog, CatalogError, CatalogInfo, Result};

/// Category document. Unknown top-level keys are ignored.
#[derive(Debug, Deserialize)]
struct CategoryDocument {
    #[serde(default)]
    format_version: Option<i64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    generated_at: Option<String>,
    #[serde(default)]
    categories: BTreeMap<String, serde_json::Value>,
}

/// Enriched-show document.
#[derive(Debug, Deserialize)]
struct EnrichedDocument {
    #[serde(default)]
    last_updated: Option<String>,
    #[serde(default)]
    stats: serde_json::Value,
    #[serde(default)]
    best_shows: BTreeMap<String, RawShow>,
}

#[derive(Debug, Deserialize)]
struct RawShow {
    identifier: String,
    score: f64,
    location: RawLocation,
    tracks: Vec<RawTrack>,

    #[serde(default, alias = "source")]
    source_type: Option<String>,
    #[serde(default)]
    avg_rating: Option<f64>,
    #[serde(default, alias = "num_downloads")]
    downloads: Option<u64>,
    #[serde(default)]
    num_reviews: Option<u64>,

    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "notes")]
    description: Option<String>,
    #[serde(default)]
    lineage: Option<String>,
    #[serde(default)]
    setlist: Option<String>,
    #[serde(default, alias = "youtube_id")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    #[serde(default)]
    venue: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    #[serde(default)]
    title: String,
    filename: String,
    #[serde(default, alias = "length")]
    duration: String,
    /// archive.org writes "3", 3, or "3/12"
    #[serde(default, alias = "position")]
    track: Option<RawPosition>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Number(u64),
    Text(String),
}

impl RawPosition {
    fn value(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => {
                let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse().ok()
            }
        }
    }
}

/// Parse the two catalog documents into a validated `Catalog`.
///
/// The enriched-show document is mandatory and must contain at least one show.
/// The category document may be absent (or empty), which yields an empty index.
pub fn load(category: Option<&[u8]>, enriched: &[u8]) -> Result<Catalog> {
    let enriched_doc: EnrichedDocument =
        serde_json::from_slice(enriched).map_err(|source| CatalogError::Schema {
            document: "enriched",
            source,
        })?;

    if enriched_doc.best_shows.is_empty() {
        return Err(CatalogError::EmptyDataset);
    }

    let mut info = CatalogInfo {
        last_updated: enriched_doc.last_updated,
        stats: enriched_doc.stats,
        ..CatalogInfo::default()
    };

    let categories = match category.filter(|bytes| !bytes.iter().all(u8::is_ascii_whitespace)) {
        Some(bytes) => {
            let doc: CategoryDocument =
                serde_json::from_slice(bytes).map_err(|source| CatalogError::Schema {
                    document: "category",
                    source,
                })?;
            info.format_version = doc.format_version;
            info.description = doc.description;
            info.generated_at = doc.generated_at;
            build_category_index(doc.categories)?
        }
        None => {
            log::info!("No category document, facet queries will be empty");
            CategoryIndex::default()
        }
    };

    let mut shows: BTreeMap<String, Arc<Show>> = BTreeMap::new();
    let mut document_keys: BTreeMap<String, String> = BTreeMap::new();
    for (key, raw) in enriched_doc.best_shows {
        let show = build_show(&key, raw)?;
        if show.date().is_none() {
            log::warn!("Show '{}' has no parseable date in its identifier", show.identifier);
        }
        if shows.contains_key(&show.identifier) {
            return Err(CatalogError::InvalidShow {
                key,
                reason: format!("duplicate identifier '{}'", show.identifier),
            });
        }
        if key != show.identifier {
            log::debug!("Re-keyed '{key}' as '{}'", show.identifier);
            document_keys.insert(key, show.identifier.clone());
        }
        shows.insert(show.identifier.clone(), Arc::new(show));
    }

    log::info!(
        "Loaded {} shows, {} facets",
        shows.len(),
        categories.len()
    );
    Ok(Catalog::new(info, categories, shows, document_keys))
}

/// Read the documents from disk, then `load` them.
/// A missing category file is treated as absent, not as an error.
pub fn load_files(category_path: Option<&Path>, enriched_path: &Path) -> Result<Catalog> {
    let enriched = std::fs::read(enriched_path).map_err(|source| CatalogError::Io {
        path: enriched_path.to_path_buf(),
        source,
    })?;

    let category = match category_path {
        Some(path) if path.exists() => Some(std::fs::read(path).map_err(|source| {
            CatalogError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?),
        Some(path) => {
            log::warn!("Category document {} not found", path.display());
            None
        }
        None => None,
    };

    load(category.as_deref(), &enriched)
}

/// Run `load` on the blocking pool so callers on the async runtime stay responsive.
pub async fn load_in_background(category: Option<Vec<u8>>, enriched: Vec<u8>) -> Result<Catalog> {
    tokio::task::spawn_blocking(move || load(category.as_deref(), &enriched)).await?
}

fn build_category_index(categories: BTreeMap<String, serde_json::Value>) -> Result<CategoryIndex> {
    let mut index = CategoryIndex::default();
    for (name, value) in categories {
        match FacetKind::from_key(&name) {
            Some(kind) => {
                let raw: RawFacet =
                    serde_json::from_value(value).map_err(|source| CatalogError::Schema {
                        document: "category",
                        source,
                    })?;
                index.insert_known(kind, Facet::from_raw(&name, raw));
            }
            // Unknown facets are kept when they have a usable shape, skipped otherwise
            None => match serde_json::from_value::<RawFacet>(value) {
                Ok(raw) => {
                    log::debug!("Keeping unrecognized facet '{name}'");
                    let facet = Facet::from_raw(&name, raw);
                    index.insert_other(name, facet);
                }
                Err(e) => log::warn!("Skipping unrecognized facet '{name}': {e}"),
            },
        }
    }

    for kind in FacetKind::ALL.into_iter().filter(FacetKind::is_exclusive) {
        for (id, buckets) in index.facet(kind).shared_identifiers() {
            log::warn!("{id} is listed under several {} buckets: {}", kind.key(), buckets.join(", "));
        }
    }
    Ok(index)
}

fn build_show(key: &str, raw: RawShow) -> Result<Show> {
    let identifier = raw.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(CatalogError::InvalidShow {
            key: key.to_string(),
            reason: "empty identifier".to_string(),
        });
    }
    if !raw.score.is_finite() {
        return Err(CatalogError::InvalidShow {
            key: key.to_string(),
            reason: format!("score {} is not a finite number", raw.score),
        });
    }

    Ok(Show {
        tracks: order_tracks(&identifier, raw.tracks),
        identifier,
        score: raw.score,
        location: Location {
            venue: raw.location.venue,
            city: raw.location.city,
            state: raw.location.state,
        },
        recording: Recording {
            source: raw
                .source_type
                .as_deref()
                .map(SourceType::from_label)
                .unwrap_or_default(),
            avg_rating: raw.avg_rating.unwrap_or(0.0),
            downloads: raw.downloads.unwrap_or(0),
            num_reviews: raw.num_reviews.unwrap_or(0),
        },
        title: raw.title,
        description: raw.description,
        lineage: raw.lineage,
        setlist: raw.setlist,
        video_id: raw.video_id,
    })
}

/// Order tracks and renumber positions 1..=n.
///
/// When every track declares a position, sort by (position, filename);
/// otherwise keep document order.
fn order_tracks(identifier: &str, raw: Vec<RawTrack>) -> Vec<Track> {
    let mut keyed: Vec<(Option<u64>, RawTrack)> = raw
        .into_iter()
        .map(|t| (t.track.as_ref().and_then(RawPosition::value), t))
        .collect();

    if !keyed.is_empty() && keyed.iter().all(|(pos, _)| pos.is_some()) {
        keyed.sort_by(|(pa, a), (pb, b)| pa.cmp(pb).then_with(|| a.filename.cmp(&b.filename)));
    } else if keyed.iter().any(|(pos, _)| pos.is_some()) {
        log::debug!("{identifier}: partial track positions, keeping document order");
    }

    keyed
        .into_iter()
        .enumerate()
        .map(|(i, (_, t))| Track {
            title: t.title,
            filename: t.filename,
            duration: t.duration,
            position: i + 1,
        })
        .collect()
}
