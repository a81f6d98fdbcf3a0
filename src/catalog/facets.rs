use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Deserialize;

static EMPTY_BUCKET: BTreeSet<String> = BTreeSet::new();
static EMPTY_FACET: Facet = Facet { buckets: BTreeMap::new() };

/// The classification dimensions the category document knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FacetKind {
    Rating,
    Era,
    IconicVenue,
    VenueType,
    RecordingType,
    Region,
    State,
    Season,
    Decade,
    Year,
    Month,
    NotablePerformance,
    Special,
}

impl FacetKind {
    pub const ALL: [FacetKind; 13] = [
        Self::Rating,
        Self::Era,
        Self::IconicVenue,
        Self::VenueType,
        Self::RecordingType,
        Self::Region,
        Self::State,
        Self::Season,
        Self::Decade,
        Self::Year,
        Self::Month,
        Self::NotablePerformance,
        Self::Special,
    ];

    /// Map a category document key (or one of its aliases) to a known facet.
    pub fn from_key(key: &str) -> Option<Self> {
        match normalize_bucket_key(key).as_str() {
            "by_rating" | "ratings" | "rating" => Some(Self::Rating),
            "by_era" | "eras" | "era" => Some(Self::Era),
            "iconic_venues" | "venues" | "venue" | "iconic_venue" => Some(Self::IconicVenue),
            "venue_types" | "by_venue_type" | "venue_type" => Some(Self::VenueType),
            "recording_types" | "by_recording_type" | "recording_type" => {
                Some(Self::RecordingType)
            }
            "regions" | "by_region" | "region" => Some(Self::Region),
            "by_state" | "states" | "state" | "us_state" | "us_states" => Some(Self::State),
            "seasons" | "by_season" | "season" => Some(Self::Season),
            "by_decade" | "decades" | "decade" => Some(Self::Decade),
            "by_year" | "years" | "year" => Some(Self::Year),
            "by_month" | "months" | "month" => Some(Self::Month),
            "notable_performances" | "notable" => Some(Self::NotablePerformance),
            "special_shows" | "special" => Some(Self::Special),
            _ => None,
        }
    }

    /// Facets whose buckets partition the shows: one show, one bucket.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Self::Decade | Self::Year | Self::Month)
    }

    /// Canonical document key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Rating => "by_rating",
            Self::Era => "by_era",
            Self::IconicVenue => "iconic_venues",
            Self::VenueType => "venue_types",
            Self::RecordingType => "recording_types",
            Self::Region => "regions",
            Self::State => "by_state",
            Self::Season => "seasons",
            Self::Decade => "by_decade",
            Self::Year => "by_year",
            Self::Month => "by_month",
            Self::NotablePerformance => "notable_performances",
            Self::Special => "special_shows",
        }
    }
}

/// Star-rating buckets of the rating facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingTier {
    FiveStar,
    FourStar,
    ThreeStar,
    TwoStar,
    OneStar,
}

impl RatingTier {
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::FiveStar => "5_stars",
            Self::FourStar => "4_stars",
            Self::ThreeStar => "3_stars",
            Self::TwoStar => "2_stars",
            Self::OneStar => "1_star",
        }
    }
}

impl FromStr for RatingTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_bucket_key(s).as_str() {
            "5" | "5_stars" | "five_star" | "five_stars" => Ok(Self::FiveStar),
            "4" | "4_stars" | "four_star" | "four_stars" => Ok(Self::FourStar),
            "3" | "3_stars" | "three_star" | "three_stars" => Ok(Self::ThreeStar),
            "2" | "2_stars" | "two_star" | "two_stars" => Ok(Self::TwoStar),
            "1" | "1_star" | "1_stars" | "one_star" => Ok(Self::OneStar),
            _ => Err(format!("unknown rating tier '{s}'")),
        }
    }
}

/// Lowercase, with `-` and spaces folded to `_` ("Pigpen-Era" → "pigpen_era").
pub fn normalize_bucket_key(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Facet entry as written in the category document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawFacet {
    Buckets(BTreeMap<String, RawIds>),
    Flat(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawIds {
    Many(Vec<String>),
    One(String),
}

/// One classification dimension: bucket name → show identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Facet {
    buckets: BTreeMap<String, BTreeSet<String>>,
}

impl Facet {
    /// Build from a document entry. A bare array becomes one bucket named `name`.
    pub(crate) fn from_raw(name: &str, raw: RawFacet) -> Self {
        let buckets = match raw {
            RawFacet::Buckets(map) => map
                .into_iter()
                .map(|(bucket, ids)| {
                    let ids = match ids {
                        RawIds::Many(v) => v.into_iter().collect(),
                        RawIds::One(id) => BTreeSet::from([id]),
                    };
                    (bucket, ids)
                })
                .collect(),
            RawFacet::Flat(ids) => BTreeMap::from([(name.to_string(), ids.into_iter().collect())]),
        };
        Self { buckets }
    }

    /// Identifiers in `bucket`. Falls back to normalized key matching; empty if absent.
    pub fn get(&self, bucket: &str) -> &BTreeSet<String> {
        if let Some(ids) = self.buckets.get(bucket) {
            return ids;
        }
        let wanted = normalize_bucket_key(bucket);
        self.buckets
            .iter()
            .find(|(k, _)| normalize_bucket_key(k) == wanted)
            .map(|(_, ids)| ids)
            .unwrap_or(&EMPTY_BUCKET)
    }

    pub fn buckets(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.buckets
    }

    pub fn bucket_names(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(|k| k.as_str())
    }

    /// Buckets that list `identifier`.
    pub fn buckets_for<'a>(&'a self, identifier: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.buckets
            .iter()
            .filter(move |(_, ids)| ids.contains(identifier))
            .map(|(k, _)| k.as_str())
    }

    /// Identifiers listed in more than one bucket, with the buckets that list them.
    pub fn shared_identifiers(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut seen: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (bucket, ids) in &self.buckets {
            for id in ids {
                seen.entry(id.as_str()).or_default().push(bucket.as_str());
            }
        }
        seen.retain(|_, buckets| buckets.len() > 1);
        seen
    }

    /// Union `other`'s buckets into this facet.
    pub(crate) fn merge(&mut self, other: Facet) {
        for (bucket, ids) in other.buckets {
            self.buckets.entry(bucket).or_default().extend(ids);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }
}

/// All facets of a category document, known and unknown.
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    known: BTreeMap<FacetKind, Facet>,
    other: BTreeMap<String, Facet>,
}

impl CategoryIndex {
    /// Add a known facet. Several document keys can name the same facet
    /// (`by_era` and `eras`); their buckets are merged.
    pub(crate) fn insert_known(&mut self, kind: FacetKind, facet: Facet) {
        match self.known.entry(kind) {
            Entry::Vacant(slot) => {
                slot.insert(facet);
            }
            Entry::Occupied(mut slot) => {
                log::warn!("Facet {} appears under more than one key, merging buckets", kind.key());
                slot.get_mut().merge(facet);
            }
        }
    }

    pub(crate) fn insert_other(&mut self, name: String, facet: Facet) {
        self.other.insert(name, facet);
    }

    /// A known facet; empty when the document did not carry it.
    pub fn facet(&self, kind: FacetKind) -> &Facet {
        self.known.get(&kind).unwrap_or(&EMPTY_FACET)
    }

    /// A facet the loader did not recognize, by its document key.
    pub fn other(&self, name: &str) -> Option<&Facet> {
        self.other.get(name)
    }

    /// Look up any facet by document key, known or not.
    pub fn facet_by_name(&self, name: &str) -> Option<&Facet> {
        match FacetKind::from_key(name) {
            Some(kind) => self.known.get(&kind),
            None => self.other.get(name),
        }
    }

    /// Document keys of every facet present, known ones first.
    pub fn names(&self) -> Vec<&str> {
        self.known
            .keys()
            .map(|k| k.key())
            .chain(self.other.keys().map(|k| k.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.other.len()
    }
}
