use serde::Serialize;

use super::date::{parse_date, ShowDate};

/// How a recording was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Soundboard,
    Audience,
    Matrix,
    #[default]
    Other,
}

impl SourceType {
    /// Parse archive.org-style source labels. Unrecognized labels map to `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "sbd" | "soundboard" => Self::Soundboard,
            "aud" | "audience" => Self::Audience,
            "matrix" | "mtx" => Self::Matrix,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Soundboard => "SBD",
            Self::Audience => "AUD",
            Self::Matrix => "Matrix",
            Self::Other => "?",
        }
    }
}

/// Where a show took place.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Location {
    pub venue: String,
    pub city: String,
    pub state: String,
}

impl Location {
    /// "Barton Hall, Ithaca, NY" with empty parts skipped.
    pub fn display(&self) -> String {
        [&self.venue, &self.city, &self.state]
            .iter()
            .filter(|s| !s.is_empty())
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Recording provenance and audience reception.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Recording {
    pub source: SourceType,
    pub avg_rating: f64,
    pub downloads: u64,
    pub num_reviews: u64,
}

/// One audio item within a show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub title: String,
    /// Stable sort and playback key.
    pub filename: String,
    /// Duration as written in the source ("12:34").
    pub duration: String,
    /// 1-based, contiguous within the show.
    pub position: usize,
}

impl Track {
    /// Parse `duration` as `ss`, `m:ss` or `h:mm:ss`.
    pub fn duration_secs(&self) -> Option<f64> {
        let mut total = 0.0;
        for part in self.duration.trim().split(':') {
            let v: f64 = part.trim().parse().ok()?;
            if v < 0.0 {
                return None;
            }
            total = total * 60.0 + v;
        }
        Some(total)
    }
}

/// One recorded performance. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Show {
    pub identifier: String,
    pub score: f64,
    pub location: Location,
    pub recording: Recording,
    pub title: Option<String>,
    pub description: Option<String>,
    pub lineage: Option<String>,
    pub setlist: Option<String>,
    /// Reference handed to the external video source.
    pub video_id: Option<String>,
    pub tracks: Vec<Track>,
}

impl Show {
    /// Performance date parsed from the identifier.
    pub fn date(&self) -> Option<ShowDate> {
        parse_date(&self.identifier)
    }

    /// Reference for the external video source: explicit video id, else the identifier.
    pub fn video_reference(&self) -> &str {
        self.video_id.as_deref().unwrap_or(&self.identifier)
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.tracks.iter().filter_map(|t| t.duration_secs()).sum()
    }
}
