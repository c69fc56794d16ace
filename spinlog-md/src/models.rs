//! Data model for the metadata matching & enrichment engine

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query against the remote catalog, constructed per call
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<String>,
    pub label: Option<String>,
    /// Maximum results to request from the provider
    pub limit: u32,
}

/// A ranked remote-catalog candidate
///
/// Any returned set is sorted by confidence descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    pub artist: String,
    pub album: String,
    /// Release id in the remote catalog's namespace (not the local database)
    pub release_id: u64,
    /// Master grouping id when the hit belongs to one. For a master-type
    /// hit this mirrors `release_id`: the ids share a value but not a
    /// namespace, and no separate release id exists.
    pub master_id: Option<u64>,
    pub release_url: String,
    pub artwork_url: Option<String>,
    /// Match confidence in [0.0, 1.0]
    pub confidence: f64,
}

/// A single tracklist entry on a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseTrack {
    pub position: String,
    pub title: String,
    pub duration: Option<String>,
}

/// Full release metadata extracted from the remote catalog
///
/// Immutable once fetched except the `cached` echo flag, which records
/// provenance only and never participates in equality or dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    pub release_id: u64,
    pub title: String,
    pub artist: String,
    pub year: Option<u32>,
    pub label: Option<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub tracklist: Vec<ReleaseTrack>,
    pub artwork_url: Option<String>,
    pub release_url: String,
    /// True when this value was served from the result cache
    pub cached: bool,
}

/// Which local store a track search result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackSource {
    /// Local cache of previously resolved remote tracks
    RemoteIndex,
    /// On-air play history
    History,
    /// DJ personal bins
    Bin,
}

impl TrackSource {
    /// Preference rank when deduplicating (lower is preferred)
    pub fn rank(&self) -> u8 {
        match self {
            TrackSource::RemoteIndex => 0,
            TrackSource::History => 1,
            TrackSource::Bin => 2,
        }
    }
}

/// Rotation frequency bin, highest promotion first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationBin {
    Heavy,
    Medium,
    Light,
    Spoken,
}

impl RotationBin {
    /// Fixed ordinal for ranking (lower sorts first)
    pub fn ordinal(&self) -> u8 {
        match self {
            RotationBin::Heavy => 0,
            RotationBin::Medium => 1,
            RotationBin::Light => 2,
            RotationBin::Spoken => 3,
        }
    }

    /// Parse a stored frequency code ("H", "M", "L", "S"), tolerating
    /// full words
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "H" | "HEAVY" => Some(RotationBin::Heavy),
            "M" | "MEDIUM" => Some(RotationBin::Medium),
            "L" | "LIGHT" => Some(RotationBin::Light),
            "S" | "SPOKEN" => Some(RotationBin::Spoken),
            _ => None,
        }
    }
}

/// A track hit from one of the local stores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSearchResult {
    /// Remote catalog track identifier, when the source carries one
    pub track_id: Option<i64>,
    pub title: String,
    pub position: Option<String>,
    pub duration: Option<String>,
    pub album_id: Option<Uuid>,
    pub album_title: String,
    pub artist_name: String,
    pub label: Option<String>,
    /// Active rotation linkage, if any
    pub rotation_id: Option<Uuid>,
    pub rotation_bin: Option<RotationBin>,
    pub source: TrackSource,
}

/// Query against the local multi-source track aggregator
#[derive(Debug, Clone)]
pub struct TrackQuery {
    pub song: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub label: Option<String>,
    pub limit: i64,
}

impl TrackQuery {
    pub fn new(song: impl Into<String>) -> Self {
        Self {
            song: song.into(),
            artist: None,
            album: None,
            label: None,
            limit: 25,
        }
    }
}
