//! Release resolution against the remote catalog
//!
//! Orchestrates SEARCH → (MASTER_DETAIL | RELEASE_DETAIL) → RESULT. When
//! the top hit belongs to a master grouping, the master's detail is
//! fetched preferentially for more reliable year and artwork data. Remote
//! failures degrade to empty/None and are logged; callers needing
//! freshness re-invoke explicitly (no automatic retries).

use crate::models::{CandidateResult, CatalogQuery, ReleaseMetadata, ReleaseTrack};
use crate::services::confidence_scorer::{confidence, is_compilation_artist};
use crate::services::discogs_client::{
    CatalogError, DiscogsClient, DiscogsImage, DiscogsMaster, DiscogsRelease, DiscogsSearchResult,
};
use crate::services::title_parser::{parse_title, strip_artist_suffix};
use std::sync::Arc;

const DISCOGS_WEB_BASE: &str = "https://www.discogs.com";

/// Ranking penalty applied to compilation-artist candidates: they stay
/// visible but sort below equivalent non-compilation hits
const COMPILATION_PENALTY: f64 = 0.85;

/// Resolves free-text or partial identifiers to ranked catalog candidates
/// and full release metadata
pub struct ReleaseResolver {
    client: Arc<DiscogsClient>,
}

impl ReleaseResolver {
    pub fn new(client: Arc<DiscogsClient>) -> Self {
        Self { client }
    }

    /// Search the catalog, returning confidence-ranked candidates
    ///
    /// Issues a field-constrained search first; on zero results with at
    /// least one of artist/album supplied, retries once with a loose
    /// free-text keyword query. The returned set is sorted by confidence
    /// descending (release id breaks ties). Remote failures degrade to an
    /// empty list.
    pub async fn search_candidates(&self, query: &CatalogQuery) -> Vec<CandidateResult> {
        let results = match self.client.search(query).await {
            Ok(results) => results,
            Err(e) => {
                log_degraded(&e, "catalog search");
                return Vec::new();
            }
        };

        let results = if results.is_empty() && (query.artist.is_some() || query.album.is_some()) {
            let keywords = [query.artist.as_deref(), query.album.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            tracing::debug!(keywords = %keywords, "Strict search empty, retrying with keyword query");

            match self.client.search_text(&keywords, query.limit).await {
                Ok(results) => results,
                Err(e) => {
                    log_degraded(&e, "catalog keyword search");
                    return Vec::new();
                }
            }
        } else {
            results
        };

        let mut candidates: Vec<CandidateResult> = results
            .iter()
            .map(|result| candidate_from_result(result, query))
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.release_id.cmp(&b.release_id))
        });
        candidates.truncate(query.limit.max(1) as usize);

        tracing::debug!(
            candidates = candidates.len(),
            top_confidence = ?candidates.first().map(|c| c.confidence),
            "Candidate search complete"
        );

        candidates
    }

    /// Resolve full release metadata for an (artist, album) pair
    ///
    /// Returns None when nothing matches or the remote side fails.
    pub async fn resolve_release(&self, artist: &str, album: &str) -> Option<ReleaseMetadata> {
        let query = CatalogQuery {
            artist: non_blank(artist),
            album: non_blank(album),
            track: None,
            label: None,
            limit: 5,
        };

        if query.artist.is_none() && query.album.is_none() {
            return None;
        }

        let candidates = self.search_candidates(&query).await;
        let top = candidates.first()?;

        self.fetch_metadata(top).await
    }

    /// Fetch detail for a chosen candidate, preferring the master grouping
    async fn fetch_metadata(&self, candidate: &CandidateResult) -> Option<ReleaseMetadata> {
        // Master detail carries the more reliable original year/artwork.
        if let Some(master_id) = candidate.master_id {
            match self.client.get_master(master_id).await {
                Ok(fetched) => return Some(metadata_from_master(&fetched.value, fetched.cached)),
                Err(e) => log_degraded(&e, "master detail"),
            }
        }

        let Some(release_id) = release_fallback_id(candidate) else {
            return None;
        };

        match self.client.get_release(release_id).await {
            Ok(fetched) => Some(metadata_from_release(&fetched.value, fetched.cached)),
            Err(e) => {
                log_degraded(&e, "release detail");
                None
            }
        }
    }
}

/// Release-namespace id usable after a failed or absent master fetch
///
/// A master-type search hit mirrors its master id into `release_id`, so it
/// has no release endpoint of its own; querying the release namespace with
/// a master id would fetch an unrelated record.
fn release_fallback_id(candidate: &CandidateResult) -> Option<u64> {
    (candidate.master_id != Some(candidate.release_id)).then_some(candidate.release_id)
}

/// Map a provider failure to its degraded-logging level
///
/// 429 warns (provider pressure), 404 is expected (info), anything else is
/// a transport failure (error). Nothing here is thrown to the caller.
fn log_degraded(error: &CatalogError, operation: &str) {
    match error {
        CatalogError::RateLimited => {
            tracing::warn!(operation, "Remote catalog rate-limited; degrading to empty result");
        }
        CatalogError::NotFound(context) => {
            tracing::info!(operation, context = %context, "Remote catalog resource not found");
        }
        other => {
            tracing::error!(operation, error = %other, "Remote catalog call failed; degrading to empty result");
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Score one search hit against the requested fields
fn candidate_from_result(result: &DiscogsSearchResult, query: &CatalogQuery) -> CandidateResult {
    let parsed = parse_title(&result.title);

    let mut score = confidence(
        query.artist.as_deref(),
        query.album.as_deref(),
        Some(&parsed.artist),
        parsed.album.as_deref(),
    );

    if is_compilation_artist(&parsed.artist) {
        score *= COMPILATION_PENALTY;
    }

    let is_master_hit = result.result_type.as_deref() == Some("master");
    let master_id = if is_master_hit {
        // The hit's own id is the master id; there is no release id
        Some(result.id)
    } else {
        result.master_id.filter(|&id| id > 0)
    };

    let release_url = match master_id {
        Some(master_id) => format!("{}/master/{}", DISCOGS_WEB_BASE, master_id),
        None => result
            .uri
            .as_ref()
            .map(|uri| {
                if uri.starts_with("http") {
                    uri.clone()
                } else {
                    format!("{}{}", DISCOGS_WEB_BASE, uri)
                }
            })
            .unwrap_or_else(|| format!("{}/release/{}", DISCOGS_WEB_BASE, result.id)),
    };

    CandidateResult {
        artist: parsed.artist,
        album: parsed.album.unwrap_or_default(),
        release_id: result.id,
        master_id,
        release_url,
        artwork_url: result.cover_image.clone().or_else(|| result.thumb.clone()),
        confidence: score,
    }
}

/// Pick the primary image, falling back to the first
fn primary_image(images: &[DiscogsImage]) -> Option<String> {
    images
        .iter()
        .find(|img| img.image_type.as_deref() == Some("primary"))
        .or_else(|| images.first())
        .and_then(|img| img.uri.clone())
}

fn metadata_from_release(release: &DiscogsRelease, cached: bool) -> ReleaseMetadata {
    ReleaseMetadata {
        release_id: release.id,
        title: release.title.clone(),
        artist: release
            .artists
            .first()
            .map(|a| strip_artist_suffix(&a.name))
            .unwrap_or_default(),
        year: release.year,
        label: release.labels.first().map(|l| l.name.clone()),
        genres: release.genres.clone(),
        styles: release.styles.clone(),
        tracklist: release
            .tracklist
            .iter()
            .map(|t| ReleaseTrack {
                position: t.position.clone(),
                title: t.title.clone(),
                duration: t.duration.clone(),
            })
            .collect(),
        artwork_url: primary_image(&release.images),
        release_url: release
            .uri
            .clone()
            .unwrap_or_else(|| format!("{}/release/{}", DISCOGS_WEB_BASE, release.id)),
        cached,
    }
}

fn metadata_from_master(master: &DiscogsMaster, cached: bool) -> ReleaseMetadata {
    ReleaseMetadata {
        // The catalog namespace key: the master's main release when known
        release_id: master.main_release.unwrap_or(master.id),
        title: master.title.clone(),
        artist: master
            .artists
            .first()
            .map(|a| strip_artist_suffix(&a.name))
            .unwrap_or_default(),
        year: master.year,
        label: None,
        genres: master.genres.clone(),
        styles: master.styles.clone(),
        tracklist: master
            .tracklist
            .iter()
            .map(|t| ReleaseTrack {
                position: t.position.clone(),
                title: t.title.clone(),
                duration: t.duration.clone(),
            })
            .collect(),
        artwork_url: primary_image(&master.images),
        release_url: master
            .uri
            .clone()
            .unwrap_or_else(|| format!("{}/master/{}", DISCOGS_WEB_BASE, master.id)),
        cached,
    }
}

/// Advisory check that a claimed (track, artist) pair is plausible for a
/// resolved release
///
/// Case-insensitive substring containment between the claimed title and
/// any tracklist entry; bidirectional containment for the artist, with the
/// catalog's trailing "(n)" disambiguation stripped. Loose by design, not
/// authoritative.
pub fn validate_track(claimed_title: &str, claimed_artist: &str, release: &ReleaseMetadata) -> bool {
    let title = claimed_title.trim().to_lowercase();
    if title.is_empty() {
        return false;
    }

    let title_found = release.tracklist.iter().any(|track| {
        let entry = track.title.to_lowercase();
        entry.contains(&title) || title.contains(&entry)
    });
    if !title_found {
        return false;
    }

    let claimed = strip_artist_suffix(claimed_artist).to_lowercase();
    let release_artist = strip_artist_suffix(&release.artist).to_lowercase();
    if claimed.is_empty() || release_artist.is_empty() {
        return false;
    }

    claimed.contains(&release_artist) || release_artist.contains(&claimed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_result(id: u64, title: &str) -> DiscogsSearchResult {
        serde_json::from_value(serde_json::json!({ "id": id, "title": title })).unwrap()
    }

    fn release_fixture() -> ReleaseMetadata {
        ReleaseMetadata {
            release_id: 249504,
            title: "OK Computer".to_string(),
            artist: "Radiohead".to_string(),
            year: Some(1997),
            label: Some("Parlophone".to_string()),
            genres: vec!["Rock".to_string()],
            styles: vec!["Alternative Rock".to_string()],
            tracklist: vec![
                ReleaseTrack {
                    position: "1".to_string(),
                    title: "Airbag".to_string(),
                    duration: Some("4:44".to_string()),
                },
                ReleaseTrack {
                    position: "2".to_string(),
                    title: "Paranoid Android".to_string(),
                    duration: Some("6:23".to_string()),
                },
            ],
            artwork_url: None,
            release_url: "https://www.discogs.com/release/249504".to_string(),
            cached: false,
        }
    }

    #[test]
    fn test_candidate_scoring_and_fields() {
        let query = CatalogQuery {
            artist: Some("Radiohead".to_string()),
            album: Some("OK Computer".to_string()),
            limit: 10,
            ..Default::default()
        };
        let result = search_result(249504, "Radiohead - OK Computer");
        let candidate = candidate_from_result(&result, &query);

        assert_eq!(candidate.artist, "Radiohead");
        assert_eq!(candidate.album, "OK Computer");
        assert_eq!(candidate.release_id, 249504);
        assert!(candidate.confidence > 0.99);
    }

    #[test]
    fn test_compilation_candidate_penalized() {
        let query = CatalogQuery {
            album: Some("Greatest Hits".to_string()),
            limit: 10,
            ..Default::default()
        };
        let comp = candidate_from_result(&search_result(1, "Various - Greatest Hits"), &query);
        let named = candidate_from_result(&search_result(2, "Queen - Greatest Hits"), &query);

        // Album halves score identically; the compilation penalty decides
        assert!(comp.confidence < named.confidence);
    }

    #[test]
    fn test_master_hit_carries_master_id() {
        let mut result = search_result(21419, "Radiohead - OK Computer");
        result.result_type = Some("master".to_string());
        let query = CatalogQuery::default();
        let candidate = candidate_from_result(&result, &query);

        assert!(candidate.release_url.ends_with("/master/21419"));
        assert_eq!(candidate.master_id, Some(21419));
        assert_eq!(candidate.release_id, 21419);
    }

    #[test]
    fn test_release_hit_with_master_reference() {
        let mut result = search_result(249504, "Radiohead - OK Computer");
        result.master_id = Some(21419);
        let candidate = candidate_from_result(&result, &CatalogQuery::default());

        assert_eq!(candidate.master_id, Some(21419));
        assert_eq!(candidate.release_id, 249504);
    }

    #[test]
    fn test_plain_release_has_no_master() {
        let candidate =
            candidate_from_result(&search_result(77, "Some Band - Some Album"), &CatalogQuery::default());
        assert_eq!(candidate.master_id, None);
    }

    #[test]
    fn test_master_only_hit_never_falls_back_to_release_endpoint() {
        // A master-type hit holds the master id in both fields; after a
        // failed master fetch there is no release id to fall back to.
        let mut result = search_result(21419, "Radiohead - OK Computer");
        result.result_type = Some("master".to_string());
        let master_only = candidate_from_result(&result, &CatalogQuery::default());
        assert_eq!(release_fallback_id(&master_only), None);

        // A release hit grouped under a master keeps its own release id
        // as the fallback target
        let mut result = search_result(249504, "Radiohead - OK Computer");
        result.master_id = Some(21419);
        let grouped_release = candidate_from_result(&result, &CatalogQuery::default());
        assert_eq!(release_fallback_id(&grouped_release), Some(249504));

        // An ungrouped release fetches its release directly
        let plain = candidate_from_result(&search_result(77, "Band - Album"), &CatalogQuery::default());
        assert_eq!(release_fallback_id(&plain), Some(77));
    }

    #[test]
    fn test_validate_track_accepts_match() {
        let release = release_fixture();
        assert!(validate_track("Paranoid Android", "Radiohead", &release));
        // Case-insensitive, partial containment
        assert!(validate_track("paranoid android", "radiohead", &release));
        assert!(validate_track("Paranoid Android (Live)", "Radiohead", &release));
    }

    #[test]
    fn test_validate_track_rejects_mismatch() {
        let release = release_fixture();
        assert!(!validate_track("Creep", "Radiohead", &release));
        assert!(!validate_track("Paranoid Android", "Muse", &release));
        assert!(!validate_track("", "Radiohead", &release));
    }

    #[test]
    fn test_validate_track_strips_artist_suffix() {
        let mut release = release_fixture();
        release.artist = "Radiohead (2)".to_string();
        assert!(validate_track("Airbag", "Radiohead", &release));
    }

    #[test]
    fn test_metadata_from_release_extraction() {
        let release: DiscogsRelease = serde_json::from_value(serde_json::json!({
            "id": 10,
            "title": "Album",
            "artists": [{"name": "Artist (3)"}],
            "year": 2001,
            "labels": [{"name": "Label X"}],
            "genres": ["Jazz"],
            "styles": ["Hard Bop"],
            "tracklist": [{"position": "A1", "title": "Opener", "duration": "5:01"}],
            "images": [
                {"uri": "https://img/secondary.jpg", "type": "secondary"},
                {"uri": "https://img/primary.jpg", "type": "primary"}
            ]
        }))
        .unwrap();

        let metadata = metadata_from_release(&release, true);
        assert_eq!(metadata.artist, "Artist");
        assert_eq!(metadata.label.as_deref(), Some("Label X"));
        assert_eq!(metadata.artwork_url.as_deref(), Some("https://img/primary.jpg"));
        assert!(metadata.cached);
        assert_eq!(metadata.tracklist[0].position, "A1");
    }

    #[test]
    fn test_metadata_from_master_prefers_main_release_id() {
        let master: DiscogsMaster = serde_json::from_value(serde_json::json!({
            "id": 21419,
            "title": "OK Computer",
            "artists": [{"name": "Radiohead"}],
            "year": 1997,
            "main_release": 249504
        }))
        .unwrap();

        let metadata = metadata_from_master(&master, false);
        assert_eq!(metadata.release_id, 249504);
        assert_eq!(metadata.year, Some(1997));
        assert!(!metadata.cached);
    }
}
