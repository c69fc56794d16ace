//! Local multi-source track search aggregation
//!
//! Queries the track index, on-air history, and DJ bins concurrently
//! (independent, latency-bound reads), then merges by a normalized
//! (title, artist, album) key, dedups with a completeness preference, and
//! ranks by programming priority: active rotation first, then rotation
//! frequency bin, then source. Textual-match strength never outranks an
//! actively promoted track.
//!
//! A failure in any source fails the whole search: a database error means
//! the aggregator cannot be trusted to have searched at all, which is a
//! different condition from "no rows matched".

use crate::db;
use crate::models::{TrackQuery, TrackSearchResult};
use spinlog_common::Result;
use sqlx::PgPool;
use std::collections::HashMap;

/// Aggregates fuzzy track search across the three local stores
pub struct TrackAggregator {
    pool: PgPool,
}

impl TrackAggregator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search all three sources concurrently, merge, rank, and truncate
    ///
    /// Returns an empty list when nothing matches; propagates the error
    /// when any source query fails.
    pub async fn search(&self, query: &TrackQuery) -> Result<Vec<TrackSearchResult>> {
        let (index_hits, history_hits, bin_hits) = tokio::try_join!(
            db::search_track_index(&self.pool, query),
            db::search_history(&self.pool, query),
            db::search_bins(&self.pool, query),
        )?;

        tracing::debug!(
            song = %query.song,
            index = index_hits.len(),
            history = history_hits.len(),
            bins = bin_hits.len(),
            "Local source queries complete"
        );

        let mut merged = merge_results(
            index_hits
                .into_iter()
                .chain(history_hits)
                .chain(bin_hits)
                .collect(),
        );
        rank_results(&mut merged);
        merged.truncate(query.limit.max(0) as usize);

        Ok(merged)
    }
}

/// Normalized dedup key over (title, artist, album)
fn merge_key(result: &TrackSearchResult) -> (String, String, String) {
    (
        result.title.trim().to_lowercase(),
        result.artist_name.trim().to_lowercase(),
        result.album_title.trim().to_lowercase(),
    )
}

/// Merge duplicates down to one entry per normalized key
///
/// Preference order: the entry carrying a remote track identifier, then
/// the one carrying active-rotation linkage, then source rank. Both of the
/// first two are strictly more complete than their alternatives.
pub fn merge_results(results: Vec<TrackSearchResult>) -> Vec<TrackSearchResult> {
    let mut by_key: HashMap<(String, String, String), TrackSearchResult> = HashMap::new();

    for result in results {
        let key = merge_key(&result);
        let replace = match by_key.get(&key) {
            Some(existing) => prefer(&result, existing),
            None => true,
        };
        if replace {
            by_key.insert(key, result);
        }
    }

    by_key.into_values().collect()
}

/// Whether `candidate` should replace `existing` for the same merge key
fn prefer(candidate: &TrackSearchResult, existing: &TrackSearchResult) -> bool {
    match (candidate.track_id.is_some(), existing.track_id.is_some()) {
        (true, false) => return true,
        (false, true) => return false,
        _ => {}
    }
    match (candidate.rotation_id.is_some(), existing.rotation_id.is_some()) {
        (true, false) => return true,
        (false, true) => return false,
        _ => {}
    }
    candidate.source.rank() < existing.source.rank()
}

/// Rank merged results by programming priority
///
/// (1) active-rotation membership, (2) rotation bin ordinal, (3) source
/// preference; title/artist break remaining ties deterministically.
pub fn rank_results(results: &mut [TrackSearchResult]) {
    results.sort_by(|a, b| {
        let a_rotation = a.rotation_id.is_none();
        let b_rotation = b.rotation_id.is_none();

        a_rotation
            .cmp(&b_rotation) // in-rotation (false) sorts first
            .then_with(|| bin_ordinal(a).cmp(&bin_ordinal(b)))
            .then_with(|| a.source.rank().cmp(&b.source.rank()))
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.artist_name.to_lowercase().cmp(&b.artist_name.to_lowercase()))
    });
}

/// Bin ordinal for ranking; rotation rows with an unknown frequency code
/// sort after Spoken
fn bin_ordinal(result: &TrackSearchResult) -> u8 {
    result.rotation_bin.map(|bin| bin.ordinal()).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RotationBin, TrackSource};
    use uuid::Uuid;

    fn result(title: &str, artist: &str, album: &str, source: TrackSource) -> TrackSearchResult {
        TrackSearchResult {
            track_id: None,
            title: title.to_string(),
            position: None,
            duration: None,
            album_id: None,
            album_title: album.to_string(),
            artist_name: artist.to_string(),
            label: None,
            rotation_id: None,
            rotation_bin: None,
            source,
        }
    }

    #[test]
    fn test_merge_dedups_by_normalized_key() {
        let mut from_index = result("Paranoid Android", "Radiohead", "OK Computer", TrackSource::RemoteIndex);
        from_index.track_id = Some(42);
        // Same track, different casing and whitespace, from a bin
        let from_bin = result("  paranoid android ", "RADIOHEAD", "ok computer", TrackSource::Bin);

        let merged = merge_results(vec![from_bin, from_index]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].track_id, Some(42));
        assert_eq!(merged[0].source, TrackSource::RemoteIndex);
    }

    #[test]
    fn test_merge_prefers_remote_track_id_regardless_of_order() {
        let mut with_id = result("Song", "Artist", "Album", TrackSource::RemoteIndex);
        with_id.track_id = Some(7);
        let mut without_id = result("Song", "Artist", "Album", TrackSource::History);
        without_id.rotation_id = Some(Uuid::new_v4());

        // Track id beats rotation linkage
        let merged = merge_results(vec![without_id.clone(), with_id.clone()]);
        assert_eq!(merged[0].track_id, Some(7));

        let merged = merge_results(vec![with_id, without_id]);
        assert_eq!(merged[0].track_id, Some(7));
    }

    #[test]
    fn test_merge_prefers_rotation_linkage_when_no_track_id() {
        let plain = result("Song", "Artist", "Album", TrackSource::History);
        let mut in_rotation = result("Song", "Artist", "Album", TrackSource::Bin);
        in_rotation.rotation_id = Some(Uuid::new_v4());

        let merged = merge_results(vec![plain, in_rotation]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].rotation_id.is_some());
    }

    #[test]
    fn test_merge_keeps_distinct_tracks() {
        let a = result("Airbag", "Radiohead", "OK Computer", TrackSource::History);
        let b = result("Paranoid Android", "Radiohead", "OK Computer", TrackSource::History);

        let merged = merge_results(vec![a, b]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_rotation_outranks_textual_strength() {
        // Out-of-rotation result from the preferred source, listed first
        let strong_text = result("Paranoid Android", "Radiohead", "OK Computer", TrackSource::RemoteIndex);

        let mut heavy = result("Paranoid", "Black Sabbath", "Paranoid", TrackSource::Bin);
        heavy.rotation_id = Some(Uuid::new_v4());
        heavy.rotation_bin = Some(RotationBin::Heavy);

        let mut results = vec![strong_text, heavy];
        rank_results(&mut results);

        assert!(results[0].rotation_id.is_some());
        assert_eq!(results[0].rotation_bin, Some(RotationBin::Heavy));
    }

    #[test]
    fn test_bin_ordinal_ordering() {
        let mut light = result("A", "X", "Y", TrackSource::History);
        light.rotation_id = Some(Uuid::new_v4());
        light.rotation_bin = Some(RotationBin::Light);

        let mut heavy = result("B", "X", "Y", TrackSource::Bin);
        heavy.rotation_id = Some(Uuid::new_v4());
        heavy.rotation_bin = Some(RotationBin::Heavy);

        let mut spoken = result("C", "X", "Y", TrackSource::RemoteIndex);
        spoken.rotation_id = Some(Uuid::new_v4());
        spoken.rotation_bin = Some(RotationBin::Spoken);

        let mut results = vec![light, spoken, heavy];
        rank_results(&mut results);

        assert_eq!(results[0].rotation_bin, Some(RotationBin::Heavy));
        assert_eq!(results[1].rotation_bin, Some(RotationBin::Light));
        assert_eq!(results[2].rotation_bin, Some(RotationBin::Spoken));
    }

    #[test]
    fn test_source_preference_breaks_ties() {
        let from_bin = result("Song", "Artist", "Album A", TrackSource::Bin);
        let from_history = result("Song", "Artist", "Album B", TrackSource::History);
        let from_index = result("Song", "Artist", "Album C", TrackSource::RemoteIndex);

        let mut results = vec![from_bin, from_history, from_index];
        rank_results(&mut results);

        assert_eq!(results[0].source, TrackSource::RemoteIndex);
        assert_eq!(results[1].source, TrackSource::History);
        assert_eq!(results[2].source, TrackSource::Bin);
    }

    #[test]
    fn test_ranking_deterministic_on_equal_priority() {
        let a = result("Alpha", "Artist", "Album", TrackSource::History);
        let b = result("Beta", "Artist", "Album", TrackSource::History);

        let mut forward = vec![a.clone(), b.clone()];
        let mut backward = vec![b, a];
        rank_results(&mut forward);
        rank_results(&mut backward);

        assert_eq!(forward[0].title, backward[0].title);
        assert_eq!(forward[0].title, "Alpha");
    }
}
