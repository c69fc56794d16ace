//! Track index queries
//!
//! The track index is a local cache of previously resolved remote-catalog
//! tracks; entries carry the remote track identifier, which makes them the
//! preferred duplicate during aggregation.

use crate::models::{RotationBin, TrackQuery, TrackSearchResult, TrackSource};
use spinlog_common::Result;
use sqlx::{PgPool, Row};

/// Fuzzy-search the track index, joined to active rotation
pub async fn search_track_index(pool: &PgPool, query: &TrackQuery) -> Result<Vec<TrackSearchResult>> {
    let rows = sqlx::query(
        r#"
        SELECT t.track_id, t.title, t.position, t.duration,
               t.album_id, t.album_title, t.artist_name, t.label,
               r.rotation_id, r.frequency
        FROM track_index t
        LEFT JOIN rotation r
          ON lower(r.artist_name) = lower(t.artist_name)
         AND lower(r.album_title) = lower(t.album_title)
         AND (r.kill_date IS NULL OR r.kill_date > now())
        WHERE t.title % $1
          AND ($2::text IS NULL OR t.artist_name % $2)
          AND ($3::text IS NULL OR t.album_title % $3)
          AND ($4::text IS NULL OR t.label ILIKE '%' || $4 || '%')
        ORDER BY similarity(t.title, $1) DESC
        LIMIT $5
        "#,
    )
    .bind(&query.song)
    .bind(&query.artist)
    .bind(&query.album)
    .bind(&query.label)
    .bind(query.limit)
    .fetch_all(pool)
    .await?;

    let results = rows
        .iter()
        .map(|row| {
            let frequency: Option<String> = row.get("frequency");
            TrackSearchResult {
                track_id: row.get("track_id"),
                title: row.get("title"),
                position: row.get("position"),
                duration: row.get("duration"),
                album_id: row.get("album_id"),
                album_title: row.get("album_title"),
                artist_name: row.get("artist_name"),
                label: row.get("label"),
                rotation_id: row.get("rotation_id"),
                rotation_bin: frequency.as_deref().and_then(RotationBin::from_code),
                source: TrackSource::RemoteIndex,
            }
        })
        .collect();

    Ok(results)
}
