//! DJ personal bin queries
//!
//! Bins are per-DJ working sets of tracks; the least complete of the three
//! sources and the last duplicate preference.

use crate::models::{RotationBin, TrackQuery, TrackSearchResult, TrackSource};
use spinlog_common::Result;
use sqlx::{PgPool, Row};

/// Fuzzy-search the DJ bins, joined to active rotation
pub async fn search_bins(pool: &PgPool, query: &TrackQuery) -> Result<Vec<TrackSearchResult>> {
    let rows = sqlx::query(
        r#"
        SELECT b.title, b.album_title, b.artist_name, b.label,
               r.rotation_id, r.frequency
        FROM dj_bins b
        LEFT JOIN rotation r
          ON lower(r.artist_name) = lower(b.artist_name)
         AND lower(r.album_title) = lower(b.album_title)
         AND (r.kill_date IS NULL OR r.kill_date > now())
        WHERE b.title % $1
          AND ($2::text IS NULL OR b.artist_name % $2)
          AND ($3::text IS NULL OR b.album_title % $3)
          AND ($4::text IS NULL OR b.label ILIKE '%' || $4 || '%')
        ORDER BY similarity(b.title, $1) DESC
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
                track_id: None,
                title: row.get("title"),
                position: None,
                duration: None,
                album_id: None,
                album_title: row.get("album_title"),
                artist_name: row.get("artist_name"),
                label: row.get("label"),
                rotation_id: row.get("rotation_id"),
                rotation_bin: frequency.as_deref().and_then(RotationBin::from_code),
                source: TrackSource::Bin,
            }
        })
        .collect();

    Ok(results)
}
