//! On-air history queries
//!
//! History rows record what actually aired; they carry no remote track
//! identifier but often the richest artist/album text.

use crate::models::{RotationBin, TrackQuery, TrackSearchResult, TrackSource};
use spinlog_common::Result;
use sqlx::{PgPool, Row};

/// Fuzzy-search the on-air history, joined to active rotation
pub async fn search_history(pool: &PgPool, query: &TrackQuery) -> Result<Vec<TrackSearchResult>> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT ON (lower(h.title), lower(h.artist_name), lower(h.album_title))
               h.title, h.album_title, h.artist_name, h.label,
               r.rotation_id, r.frequency
        FROM play_history h
        LEFT JOIN rotation r
          ON lower(r.artist_name) = lower(h.artist_name)
         AND lower(r.album_title) = lower(h.album_title)
         AND (r.kill_date IS NULL OR r.kill_date > now())
        WHERE h.title % $1
          AND ($2::text IS NULL OR h.artist_name % $2)
          AND ($3::text IS NULL OR h.album_title % $3)
          AND ($4::text IS NULL OR h.label ILIKE '%' || $4 || '%')
        ORDER BY lower(h.title), lower(h.artist_name), lower(h.album_title),
                 similarity(h.title, $1) DESC
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
                source: TrackSource::History,
            }
        })
        .collect();

    Ok(results)
}
