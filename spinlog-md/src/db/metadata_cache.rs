//! Album metadata cache persistence
//!
//! The enrichment orchestrator writes resolved release metadata here,
//! keyed by the local album id. Readers tolerate transiently absent rows;
//! enrichment may still be in flight when they look.

use crate::models::{ReleaseMetadata, ReleaseTrack};
use chrono::{DateTime, Utc};
use spinlog_common::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A cached album metadata row
#[derive(Debug, Clone)]
pub struct StoredAlbumMetadata {
    pub album_id: Uuid,
    pub artist_name: String,
    pub album_title: String,
    pub release_id: i64,
    pub year: Option<i32>,
    pub label: Option<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub tracklist: Vec<ReleaseTrack>,
    pub artwork_url: Option<String>,
    pub release_url: String,
    pub updated_at: DateTime<Utc>,
}

/// Release id narrowed to the bigint column type
///
/// Ids past i64::MAX cannot be stored; the caller skips the row rather
/// than writing a wrapped value.
fn release_id_column(release_id: u64) -> Option<i64> {
    i64::try_from(release_id).ok()
}

/// Year narrowed to the integer column type; out-of-range provider years
/// are dropped, the rest of the row still lands
fn year_column(year: Option<u32>) -> Option<i32> {
    year.and_then(|y| i32::try_from(y).ok())
}

/// Upsert resolved release metadata for an album
pub async fn upsert_album_metadata(
    pool: &PgPool,
    album_id: Uuid,
    artist_name: &str,
    album_title: &str,
    metadata: &ReleaseMetadata,
) -> Result<()> {
    let Some(release_id) = release_id_column(metadata.release_id) else {
        tracing::warn!(
            album_id = %album_id,
            release_id = metadata.release_id,
            "Release id exceeds storable range; skipping metadata upsert"
        );
        return Ok(());
    };

    sqlx::query(
        r#"
        INSERT INTO album_metadata
            (album_id, artist_name, album_title, release_id, year, label,
             genres, styles, tracklist, artwork_url, release_url, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now())
        ON CONFLICT (album_id) DO UPDATE SET
            artist_name = excluded.artist_name,
            album_title = excluded.album_title,
            release_id = excluded.release_id,
            year = excluded.year,
            label = excluded.label,
            genres = excluded.genres,
            styles = excluded.styles,
            tracklist = excluded.tracklist,
            artwork_url = excluded.artwork_url,
            release_url = excluded.release_url,
            updated_at = now()
        "#,
    )
    .bind(album_id)
    .bind(artist_name)
    .bind(album_title)
    .bind(release_id)
    .bind(year_column(metadata.year))
    .bind(&metadata.label)
    .bind(serde_json::to_value(&metadata.genres).unwrap_or_default())
    .bind(serde_json::to_value(&metadata.styles).unwrap_or_default())
    .bind(serde_json::to_value(&metadata.tracklist).unwrap_or_default())
    .bind(&metadata.artwork_url)
    .bind(&metadata.release_url)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load cached metadata for an album, if enrichment has landed
pub async fn load_album_metadata(pool: &PgPool, album_id: Uuid) -> Result<Option<StoredAlbumMetadata>> {
    let row = sqlx::query(
        r#"
        SELECT album_id, artist_name, album_title, release_id, year, label,
               genres, styles, tracklist, artwork_url, release_url, updated_at
        FROM album_metadata
        WHERE album_id = $1
        "#,
    )
    .bind(album_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let genres: serde_json::Value = row.get("genres");
            let styles: serde_json::Value = row.get("styles");
            let tracklist: serde_json::Value = row.get("tracklist");

            Ok(Some(StoredAlbumMetadata {
                album_id: row.get("album_id"),
                artist_name: row.get("artist_name"),
                album_title: row.get("album_title"),
                release_id: row.get("release_id"),
                year: row.get("year"),
                label: row.get("label"),
                genres: serde_json::from_value(genres).unwrap_or_default(),
                styles: serde_json::from_value(styles).unwrap_or_default(),
                tracklist: serde_json::from_value(tracklist).unwrap_or_default(),
                artwork_url: row.get("artwork_url"),
                release_url: row.get("release_url"),
                updated_at: row.get("updated_at"),
            }))
        }
        None => Ok(None),
    }
}
