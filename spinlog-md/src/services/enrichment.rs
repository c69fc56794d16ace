//! Fire-and-forget metadata enrichment
//!
//! Invoked only after a track-type log entry has been durably persisted.
//! The write path observes nothing beyond "scheduled": the task is spawned
//! detached, never awaited, and carries its own error boundary. Failures
//! are logged and discarded; the triggering caller is never affected.

use crate::db;
use crate::services::release_resolver::ReleaseResolver;
use std::sync::Arc;
use uuid::Uuid;

/// Schedules background metadata resolution after track writes
pub struct EnrichmentOrchestrator {
    pool: sqlx::PgPool,
    resolver: Arc<ReleaseResolver>,
}

impl EnrichmentOrchestrator {
    pub fn new(pool: sqlx::PgPool, resolver: Arc<ReleaseResolver>) -> Self {
        Self { pool, resolver }
    }

    /// Schedule enrichment for a just-persisted track entry
    ///
    /// Returns immediately. Entries with no artist/album text (pure
    /// announcements) are skipped. Re-enriching an already-resolved album
    /// is a cheap remote-cache hit.
    pub fn schedule(&self, album_id: Uuid, artist_name: String, album_title: String) {
        if artist_name.trim().is_empty() && album_title.trim().is_empty() {
            tracing::debug!(%album_id, "Skipping enrichment for entry without artist/album text");
            return;
        }

        let pool = self.pool.clone();
        let resolver = Arc::clone(&self.resolver);

        tokio::spawn(async move {
            if let Err(e) = enrich(&pool, &resolver, album_id, &artist_name, &album_title).await {
                tracing::warn!(
                    %album_id,
                    artist = %artist_name,
                    album = %album_title,
                    error = %e,
                    "Background enrichment failed"
                );
            }
        });
    }
}

async fn enrich(
    pool: &sqlx::PgPool,
    resolver: &ReleaseResolver,
    album_id: Uuid,
    artist_name: &str,
    album_title: &str,
) -> anyhow::Result<()> {
    let Some(metadata) = resolver.resolve_release(artist_name, album_title).await else {
        tracing::debug!(
            %album_id,
            artist = %artist_name,
            album = %album_title,
            "No catalog match; nothing to enrich"
        );
        return Ok(());
    };

    db::upsert_album_metadata(pool, album_id, artist_name, album_title, &metadata).await?;

    tracing::info!(
        %album_id,
        release_id = metadata.release_id,
        cached = metadata.cached,
        "Album metadata enriched"
    );

    Ok(())
}
