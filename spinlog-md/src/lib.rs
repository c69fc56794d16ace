//! # spinlog-md - Metadata Matching & Enrichment Engine
//!
//! Resolves free-text or partial track/album/artist identifiers against
//! the remote Discogs catalog and the local stores, producing ranked,
//! deduplicated, confidence-scored candidates, while shielding the rest
//! of the system from remote-API latency, rate limits, and transient
//! failures.
//!
//! The library exposes no HTTP surface; routing, validation, auth, and
//! persistence schema live with the consuming services.

pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{MdError, MdResult};

use crate::services::{DiscogsClient, EnrichmentOrchestrator, ReleaseResolver, TrackAggregator};
use spinlog_common::config::CatalogCredentials;
use sqlx::PgPool;
use std::sync::Arc;

/// Constructed metadata engine shared across callers
///
/// All remote-facing state (rate-limiter bucket, result caches) lives
/// inside the one client instance built here; independent engines never
/// share a bucket.
#[derive(Clone)]
pub struct MetadataState {
    /// Local database connection pool (read-only queries + metadata cache)
    pub pool: PgPool,
    /// Remote catalog client
    pub client: Arc<DiscogsClient>,
    /// Release resolution service
    pub resolver: Arc<ReleaseResolver>,
    /// Local multi-source track search
    pub aggregator: Arc<TrackAggregator>,
    /// Fire-and-forget enrichment
    pub enrichment: Arc<EnrichmentOrchestrator>,
}

impl MetadataState {
    pub fn new(pool: PgPool, credentials: CatalogCredentials) -> MdResult<Self> {
        let client = Arc::new(DiscogsClient::new(credentials.key, credentials.secret)?);
        let resolver = Arc::new(ReleaseResolver::new(Arc::clone(&client)));
        let aggregator = Arc::new(TrackAggregator::new(pool.clone()));
        let enrichment = Arc::new(EnrichmentOrchestrator::new(
            pool.clone(),
            Arc::clone(&resolver),
        ));

        Ok(Self {
            pool,
            client,
            resolver,
            aggregator,
            enrichment,
        })
    }
}
