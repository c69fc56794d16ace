//! Service modules for the metadata matching & enrichment engine

pub mod confidence_scorer;
pub mod discogs_client;
pub mod enrichment;
pub mod rate_limiter;
pub mod release_resolver;
pub mod result_cache;
pub mod title_parser;
pub mod track_aggregator;

pub use confidence_scorer::{confidence, is_compilation_artist};
pub use discogs_client::{CatalogError, DiscogsClient, DiscogsSearchResult, Fetched};
pub use enrichment::EnrichmentOrchestrator;
pub use rate_limiter::TokenBucket;
pub use release_resolver::{validate_track, ReleaseResolver};
pub use result_cache::{cache_key, ResultCache};
pub use title_parser::{parse_title, strip_artist_suffix, ParsedTitle};
pub use track_aggregator::TrackAggregator;
