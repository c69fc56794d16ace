//! Discogs API client
//!
//! Transport wrapper for the remote catalog: every call is cache-checked
//! first, then gated through the token-bucket rate limiter before the HTTP
//! request goes out. The bucket is owned by the client instance, so
//! independent clients never share one.
//!
//! Authenticated requests are capped well under the Discogs 60 req/min
//! limit; the bucket delays rather than rejects, so callers never see a
//! hard rate-limit error from this side.

use crate::models::CatalogQuery;
use crate::services::rate_limiter::TokenBucket;
use crate::services::result_cache::{cache_key, ResultCache};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const DISCOGS_BASE_URL: &str = "https://api.discogs.com";
const USER_AGENT: &str = "spinlog/0.1.0 +https://spinlog.example.org";

/// Bucket sized for the authenticated Discogs cap: bursts of 5, refilling
/// at one token per 1100ms (slightly conservative)
const RATE_BURST: u32 = 5;
const RATE_REFILL_PER_MS: f64 = 1.0 / 1100.0;

/// Cache TTLs per operation family
const SEARCH_TTL: Duration = Duration::from_secs(30 * 60);
const TRACK_SEARCH_TTL: Duration = Duration::from_secs(10 * 60);
const DETAIL_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const CACHE_MAX_ENTRIES: usize = 512;

/// Remote catalog client errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A fetched detail value plus its cache provenance
///
/// `cached` is provenance only; it never participates in equality.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub value: T,
    pub cached: bool,
}

/// Top-level search response wrapper
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<DiscogsSearchResult>,
}

/// A single result from the database search endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsSearchResult {
    /// Release or master id
    pub id: u64,
    /// Combined "Artist - Title" string
    pub title: String,
    /// "release" or "master"
    #[serde(rename = "type", default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub label: Vec<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub thumb: Option<String>,
    /// Present (and nonzero) when the result belongs to a master grouping
    #[serde(default)]
    pub master_id: Option<u64>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// An artist credit on a release or master
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsArtistCredit {
    pub name: String,
    #[serde(default)]
    pub id: Option<u64>,
}

/// A record label entry on a release
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsLabel {
    pub name: String,
    #[serde(default)]
    pub catno: Option<String>,
}

/// A tracklist entry
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsTrack {
    #[serde(default)]
    pub position: String,
    pub title: String,
    #[serde(default)]
    pub duration: Option<String>,
}

/// An image attached to a release or master
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsImage {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(rename = "type", default)]
    pub image_type: Option<String>,
}

/// Full release details from `/releases/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsRelease {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<DiscogsArtistCredit>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub labels: Vec<DiscogsLabel>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub tracklist: Vec<DiscogsTrack>,
    #[serde(default)]
    pub images: Vec<DiscogsImage>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Master details from `/masters/{id}`
///
/// A master is the canonical grouping of a work across all its pressings;
/// its year and artwork are more reliable than any single release's.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsMaster {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<DiscogsArtistCredit>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub tracklist: Vec<DiscogsTrack>,
    #[serde(default)]
    pub images: Vec<DiscogsImage>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub main_release: Option<u64>,
}

/// Artist details from `/artists/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscogsArtist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Discogs API client with per-instance rate limiting and caching
pub struct DiscogsClient {
    http: reqwest::Client,
    key: String,
    secret: String,
    rate_limiter: TokenBucket,
    search_cache: ResultCache<Vec<DiscogsSearchResult>>,
    track_search_cache: ResultCache<Vec<DiscogsSearchResult>>,
    release_cache: ResultCache<DiscogsRelease>,
    master_cache: ResultCache<DiscogsMaster>,
    artist_cache: ResultCache<DiscogsArtist>,
}

impl DiscogsClient {
    pub fn new(key: String, secret: String) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        Ok(Self {
            http,
            key,
            secret,
            rate_limiter: TokenBucket::new(RATE_BURST, RATE_REFILL_PER_MS),
            search_cache: ResultCache::new(SEARCH_TTL, CACHE_MAX_ENTRIES),
            track_search_cache: ResultCache::new(TRACK_SEARCH_TTL, CACHE_MAX_ENTRIES),
            release_cache: ResultCache::new(DETAIL_TTL, CACHE_MAX_ENTRIES),
            master_cache: ResultCache::new(DETAIL_TTL, CACHE_MAX_ENTRIES),
            artist_cache: ResultCache::new(DETAIL_TTL, CACHE_MAX_ENTRIES),
        })
    }

    fn auth_header(&self) -> String {
        format!("Discogs key={}, secret={}", self.key, self.secret)
    }

    /// Field-constrained database search (`artist` / `release_title` /
    /// `track`, restricted to release and master types)
    pub async fn search(&self, query: &CatalogQuery) -> Result<Vec<DiscogsSearchResult>, CatalogError> {
        let key = cache_key(
            "search",
            &[
                query.artist.as_deref(),
                query.album.as_deref(),
                query.track.as_deref(),
                query.label.as_deref(),
                Some(&query.limit.to_string()),
            ],
        );

        // Track-bearing searches are more volatile; they get their own
        // shorter-lived cache
        let cache = if query.track.is_some() {
            &self.track_search_cache
        } else {
            &self.search_cache
        };

        if let Some(hit) = cache.get(&key).await {
            tracing::debug!(cache_key = %key, "Search served from cache");
            return Ok(hit);
        }

        let mut params: Vec<(&str, String)> = vec![
            ("type", "release,master".to_string()),
            ("per_page", query.limit.max(1).to_string()),
        ];
        if let Some(artist) = &query.artist {
            params.push(("artist", artist.clone()));
        }
        if let Some(album) = &query.album {
            params.push(("release_title", album.clone()));
        }
        if let Some(track) = &query.track {
            params.push(("track", track.clone()));
        }
        if let Some(label) = &query.label {
            params.push(("label", label.clone()));
        }

        let results = self.execute_search(&params).await?;
        cache.set(key, results.clone()).await;
        Ok(results)
    }

    /// Loose free-text keyword search (`q` parameter)
    ///
    /// Fallback for cases where strict field matching fails due to
    /// titling-convention mismatches.
    pub async fn search_text(&self, keywords: &str, limit: u32) -> Result<Vec<DiscogsSearchResult>, CatalogError> {
        let key = cache_key("search_text", &[Some(keywords), Some(&limit.to_string())]);

        if let Some(hit) = self.search_cache.get(&key).await {
            tracing::debug!(cache_key = %key, "Keyword search served from cache");
            return Ok(hit);
        }

        let params = vec![
            ("q", keywords.to_string()),
            ("type", "release,master".to_string()),
            ("per_page", limit.max(1).to_string()),
        ];

        let results = self.execute_search(&params).await?;
        self.search_cache.set(key, results.clone()).await;
        Ok(results)
    }

    async fn execute_search(&self, params: &[(&str, String)]) -> Result<Vec<DiscogsSearchResult>, CatalogError> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/database/search", DISCOGS_BASE_URL);
        tracing::debug!(url = %url, "Querying Discogs search");

        let response = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(params)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let response = Self::check_status(response, "search").await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))?;

        tracing::debug!(results = body.results.len(), "Discogs search complete");
        Ok(body.results)
    }

    /// Fetch release detail by id
    pub async fn get_release(&self, release_id: u64) -> Result<Fetched<DiscogsRelease>, CatalogError> {
        let id = release_id.to_string();
        let key = cache_key("release", &[Some(&id)]);

        if let Some(hit) = self.release_cache.get(&key).await {
            tracing::debug!(release_id, "Release served from cache");
            return Ok(Fetched { value: hit, cached: true });
        }

        let url = format!("{}/releases/{}", DISCOGS_BASE_URL, release_id);
        let release: DiscogsRelease = self.fetch_detail(&url, &format!("release {}", release_id)).await?;

        tracing::info!(
            release_id,
            title = %release.title,
            artist = %release.artists.first().map(|a| a.name.as_str()).unwrap_or("Unknown"),
            "Retrieved release from Discogs"
        );

        self.release_cache.set(key, release.clone()).await;
        Ok(Fetched { value: release, cached: false })
    }

    /// Fetch master detail by id
    pub async fn get_master(&self, master_id: u64) -> Result<Fetched<DiscogsMaster>, CatalogError> {
        let id = master_id.to_string();
        let key = cache_key("master", &[Some(&id)]);

        if let Some(hit) = self.master_cache.get(&key).await {
            tracing::debug!(master_id, "Master served from cache");
            return Ok(Fetched { value: hit, cached: true });
        }

        let url = format!("{}/masters/{}", DISCOGS_BASE_URL, master_id);
        let master: DiscogsMaster = self.fetch_detail(&url, &format!("master {}", master_id)).await?;

        self.master_cache.set(key, master.clone()).await;
        Ok(Fetched { value: master, cached: false })
    }

    /// Fetch artist detail by id
    pub async fn get_artist(&self, artist_id: u64) -> Result<Fetched<DiscogsArtist>, CatalogError> {
        let id = artist_id.to_string();
        let key = cache_key("artist", &[Some(&id)]);

        if let Some(hit) = self.artist_cache.get(&key).await {
            tracing::debug!(artist_id, "Artist served from cache");
            return Ok(Fetched { value: hit, cached: true });
        }

        let url = format!("{}/artists/{}", DISCOGS_BASE_URL, artist_id);
        let artist: DiscogsArtist = self.fetch_detail(&url, &format!("artist {}", artist_id)).await?;

        self.artist_cache.set(key, artist.clone()).await;
        Ok(Fetched { value: artist, cached: false })
    }

    async fn fetch_detail<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> Result<T, CatalogError> {
        self.rate_limiter.acquire().await;

        tracing::debug!(url = %url, "Querying Discogs API");

        let response = self
            .http
            .get(url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let response = Self::check_status(response, context).await?;

        response
            .json()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, CatalogError> {
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(CatalogError::RateLimited);
        }
        if status.as_u16() == 404 {
            return Err(CatalogError::NotFound(context.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(status.as_u16(), body));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DiscogsClient::new("key".to_string(), "secret".to_string());
        assert!(client.is_ok());
    }

    #[test]
    fn test_auth_header_format() {
        let client = DiscogsClient::new("my-key".to_string(), "my-secret".to_string()).unwrap();
        assert_eq!(client.auth_header(), "Discogs key=my-key, secret=my-secret");
    }

    #[test]
    fn test_search_response_deserialize() {
        let json = r#"{
            "results": [
                {
                    "id": 249504,
                    "type": "release",
                    "title": "Radiohead - OK Computer",
                    "year": "1997",
                    "label": ["Parlophone"],
                    "cover_image": "https://img.discogs.com/cover.jpg",
                    "master_id": 21419,
                    "uri": "/Radiohead-OK-Computer/release/249504"
                }
            ]
        }"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 1);
        let result = &response.results[0];
        assert_eq!(result.id, 249504);
        assert_eq!(result.result_type.as_deref(), Some("release"));
        assert_eq!(result.title, "Radiohead - OK Computer");
        assert_eq!(result.year.as_deref(), Some("1997"));
        assert_eq!(result.label, vec!["Parlophone"]);
        assert_eq!(result.master_id, Some(21419));
    }

    #[test]
    fn test_search_result_deserialize_minimal() {
        let json = r#"{"id": 1, "title": "Test"}"#;
        let result: DiscogsSearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.id, 1);
        assert!(result.result_type.is_none());
        assert!(result.year.is_none());
        assert!(result.label.is_empty());
        assert!(result.master_id.is_none());
    }

    #[test]
    fn test_release_deserialize() {
        let json = r#"{
            "id": 249504,
            "title": "OK Computer",
            "artists": [{"name": "Radiohead", "id": 3840}],
            "year": 1997,
            "labels": [{"name": "Parlophone", "catno": "7243 8 55229 2 8"}],
            "genres": ["Rock"],
            "styles": ["Alternative Rock"],
            "tracklist": [
                {"position": "1", "title": "Airbag", "duration": "4:44"},
                {"position": "2", "title": "Paranoid Android", "duration": "6:23"}
            ],
            "images": [{"uri": "https://img.discogs.com/primary.jpg", "type": "primary"}],
            "uri": "https://www.discogs.com/release/249504"
        }"#;
        let release: DiscogsRelease = serde_json::from_str(json).unwrap();
        assert_eq!(release.id, 249504);
        assert_eq!(release.year, Some(1997));
        assert_eq!(release.artists[0].name, "Radiohead");
        assert_eq!(release.labels[0].catno.as_deref(), Some("7243 8 55229 2 8"));
        assert_eq!(release.tracklist.len(), 2);
        assert_eq!(release.tracklist[1].title, "Paranoid Android");
        assert_eq!(release.tracklist[1].duration.as_deref(), Some("6:23"));
    }

    #[test]
    fn test_release_deserialize_minimal() {
        let json = r#"{"id": 1, "title": "Bare"}"#;
        let release: DiscogsRelease = serde_json::from_str(json).unwrap();
        assert!(release.artists.is_empty());
        assert!(release.year.is_none());
        assert!(release.tracklist.is_empty());
        assert!(release.images.is_empty());
    }

    #[test]
    fn test_master_deserialize() {
        let json = r#"{
            "id": 21419,
            "title": "OK Computer",
            "artists": [{"name": "Radiohead"}],
            "year": 1997,
            "main_release": 249504,
            "genres": ["Rock"],
            "tracklist": [{"position": "1", "title": "Airbag"}]
        }"#;
        let master: DiscogsMaster = serde_json::from_str(json).unwrap();
        assert_eq!(master.id, 21419);
        assert_eq!(master.main_release, Some(249504));
        assert_eq!(master.year, Some(1997));
    }

    #[test]
    fn test_artist_deserialize() {
        let json = r#"{
            "id": 3840,
            "name": "Radiohead",
            "profile": "English rock band.",
            "urls": ["https://radiohead.com"]
        }"#;
        let artist: DiscogsArtist = serde_json::from_str(json).unwrap();
        assert_eq!(artist.name, "Radiohead");
        assert_eq!(artist.urls.len(), 1);
    }
}
