//! TMDb API client
//!
//! Queries The Movie Database (API v3) for title searches, movie details and
//! credits. The workflow only sees the `MetadataSource` trait, so tests swap
//! in an in-memory source.
//!
//! # API Reference
//! - Search: https://api.themoviedb.org/3/search/movie?query=...
//! - Details: https://api.themoviedb.org/3/movie/{id}
//! - Credits: https://api.themoviedb.org/3/movie/{id}/credits

use async_trait::async_trait;
use cinelog_common::MovieId;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// TMDb API base URL
const TMDB_API_URL: &str = "https://api.themoviedb.org/3";

/// Default timeout for TMDb requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("cinelog/", env!("CARGO_PKG_VERSION"));

/// Requests per second allowed against TMDb
const REQUESTS_PER_SECOND: u32 = 20;

/// Metadata source errors
///
/// The workflow never surfaces these: they are logged and turned into an
/// empty search result or a missing detail record.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One entry of a title search response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Core metadata for one movie
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Minutes
    #[serde(default)]
    pub runtime: Option<u32>,
}

/// Cast list for one movie
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
}

/// Lookups the resolution workflow needs from a metadata provider
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Search by free-text title; results in provider order
    async fn search_movies(&self, title: &str) -> Result<Vec<SearchHit>, MetadataError>;

    /// Core metadata for an id
    async fn movie(&self, id: &MovieId) -> Result<MovieDetails, MetadataError>;

    /// Credits for an id
    async fn credits(&self, id: &MovieId) -> Result<Credits, MetadataError>;
}

/// TMDb client
pub struct TmdbClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl TmdbClient {
    /// Create new TMDb client
    pub fn new(api_key: String) -> Result<Self, MetadataError> {
        Self::with_base_url(api_key, TMDB_API_URL.to_string())
    }

    /// Create a client against a different API root
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, MetadataError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| MetadataError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            api_key,
            base_url,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MetadataError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Querying TMDb");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| MetadataError::Network(format!("TMDb request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetadataError::Api(status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| MetadataError::Parse(format!("Failed to parse TMDb response: {}", e)))
    }
}

#[async_trait]
impl MetadataSource for TmdbClient {
    async fn search_movies(&self, title: &str) -> Result<Vec<SearchHit>, MetadataError> {
        let response: SearchResponse = self
            .get_json("/search/movie", &[("query", title), ("include_adult", "false")])
            .await?;
        Ok(response.results)
    }

    async fn movie(&self, id: &MovieId) -> Result<MovieDetails, MetadataError> {
        self.get_json(&format!("/movie/{}", id), &[]).await
    }

    async fn credits(&self, id: &MovieId) -> Result<Credits, MetadataError> {
        self.get_json(&format!("/movie/{}/credits", id), &[]).await
    }
}
