//! Poster lookup against The Movie Database (TMDB) search API.
//!
//! ```text
//! GET https://api.themoviedb.org/3/search/movie?api_key=<key>&query=<title>
//!   → { "results": [ { "poster_path": "/abc.jpg", ... }, ... ] }
//!   → https://image.tmdb.org/t/p/w500/abc.jpg
//! ```
//!
//! Only the first result is used.  Any failure (network, HTTP status, JSON,
//! no results, no poster) yields `None`; the title keeps an empty poster and
//! is looked up again on the next start.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::PosterLookup;

/// Production TMDB API root.
pub const TMDB_API_BASE: &str = "https://api.themoviedb.org/3";

/// Prefix turning a `poster_path` into a 500px-wide image URL.
pub const POSTER_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single poster search.
#[derive(Debug, Error)]
pub enum PosterError {
    #[error("TMDB request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TMDB has no poster for {0:?}")]
    NotFound(String),
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Returns the full image URL of the first result's poster, if any.
pub fn poster_url_from(response: SearchResponse) -> Option<String> {
    let path = response.results.into_iter().next()?.poster_path?;
    if path.is_empty() {
        return None;
    }
    Some(format!("{POSTER_IMAGE_BASE}{path}"))
}

/// [`PosterLookup`] using the TMDB search endpoint.
pub struct TmdbPosterLookup {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbPosterLookup {
    /// Creates a lookup against the public TMDB API.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PosterError> {
        Self::with_base_url(api_key, TMDB_API_BASE)
    }

    /// Creates a lookup against another API root (a local stand-in in tests).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, PosterError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Searches for `title` and returns its poster URL.
    pub async fn search(&self, title: &str) -> Result<String, PosterError> {
        let response: SearchResponse = self
            .client
            .get(format!("{}/search/movie", self.base_url))
            .query(&[("api_key", self.api_key.as_str()), ("query", title)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        poster_url_from(response).ok_or_else(|| PosterError::NotFound(title.to_string()))
    }
}

#[async_trait]
impl PosterLookup for TmdbPosterLookup {
    async fn find_poster(&self, title: &str) -> Option<String> {
        match self.search(title).await {
            Ok(url) => {
                debug!("poster for {title:?}: {url}");
                Some(url)
            }
            Err(PosterError::NotFound(_)) => {
                debug!("no poster found for {title:?}");
                None
            }
            Err(e) => {
                warn!("error fetching poster for {title:?}: {e}");
                None
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
