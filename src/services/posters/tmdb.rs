//! TMDB poster resolver
//!
//! API flow: `GET /3/movie/{id}?api_key=…&language=en-US` returns the movie
//! details, whose `poster_path` is appended to the image CDN base URL.

use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{AppError, AppResult},
    models::MovieId,
    services::posters::PosterResolver,
};

const POSTER_CACHE_TTL: u64 = 604800; // 1 week
const LANGUAGE: &str = "en-US";

/// Subset of TMDB's movie details response
#[derive(Debug, Deserialize)]
struct TmdbMovieDetails {
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Clone)]
pub struct TmdbPosterResolver {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    image_base_url: String,
    cache: Cache,
}

impl TmdbPosterResolver {
    pub fn new(
        cache: Cache,
        api_key: Option<String>,
        api_url: String,
        image_base_url: String,
    ) -> Self {
        if api_key.is_none() {
            tracing::warn!("No TMDB API key configured, posters will use placeholders");
        }

        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            image_base_url,
            cache,
        }
    }

    fn movie_url(&self, id: &MovieId) -> String {
        format!("{}/3/movie/{}", self.api_url.trim_end_matches('/'), id)
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!(
            "{}/{}",
            self.image_base_url.trim_end_matches('/'),
            poster_path.trim_start_matches('/')
        )
    }

    /// Fetches the raw `poster_path` for a movie, bypassing the cache
    async fn fetch_poster_path(&self, id: &MovieId) -> AppResult<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::PosterUnavailable("TMDB API key not configured".to_string()))?;

        let response = self
            .http_client
            .get(self.movie_url(id))
            .query(&[("api_key", api_key), ("language", LANGUAGE)])
            .send()
            .await
            .map_err(|e| AppError::PosterUnavailable(format!("TMDB request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::PosterUnavailable(format!(
                "TMDB API returned status {} for movie {}",
                response.status(),
                id
            )));
        }

        let details: TmdbMovieDetails = response
            .json()
            .await
            .map_err(|e| AppError::PosterUnavailable(format!("Invalid TMDB response: {}", e)))?;

        Ok(details.poster_path.filter(|path| !path.trim().is_empty()))
    }
}

#[async_trait::async_trait]
impl PosterResolver for TmdbPosterResolver {
    #[instrument(skip(self), fields(movie_id = %id))]
    async fn fetch_poster(&self, id: &MovieId) -> AppResult<Option<String>> {
        let poster_path: Option<String> = cached!(
            self.cache,
            CacheKey::Poster(id.to_string()),
            POSTER_CACHE_TTL,
            async move { self.fetch_poster_path(id).await }
        )?;

        tracing::debug!(has_poster = poster_path.is_some(), "Poster resolved");

        Ok(poster_path.map(|path| self.poster_url(&path)))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
