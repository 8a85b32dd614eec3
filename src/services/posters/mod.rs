//! Poster lookup for recommended movies
//!
//! Resolvers report failures as errors; this module turns every failure into
//! a placeholder image so a poster problem never removes a movie from the
//! recommendation list.

use serde::Serialize;
use std::sync::Arc;

use crate::{error::AppResult, models::MovieId};

pub mod tmdb;

pub use tmdb::TmdbPosterResolver;

/// Shown when the movie exists upstream but has no poster
pub const NO_POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/500x750.png?text=No+Poster";

/// Shown when the poster lookup itself failed
pub const API_ERROR_PLACEHOLDER: &str = "https://via.placeholder.com/500x750.png?text=API+Error";

/// Trait for poster sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterResolver: Send + Sync {
    /// Poster image URL for a movie, `Ok(None)` when it has none
    async fn fetch_poster(&self, id: &MovieId) -> AppResult<Option<String>>;

    /// Resolver name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Where a poster URL came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PosterSource {
    Resolved,
    NoPoster,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Poster {
    pub url: String,
    pub source: PosterSource,
}

impl Poster {
    pub fn no_poster() -> Self {
        Self {
            url: NO_POSTER_PLACEHOLDER.to_string(),
            source: PosterSource::NoPoster,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            url: API_ERROR_PLACEHOLDER.to_string(),
            source: PosterSource::Unavailable,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source != PosterSource::Resolved
    }
}

/// Fetches one poster, degrading any failure to a placeholder
pub async fn resolve_poster(resolver: &dyn PosterResolver, id: &MovieId) -> Poster {
    match resolver.fetch_poster(id).await {
        Ok(Some(url)) => Poster {
            url,
            source: PosterSource::Resolved,
        },
        Ok(None) => Poster::no_poster(),
        Err(e) => {
            tracing::warn!(
                movie_id = %id,
                resolver = resolver.name(),
                error = %e,
                "Poster lookup failed, using placeholder"
            );
            Poster::unavailable()
        }
    }
}

/// Fetches posters for `ids` concurrently
///
/// The result is index-aligned with `ids` regardless of which fetch finishes first.
pub async fn resolve_posters(resolver: Arc<dyn PosterResolver>, ids: Vec<MovieId>) -> Vec<Poster> {
    let tasks: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolve_poster(resolver.as_ref(), &id).await })
        })
        .collect();

    let mut posters = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(poster) => posters.push(poster),
            Err(e) => {
                tracing::error!(error = %e, "Poster task join error");
                posters.push(Poster::unavailable());
            }
        }
    }

    posters
}
