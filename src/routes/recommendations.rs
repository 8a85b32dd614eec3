use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::MovieId,
    routes::{titles::TitleResponse, AppState},
    services::{
        posters::{resolve_posters, PosterSource},
        Recommendation, TitleMatch,
    },
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    /// Signed so that a negative count yields an empty list rather than a 400
    #[serde(default)]
    pub k: Option<i64>,
    #[serde(default)]
    pub ignore_case: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RecommendedTitle {
    pub rank: usize,
    pub position: usize,
    pub id: MovieId,
    pub title: String,
    pub score: f64,
    pub poster_url: String,
    pub poster_source: PosterSource,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResponse {
    Ranked {
        query: TitleResponse,
        recommendations: Vec<RecommendedTitle>,
    },
    UnknownTitle {
        title: String,
    },
}

/// Requested count after applying the default and the upper bound
fn effective_k(requested: Option<i64>, default_k: usize, max_k: usize) -> usize {
    match requested {
        None => default_k,
        Some(k) if k <= 0 => 0,
        Some(k) => usize::try_from(k).unwrap_or(max_k).min(max_k),
    }
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = effective_k(params.k, state.default_k, state.max_k);
    let matching = if params.ignore_case {
        TitleMatch::IgnoreCase
    } else {
        TitleMatch::Exact
    };

    tracing::info!(
        request_id = %request_id,
        title = %params.title,
        k,
        "Processing recommendation request"
    );

    let outcome = state.recommender.recommend_with(&params.title, k, matching)?;

    let response = match outcome {
        Recommendation::UnknownTitle(title) => RecommendationResponse::UnknownTitle { title },
        Recommendation::Ranked {
            query,
            position,
            items,
        } => {
            let ids = items.iter().map(|item| item.movie.id.clone()).collect();
            let posters = resolve_posters(state.posters.clone(), ids).await;

            let recommendations = items
                .into_iter()
                .zip(posters)
                .enumerate()
                .map(|(rank, (item, poster))| RecommendedTitle {
                    rank: rank + 1,
                    position: item.position,
                    id: item.movie.id,
                    title: item.movie.title,
                    score: item.score,
                    poster_url: poster.url,
                    poster_source: poster.source,
                })
                .collect::<Vec<_>>();

            tracing::info!(
                request_id = %request_id,
                results = recommendations.len(),
                placeholders = recommendations
                    .iter()
                    .filter(|r| r.poster_source != PosterSource::Resolved)
                    .count(),
                "Recommendations ready"
            );

            RecommendationResponse::Ranked {
                query: TitleResponse::new(position, &query),
                recommendations,
            }
        }
    };

    Ok(Json(response))
}
