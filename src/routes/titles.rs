use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId},
    routes::AppState,
};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct TitlesQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
}

/// A catalog entry as exposed over the API
#[derive(Debug, Serialize, PartialEq)]
pub struct TitleResponse {
    pub position: usize,
    pub id: MovieId,
    pub title: String,
}

impl TitleResponse {
    pub fn new(position: usize, movie: &Movie) -> Self {
        Self {
            position,
            id: movie.id.clone(),
            title: movie.title.clone(),
        }
    }
}

/// Handler for catalog listing and title search
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TitlesQuery>,
) -> AppResult<Json<Vec<TitleResponse>>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit must be at most {}",
            MAX_LIMIT
        )));
    }

    let catalog = state.recommender.catalog();
    let titles = catalog
        .search(params.q.as_deref().unwrap_or(""), limit)
        .into_iter()
        .map(|(position, movie)| TitleResponse::new(position, movie))
        .collect();

    Ok(Json(titles))
}
