use axum::{extract::State, http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::{
        posters::PosterResolver,
        recommender::{DEFAULT_K, DEFAULT_MAX_K},
        Recommender,
    },
};

pub mod recommendations;
pub mod titles;

/// Shared application state: the loaded dataset and the poster collaborator
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub posters: Arc<dyn PosterResolver>,
    pub default_k: usize,
    pub max_k: usize,
}

impl AppState {
    pub fn new(recommender: Arc<Recommender>, posters: Arc<dyn PosterResolver>) -> Self {
        Self {
            recommender,
            posters,
            default_k: DEFAULT_K,
            max_k: DEFAULT_MAX_K,
        }
    }

    pub fn with_limits(mut self, default_k: usize, max_k: usize) -> Self {
        self.max_k = max_k;
        self.default_k = default_k.min(max_k);
        self
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            // Request IDs are assigned before the trace span is created.
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/titles", get(titles::list))
        .route("/recommendations", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "movies": state.recommender.catalog().len(),
            "loaded_at": state.recommender.loaded_at(),
        })),
    )
}
