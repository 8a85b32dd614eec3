use std::sync::Arc;

use cinematch::{
    cache::{create_redis_client, Cache},
    config::Config,
    routes::{create_router, AppState},
    services::{
        artifacts::{load_recommender, ArtifactStore, LocalArtifactStore, RemoteArtifactStore},
        posters::TmdbPosterResolver,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cinematch=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Box<dyn ArtifactStore> = match &config.artifact_base_url {
        Some(base_url) => Box::new(RemoteArtifactStore::new(
            base_url.clone(),
            &config.artifact_cache_dir,
        )),
        None => Box::new(LocalArtifactStore::new(&config.data_dir)),
    };

    // Bad or missing data is fatal: nothing is served without a dataset.
    let recommender = load_recommender(
        store.as_ref(),
        &config.catalog_file,
        &config.similarity_file,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to load recommendation data: {}", e))?;

    let (cache, cache_handle) = match &config.redis_url {
        Some(url) => Cache::new(create_redis_client(url)?),
        None => {
            tracing::info!("REDIS_URL not set, poster cache disabled");
            Cache::disabled()
        }
    };
    tracing::info!(poster_cache = cache.is_enabled(), "Poster cache configured");

    let posters = TmdbPosterResolver::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_image_base_url.clone(),
    );

    let state = AppState::new(Arc::new(recommender), Arc::new(posters))
        .with_limits(config.default_k, config.max_k);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    cache_handle.shutdown().await;

    Ok(())
}
