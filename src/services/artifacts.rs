use std::path::{Path, PathBuf};

use reqwest::Client as HttpClient;
use serde::de::IgnoredAny;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    services::recommender::Recommender,
};

/// Source of the serialized catalog and similarity matrix
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Raw bytes of the named artifact
    async fn fetch(&self, name: &str) -> AppResult<Vec<u8>>;

    /// Drops any locally kept copy so the next fetch starts fresh
    async fn invalidate(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Reads artifacts from a local directory
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn fetch(&self, name: &str) -> AppResult<Vec<u8>> {
        read_artifact(&self.dir.join(name)).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Downloads artifacts once and serves later loads from a local cache directory
pub struct RemoteArtifactStore {
    http_client: HttpClient,
    base_url: String,
    cache_dir: PathBuf,
}

impl RemoteArtifactStore {
    pub fn new(base_url: String, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url,
            cache_dir: cache_dir.into(),
        }
    }

    fn artifact_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), name)
    }

    async fn download(&self, name: &str) -> AppResult<Vec<u8>> {
        let url = self.artifact_url(name);
        tracing::info!(url = %url, "Downloading artifact");

        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AppError::ArtifactMissing(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl ArtifactStore for RemoteArtifactStore {
    async fn fetch(&self, name: &str) -> AppResult<Vec<u8>> {
        let cached_path = self.cache_dir.join(name);
        if tokio::fs::try_exists(&cached_path).await? {
            tracing::debug!(path = %cached_path.display(), "Artifact cache hit");
            return read_artifact(&cached_path).await;
        }

        let bytes = self.download(name).await?;
        serde_json::from_slice::<IgnoredAny>(&bytes).map_err(|e| {
            AppError::DataCorrupt(format!("downloaded {} is not JSON: {}", name, e))
        })?;

        // Readers only ever see a complete file.
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let partial_path = self
            .cache_dir
            .join(format!("{}.{}.tmp", name, Uuid::new_v4()));
        tokio::fs::write(&partial_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&partial_path, &cached_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e.into());
        }
        tracing::info!(
            path = %cached_path.display(),
            size = bytes.len(),
            "Artifact cached"
        );

        Ok(bytes)
    }

    async fn invalidate(&self, name: &str) -> AppResult<()> {
        let cached_path = self.cache_dir.join(name);
        match tokio::fs::remove_file(&cached_path).await {
            Ok(()) => {
                tracing::warn!(path = %cached_path.display(), "Evicted cached artifact");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

async fn read_artifact(path: &Path) -> AppResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::ArtifactMissing(path.display().to_string()),
        _ => AppError::Io(e),
    })
}

/// Fetches both artifacts and builds the recommender
#[instrument(skip(store), fields(store = store.name()))]
pub async fn load_recommender(
    store: &dyn ArtifactStore,
    catalog_name: &str,
    similarity_name: &str,
) -> AppResult<Recommender> {
    let catalog_bytes = store.fetch(catalog_name).await?;
    let similarity_bytes = store.fetch(similarity_name).await?;

    let recommender = match Recommender::from_bytes(&catalog_bytes, &similarity_bytes) {
        Ok(recommender) => recommender,
        Err(e @ AppError::DataCorrupt(_)) => {
            // A bad pair must not be served again from a local copy.
            for name in [catalog_name, similarity_name] {
                if let Err(evict_err) = store.invalidate(name).await {
                    tracing::error!(artifact = name, error = %evict_err, "Failed to evict artifact");
                }
            }
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        movies = recommender.catalog().len(),
        "Loaded catalog and similarity matrix"
    );

    Ok(recommender)
}
