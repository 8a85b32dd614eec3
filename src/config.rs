use serde::Deserialize;

use crate::services::recommender::{DEFAULT_K, DEFAULT_MAX_K};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the catalog and similarity artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Catalog artifact file name
    #[serde(default = "default_catalog_file")]
    pub catalog_file: String,

    /// Similarity matrix artifact file name
    #[serde(default = "default_similarity_file")]
    pub similarity_file: String,

    /// Base URL to download artifacts from when they are not cached locally
    #[serde(default)]
    pub artifact_base_url: Option<String>,

    /// Where downloaded artifacts are kept
    #[serde(default = "default_artifact_cache_dir")]
    pub artifact_cache_dir: String,

    /// TMDB API key; posters degrade to placeholders without it
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix prepended to TMDB poster paths
    #[serde(default = "default_tmdb_image_base_url")]
    pub tmdb_image_base_url: String,

    /// Redis connection URL for the poster cache
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the request does not ask for a count
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Upper bound on recommendations per request
    #[serde(default = "default_max_k")]
    pub max_k: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_catalog_file() -> String {
    "movie_list.json".to_string()
}

fn default_similarity_file() -> String {
    "similarity.json".to_string()
}

fn default_artifact_cache_dir() -> String {
    ".cache/artifacts".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_max_k() -> usize {
    DEFAULT_MAX_K
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
