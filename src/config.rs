use serde::Deserialize;
use std::path::PathBuf;

use crate::services::embedding::TrainingConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the persisted corpus, model and similarity matrix
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// Historical movie catalog (JSON array)
    #[serde(default = "default_historical_catalog_path")]
    pub historical_catalog_path: PathBuf,

    /// Today's currently-showing catalog (JSON array)
    #[serde(default = "default_current_catalog_path")]
    pub current_catalog_path: PathBuf,

    /// Today's screening listing (JSON array, optional file)
    #[serde(default = "default_showtimes_path")]
    pub showtimes_path: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Seed for the embedding trainer; unseeded when absent
    #[serde(default)]
    pub embedding_seed: Option<u64>,

    /// Number of hashed character n-gram buckets
    #[serde(default = "default_embedding_buckets")]
    pub embedding_buckets: usize,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_historical_catalog_path() -> PathBuf {
    PathBuf::from("data/historical_movies.json")
}

fn default_current_catalog_path() -> PathBuf {
    PathBuf::from("data/current_movies.json")
}

fn default_showtimes_path() -> PathBuf {
    PathBuf::from("data/showtimes.json")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_embedding_buckets() -> usize {
    100_000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address string for the HTTP server
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Trainer hyperparameters with the configured overrides applied
    pub fn training(&self) -> TrainingConfig {
        TrainingConfig {
            seed: self.embedding_seed,
            buckets: self.embedding_buckets,
            ..TrainingConfig::default()
        }
    }
}
