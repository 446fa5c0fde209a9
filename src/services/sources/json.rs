use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{HistoricalMovie, MovieRecord, Screening},
    services::sources::CatalogSource,
};

/// Reads the catalogs and the screening listing from JSON array files
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    historical_path: PathBuf,
    current_path: PathBuf,
    showtimes_path: Option<PathBuf>,
}

impl JsonFileSource {
    pub fn new(historical_path: impl Into<PathBuf>, current_path: impl Into<PathBuf>) -> Self {
        Self {
            historical_path: historical_path.into(),
            current_path: current_path.into(),
            showtimes_path: None,
        }
    }

    /// Adds a screening listing file; a missing file reads as no screenings
    pub fn with_showtimes(mut self, path: impl Into<PathBuf>) -> Self {
        self.showtimes_path = Some(path.into());
        self
    }

    /// Source configured from the environment paths
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.historical_catalog_path, &config.current_catalog_path)
            .with_showtimes(&config.showtimes_path)
    }
}

#[async_trait::async_trait]
impl CatalogSource for JsonFileSource {
    async fn historical(&self) -> AppResult<Vec<HistoricalMovie>> {
        read_json_array(&self.historical_path).await
    }

    async fn current(&self) -> AppResult<Vec<MovieRecord>> {
        read_json_array(&self.current_path).await
    }

    async fn showtimes(&self) -> AppResult<Vec<Screening>> {
        let Some(path) = &self.showtimes_path else {
            return Ok(Vec::new());
        };

        if !tokio::fs::try_exists(path).await? {
            tracing::warn!(path = %path.display(), "Showtimes file missing, no screenings listed");
            return Ok(Vec::new());
        }

        read_json_array(path).await
    }

    fn name(&self) -> &'static str {
        "json-files"
    }
}

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read catalog file");
        AppError::Io(e)
    })?;

    let rows: Vec<T> = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::Serialization(format!("{}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "Loaded JSON rows");

    Ok(rows)
}
