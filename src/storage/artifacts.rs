use std::fmt::Display;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Catalog,
    services::{embedding::EmbeddingModel, similarity::SimilarityMatrix},
    storage::Manifest,
};

/// Files making up one persisted rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Corpus,
    Current,
    Model,
    Similarity,
    Manifest,
}

impl Artifact {
    /// Order in which `ArtifactStore::save` writes the files
    ///
    /// The showing catalog goes after the matrix it is served against, and
    /// the manifest closes the rebuild.
    pub const WRITE_ORDER: [Artifact; 5] = [
        Artifact::Corpus,
        Artifact::Model,
        Artifact::Similarity,
        Artifact::Current,
        Artifact::Manifest,
    ];
}

impl Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Artifact::Corpus => write!(f, "corpus.json"),
            Artifact::Current => write!(f, "current.json"),
            Artifact::Model => write!(f, "model.bin"),
            Artifact::Similarity => write!(f, "similarity.bin"),
            Artifact::Manifest => write!(f, "manifest.json"),
        }
    }
}

/// Everything one rebuild produces, ready to persist
#[derive(Debug)]
pub struct ArtifactSet<'a> {
    pub merged: &'a Catalog,
    pub current: &'a Catalog,
    pub model: &'a EmbeddingModel,
    pub matrix: &'a SimilarityMatrix,
}

/// Catalogs and matrix the recommender serves from
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub merged: Catalog,
    pub current: Catalog,
    pub matrix: SimilarityMatrix,
}

/// Directory-backed store for rebuild artifacts
///
/// Each file is written to a temporary sibling and renamed into place, so a
/// reader sees either the previous or the new version of a file, never a
/// partial one. The manifest is written last.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one artifact file
    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.to_string())
    }

    /// Persists a complete rebuild and returns its manifest
    pub async fn save(&self, artifacts: ArtifactSet<'_>) -> AppResult<Manifest> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let manifest = Manifest::new(
            artifacts.merged.len(),
            artifacts.model.vocabulary_size(),
            artifacts.model.dimension(),
        );

        for artifact in Artifact::WRITE_ORDER {
            match artifact {
                Artifact::Corpus => self.write_json(artifact, artifacts.merged).await?,
                Artifact::Model => self.write_bincode(artifact, artifacts.model).await?,
                Artifact::Similarity => self.write_bincode(artifact, artifacts.matrix).await?,
                Artifact::Current => self.write_json(artifact, artifacts.current).await?,
                Artifact::Manifest => self.write_json(artifact, &manifest).await?,
            }
        }

        tracing::info!(
            dir = %self.dir.display(),
            rows = manifest.rows,
            vocabulary = manifest.vocabulary,
            "Artifacts persisted"
        );

        Ok(manifest)
    }

    /// Loads the merged corpus, current catalog and similarity matrix
    ///
    /// Fails with `ArtifactMismatch` unless the matrix row labels equal the
    /// corpus titles in order.
    pub async fn load_snapshot(&self) -> AppResult<Snapshot> {
        let merged: Catalog = self.read_json(Artifact::Corpus).await?;
        let current: Catalog = self.read_json(Artifact::Current).await?;
        let matrix: SimilarityMatrix = self.read_bincode(Artifact::Similarity).await?;

        if !matrix.is_aligned_with(&merged) {
            tracing::error!(
                corpus_rows = merged.len(),
                matrix_rows = matrix.len(),
                "Persisted corpus and similarity matrix disagree"
            );
            return Err(AppError::ArtifactMismatch(format!(
                "{} has {} rows, {} is labelled for {}",
                Artifact::Corpus,
                merged.len(),
                Artifact::Similarity,
                matrix.len()
            )));
        }

        tracing::info!(
            rows = merged.len(),
            showing = current.len(),
            "Loaded artifact snapshot"
        );

        Ok(Snapshot {
            merged,
            current,
            matrix,
        })
    }

    pub async fn load_model(&self) -> AppResult<EmbeddingModel> {
        self.read_bincode(Artifact::Model).await
    }

    pub async fn load_manifest(&self) -> AppResult<Manifest> {
        self.read_json(Artifact::Manifest).await
    }

    async fn write_json<T: Serialize>(&self, artifact: Artifact, value: &T) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_atomic(artifact, &bytes).await
    }

    async fn write_bincode<T: Serialize>(&self, artifact: Artifact, value: &T) -> AppResult<()> {
        let bytes = bincode::serialize(value)?;
        self.write_atomic(artifact, &bytes).await
    }

    async fn write_atomic(&self, artifact: Artifact, bytes: &[u8]) -> AppResult<()> {
        let target = self.path(artifact);
        let staging = self.dir.join(format!("{}.tmp", artifact));

        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &target).await?;

        tracing::debug!(file = %target.display(), bytes = bytes.len(), "Wrote artifact");
        Ok(())
    }

    async fn read_json<T: DeserializeOwned>(&self, artifact: Artifact) -> AppResult<T> {
        let bytes = self.read(artifact).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Serialization(format!("{}: {}", artifact, e)))
    }

    async fn read_bincode<T: DeserializeOwned>(&self, artifact: Artifact) -> AppResult<T> {
        let bytes = self.read(artifact).await?;
        bincode::deserialize(&bytes)
            .map_err(|e| AppError::Serialization(format!("{}: {}", artifact, e)))
    }

    async fn read(&self, artifact: Artifact) -> AppResult<Vec<u8>> {
        let path = self.path(artifact);
        tokio::fs::read(&path).await.map_err(|e| {
            tracing::error!(file = %path.display(), error = %e, "Failed to read artifact");
            AppError::Io(e)
        })
    }
}
