use std::time::{Duration, Instant};

use ndarray::{Array2, Axis};

use crate::{
    error::{AppError, AppResult},
    models::{HistoricalMovie, MovieRecord},
    services::{
        corpus::{BuiltCorpus, CorpusBuilder},
        embedding::{EmbeddingModel, EmbeddingTrainer, TrainingConfig},
        similarity::SimilarityMatrix,
        sources::CatalogSource,
        vectorizer,
    },
    storage::{ArtifactSet, ArtifactStore, Manifest},
};

/// In-memory result of one rebuild, not yet persisted
#[derive(Debug)]
pub struct RebuildOutput {
    pub corpus: BuiltCorpus,
    pub model: EmbeddingModel,
    pub matrix: SimilarityMatrix,
    /// Documents whose vector is all zeros (no in-vocabulary token)
    pub zero_vector_documents: usize,
}

/// Outcome of a persisted rebuild
#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub rows: usize,
    pub showing: usize,
    pub vocabulary: usize,
    pub zero_vector_documents: usize,
    pub duration: Duration,
    pub manifest: Manifest,
}

/// Runs the computation steps of a rebuild without touching storage
///
/// corpus build → normalize → train → vectorize → similarity
pub fn compute(
    historical: Vec<HistoricalMovie>,
    current: Vec<MovieRecord>,
    training: &TrainingConfig,
) -> AppResult<RebuildOutput> {
    let corpus = CorpusBuilder::default().build(historical, current)?;

    let model = EmbeddingTrainer::new(training.clone()).train(&corpus.documents)?;

    let vectors = vectorizer::document_vectors(&model, &corpus.documents);
    let zero_vector_documents = count_zero_rows(&vectors);

    let matrix = SimilarityMatrix::compute(&corpus.merged, &vectors)?;

    Ok(RebuildOutput {
        corpus,
        model,
        matrix,
        zero_vector_documents,
    })
}

/// Loads the catalogs from `source`, recomputes everything and persists it
///
/// Nothing is written until every computation step has succeeded, so a failed
/// rebuild leaves the previous artifacts in place.
pub async fn rebuild(
    source: &dyn CatalogSource,
    store: &ArtifactStore,
    training: &TrainingConfig,
) -> AppResult<RebuildReport> {
    let started = Instant::now();

    tracing::info!(source = source.name(), "Starting rebuild");

    let historical = source.historical().await?;
    let current = source.current().await?;

    tracing::info!(
        historical = historical.len(),
        current = current.len(),
        "Catalogs loaded"
    );

    let training = training.clone();
    let output = tokio::task::spawn_blocking(move || compute(historical, current, &training))
        .await
        .map_err(|e| AppError::Internal(format!("rebuild task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!(error = %e, "Rebuild aborted, previous artifacts kept");
            e
        })?;

    let manifest = store
        .save(ArtifactSet {
            merged: &output.corpus.merged,
            current: &output.corpus.current,
            model: &output.model,
            matrix: &output.matrix,
        })
        .await?;

    let report = RebuildReport {
        rows: output.corpus.merged.len(),
        showing: output.corpus.current.len(),
        vocabulary: output.model.vocabulary_size(),
        zero_vector_documents: output.zero_vector_documents,
        duration: started.elapsed(),
        manifest,
    };

    tracing::info!(
        rows = report.rows,
        showing = report.showing,
        vocabulary = report.vocabulary,
        zero_vector_documents = report.zero_vector_documents,
        duration_ms = report.duration.as_millis() as u64,
        "Rebuild complete"
    );

    Ok(report)
}

fn count_zero_rows(vectors: &Array2<f64>) -> usize {
    vectors
        .axis_iter(Axis(0))
        .filter(|row| row.iter().all(|&v| v == 0.0))
        .count()
}
