use ndarray::{Array1, Array2};

use crate::services::{embedding::EmbeddingModel, normalizer::NormalizedDocument};

/// Mean of the in-vocabulary token vectors of one document
///
/// Out-of-vocabulary tokens are skipped. A document with no known token
/// yields the zero vector.
pub fn document_vector(model: &EmbeddingModel, document: &NormalizedDocument) -> Array1<f64> {
    let mut accumulator = Array1::<f64>::zeros(model.dimension());
    let mut known = 0usize;

    for token in document {
        if let Some(vector) = model.word_vector(token) {
            accumulator.zip_mut_with(&vector, |acc, &v| *acc += f64::from(v));
            known += 1;
        }
    }

    if known > 0 {
        accumulator /= known as f64;
    }

    accumulator
}

/// Document vectors for a whole corpus, one row per document in order
pub fn document_vectors(model: &EmbeddingModel, documents: &[NormalizedDocument]) -> Array2<f64> {
    let mut table = Array2::<f64>::zeros((documents.len(), model.dimension()));
    let mut empty_rows = 0usize;

    for (row, document) in documents.iter().enumerate() {
        let vector = document_vector(model, document);
        if vector.iter().all(|&v| v == 0.0) {
            empty_rows += 1;
        }
        table.row_mut(row).assign(&vector);
    }

    if empty_rows > 0 {
        tracing::warn!(
            empty_rows,
            documents = documents.len(),
            "Documents without any in-vocabulary token get a zero vector"
        );
    }

    table
}
