use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::Catalog,
};

/// Cosine similarity of two vectors
///
/// Defined as 0.0 when either vector is all zeros.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Square, symmetric, title-labelled cosine similarity matrix
///
/// Row labels are persisted with the values, so a stored matrix can be
/// checked against the catalog it is loaded next to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMatrix", into = "StoredMatrix")]
pub struct SimilarityMatrix {
    titles: Vec<String>,
    positions: HashMap<String, usize>,
    values: Array2<f64>,
}

impl SimilarityMatrix {
    /// Computes the matrix for a catalog and its document vectors (same row order)
    pub fn compute(catalog: &Catalog, vectors: &Array2<f64>) -> AppResult<Self> {
        if catalog.len() != vectors.nrows() {
            return Err(AppError::ArtifactMismatch(format!(
                "catalog has {} rows but {} document vectors were given",
                catalog.len(),
                vectors.nrows()
            )));
        }

        let titles: Vec<String> = catalog.titles().map(str::to_string).collect();
        let values = cosine_matrix(vectors);

        tracing::info!(rows = titles.len(), "Similarity matrix computed");

        Self::from_parts(titles, values)
    }

    fn from_parts(titles: Vec<String>, values: Array2<f64>) -> AppResult<Self> {
        if values.nrows() != titles.len() || values.ncols() != titles.len() {
            return Err(AppError::ArtifactMismatch(format!(
                "{} titles for a {}x{} matrix",
                titles.len(),
                values.nrows(),
                values.ncols()
            )));
        }

        let mut positions = HashMap::with_capacity(titles.len());
        for (row, title) in titles.iter().enumerate() {
            if positions.insert(title.clone(), row).is_some() {
                return Err(AppError::ArtifactMismatch(format!(
                    "duplicate row label: {}",
                    title
                )));
            }
        }

        Ok(Self {
            titles,
            positions,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Row labels in order
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn position(&self, title: &str) -> Option<usize> {
        self.positions.get(title).copied()
    }

    pub fn title(&self, row: usize) -> Option<&str> {
        self.titles.get(row).map(String::as_str)
    }

    /// Similarity between two rows
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get((row, col)).copied()
    }

    /// Similarities of one title against every row
    pub fn row(&self, title: &str) -> Option<ArrayView1<'_, f64>> {
        self.position(title).map(|row| self.values.row(row))
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// True when the row labels equal the catalog titles, in order
    pub fn is_aligned_with(&self, catalog: &Catalog) -> bool {
        self.titles.len() == catalog.len()
            && self.titles.iter().map(String::as_str).eq(catalog.titles())
    }
}

/// Cosine matrix of the rows of `vectors`
///
/// Zero rows produce zero rows and columns (including the diagonal). Nonzero
/// rows get an exact 1.0 diagonal. The result is mirrored from the upper
/// triangle so it is exactly symmetric.
fn cosine_matrix(vectors: &Array2<f64>) -> Array2<f64> {
    // 1. Row norms; zero rows stay zero
    let norms: Array1<f64> = vectors.map_axis(Axis(1), |row| row.dot(&row).sqrt());

    // 2. Scale every non-zero row to unit length
    let mut unit = vectors.to_owned();
    for (mut row, &norm) in unit.axis_iter_mut(Axis(0)).zip(norms.iter()) {
        if norm > 0.0 {
            row /= norm;
        }
    }

    // 3. All pairwise dot products in one product
    let mut values = unit.dot(&unit.t());
    let n = values.nrows();

    // 4. Exact diagonal, clamp rounding noise and mirror the upper triangle
    for i in 0..n {
        values[[i, i]] = if norms[i] > 0.0 { 1.0 } else { 0.0 };
        for j in (i + 1)..n {
            let v = values[[i, j]].clamp(-1.0, 1.0);
            values[[i, j]] = v;
            values[[j, i]] = v;
        }
    }

    values
}

/// Flat, labelled form of `SimilarityMatrix` for persistence
#[derive(Serialize, Deserialize)]
struct StoredMatrix {
    titles: Vec<String>,
    values: Vec<f64>,
}

impl From<SimilarityMatrix> for StoredMatrix {
    fn from(matrix: SimilarityMatrix) -> Self {
        Self {
            values: matrix.values.iter().copied().collect(),
            titles: matrix.titles,
        }
    }
}

impl TryFrom<StoredMatrix> for SimilarityMatrix {
    type Error = String;

    fn try_from(stored: StoredMatrix) -> Result<Self, Self::Error> {
        let n = stored.titles.len();
        let values = Array2::from_shape_vec((n, n), stored.values).map_err(|e| e.to_string())?;
        SimilarityMatrix::from_parts(stored.titles, values).map_err(|e| e.to_string())
    }
}
