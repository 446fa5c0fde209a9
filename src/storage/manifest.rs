use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary of the last successful rebuild, written after every other artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub built_at: DateTime<Utc>,
    /// Rows in the merged corpus (and the similarity matrix)
    pub rows: usize,
    pub vocabulary: usize,
    pub dimension: usize,
}

impl Manifest {
    pub fn new(rows: usize, vocabulary: usize, dimension: usize) -> Self {
        Self {
            built_at: Utc::now(),
            rows,
            vocabulary,
            dimension,
        }
    }
}
