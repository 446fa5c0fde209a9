use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::Catalog,
    services::similarity::SimilarityMatrix,
};

/// One currently-showing title ranked against a favorite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub title: String,
    pub score: f64,
}

/// Read-only lookup over the last persisted matrix and catalogs
#[derive(Debug, Clone)]
pub struct Recommender {
    merged: Catalog,
    showing: Catalog,
    matrix: SimilarityMatrix,
}

impl Recommender {
    /// Fails with `ArtifactMismatch` unless the matrix rows are labelled with
    /// the merged catalog titles, in order.
    pub fn new(merged: Catalog, showing: Catalog, matrix: SimilarityMatrix) -> AppResult<Self> {
        if !matrix.is_aligned_with(&merged) {
            return Err(AppError::ArtifactMismatch(format!(
                "similarity matrix has {} rows, merged catalog has {} (or titles differ)",
                matrix.len(),
                merged.len()
            )));
        }

        Ok(Self {
            merged,
            showing,
            matrix,
        })
    }

    pub fn merged(&self) -> &Catalog {
        &self.merged
    }

    pub fn showing(&self) -> &Catalog {
        &self.showing
    }

    /// The currently-showing title most similar to `favorite`, never `favorite` itself
    pub fn recommend(&self, favorite: &str) -> AppResult<String> {
        self.recommend_ranked(favorite, 1)?
            .into_iter()
            .next()
            .map(|candidate| candidate.title)
            .ok_or_else(|| no_candidate(favorite))
    }

    /// Up to `limit` currently-showing titles by descending similarity
    ///
    /// Equal scores keep merged-catalog row order. The favorite is excluded.
    pub fn recommend_ranked(&self, favorite: &str, limit: usize) -> AppResult<Vec<Candidate>> {
        if limit == 0 {
            return Err(AppError::InvalidInput(
                "limit must be at least 1".to_string(),
            ));
        }

        let row = self
            .merged
            .position(favorite)
            .ok_or_else(|| AppError::TitleNotFound(favorite.to_string()))?;
        let scores = self.matrix.values().row(row);

        let mut ranked: Vec<usize> = (0..scores.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let candidates: Vec<Candidate> = ranked
            .into_iter()
            .filter_map(|index| {
                let title = self.matrix.title(index)?;
                (self.showing.contains(title) && title != favorite).then(|| Candidate {
                    title: title.to_string(),
                    score: scores[index],
                })
            })
            .take(limit)
            .collect();

        if candidates.is_empty() {
            tracing::info!(favorite, showing = self.showing.len(), "No eligible candidate");
            return Err(no_candidate(favorite));
        }

        tracing::debug!(
            favorite,
            top = %candidates[0].title,
            score = candidates[0].score,
            returned = candidates.len(),
            "Ranked candidates"
        );

        Ok(candidates)
    }
}

fn no_candidate(favorite: &str) -> AppError {
    AppError::TitleNotFound(format!("no currently showing movie to recommend for {}", favorite))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CorpusEntry;
    use ndarray::{array, Array2};

    fn catalog(titles: &[&str]) -> Catalog {
        titles.iter().map(|t| CorpusEntry::new(*t, "")).collect()
    }

    fn recommender(titles: &[&str], vectors: Array2<f64>, showing: &[&str]) -> Recommender {
        let merged = catalog(titles);
        let matrix = SimilarityMatrix::compute(&merged, &vectors).unwrap();
        Recommender::new(merged, catalog(showing), matrix).unwrap()
    }

    fn sample() -> Recommender {
        // A is close to B, further from C, opposite to D
        recommender(
            &["A", "B", "C", "D"],
            array![[1.0, 0.0], [0.9, 0.1], [0.5, 0.5], [-1.0, 0.0]],
            &["A", "B", "C", "D"],
        )
    }

    #[test]
    fn test_recommend_picks_most_similar_showing_title() {
        let recommender = sample();
        assert_eq!(recommender.recommend("A").unwrap(), "B");
        assert_eq!(recommender.recommend("D").unwrap(), "C");
    }

    #[test]
    fn test_recommend_skips_favorite_itself() {
        let recommender = sample();
        for title in ["A", "B", "C", "D"] {
            assert_ne!(recommender.recommend(title).unwrap(), title);
        }
    }

    #[test]
    fn test_recommend_only_returns_showing_titles() {
        let recommender = recommender(
            &["A", "B", "C"],
            array![[1.0, 0.0], [0.9, 0.1], [0.0, 1.0]],
            &["C"],
        );
        assert_eq!(recommender.recommend("A").unwrap(), "C");
    }

    #[test]
    fn test_unknown_favorite_is_title_not_found() {
        let recommender = sample();
        let result = recommender.recommend("Zeta");
        assert!(matches!(result, Err(AppError::TitleNotFound(t)) if t == "Zeta"));
    }

    #[test]
    fn test_only_showing_title_is_the_favorite() {
        let recommender = recommender(&["Gamma"], array![[1.0, 2.0]], &["Gamma"]);
        assert!(matches!(
            recommender.recommend("Gamma"),
            Err(AppError::TitleNotFound(_))
        ));
    }

    #[test]
    fn test_nothing_showing_is_title_not_found() {
        let recommender = recommender(&["A", "B"], array![[1.0, 0.0], [0.0, 1.0]], &[]);
        assert!(matches!(
            recommender.recommend("A"),
            Err(AppError::TitleNotFound(_))
        ));
    }

    #[test]
    fn test_ties_keep_row_order() {
        let recommender = recommender(
            &["Fav", "First", "Second"],
            array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]],
            &["Second", "First"],
        );
        let ranked = recommender.recommend_ranked("Fav", 5).unwrap();
        let titles: Vec<&str> = ranked.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[test]
    fn test_zero_vector_favorite_still_recommends() {
        let recommender = recommender(
            &["Blank", "A", "B"],
            array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            &["Blank", "B", "A"],
        );
        assert_eq!(recommender.recommend("Blank").unwrap(), "A");
    }

    #[test]
    fn test_recommend_ranked_limits_and_scores() {
        let recommender = sample();
        let ranked = recommender.recommend_ranked("A", 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].title, "B");
        assert_eq!(ranked[1].title, "C");
        assert!(ranked[0].score >= ranked[1].score);

        let all = recommender.recommend_ranked("A", 10).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].title, "D");
        assert!((all[2].score + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommend_ranked_zero_limit() {
        let recommender = sample();
        assert!(matches!(
            recommender.recommend_ranked("A", 0),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_misaligned_matrix_is_rejected() {
        let merged = catalog(&["A", "B"]);
        let matrix = SimilarityMatrix::compute(&merged, &array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
        let result = Recommender::new(catalog(&["B", "A"]), catalog(&["A"]), matrix);
        assert!(matches!(result, Err(AppError::ArtifactMismatch(_))));
    }
}
