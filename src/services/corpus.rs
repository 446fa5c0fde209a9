use std::cmp::Ordering;
use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::{Catalog, CorpusEntry, HistoricalMovie, MovieRecord},
    services::normalizer::{NormalizedDocument, TextNormalizer},
};

/// Output of one corpus build: the merged catalog, the current-showing
/// catalog, and one normalized document per merged row
#[derive(Debug, Clone)]
pub struct BuiltCorpus {
    pub merged: Catalog,
    pub current: Catalog,
    pub documents: Vec<NormalizedDocument>,
}

/// Merges the historical and current catalogs into one describable corpus
#[derive(Debug, Clone, Default)]
pub struct CorpusBuilder {
    normalizer: TextNormalizer,
}

impl CorpusBuilder {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    /// Builds the merged catalog and its normalized documents
    ///
    /// The showing catalog lists every current title. The merged catalog only
    /// holds rows with an overview: the historical rows deduplicated by
    /// popularity, followed by the current rows. A title present in both is
    /// moved to its current position and takes the current description.
    ///
    /// Fails with `InputEmpty` when no merged row survives.
    pub fn build(
        &self,
        historical: Vec<HistoricalMovie>,
        current: Vec<MovieRecord>,
    ) -> AppResult<BuiltCorpus> {
        let historical_rows = historical.len();
        let current_rows = current.len();

        // 1. Everything in the current catalog is showing, described or not
        let showing: Catalog = current.iter().map(showing_entry).collect();

        // 2. Keep the most popular describable row per historical title
        let historical: Vec<HistoricalMovie> = historical
            .into_iter()
            .filter(|movie| movie.record.has_overview())
            .collect();
        let historical = dedupe_by_popularity(historical);

        // 3. Current rows come last and win on title collisions
        let merged: Catalog = historical
            .iter()
            .filter_map(|movie| describe(&movie.record))
            .chain(current.iter().filter_map(describe))
            .collect();

        if merged.is_empty() {
            tracing::error!(
                historical_rows,
                current_rows,
                "No describable movies left after filtering"
            );
            return Err(AppError::InputEmpty);
        }

        // 4. One token list per merged row, same order
        let documents = self.normalizer.normalize_all(merged.descriptions());

        tracing::info!(
            historical_rows,
            current_rows,
            historical_kept = historical.len(),
            showing = showing.len(),
            merged_rows = merged.len(),
            "Corpus built"
        );

        Ok(BuiltCorpus {
            merged,
            current: showing,
            documents,
        })
    }
}

/// Builds the corpus description for a record, or `None` without an overview
///
/// description = trim(tagline) + " " + trim(overview) + " " + genres joined by spaces
pub fn describe(record: &MovieRecord) -> Option<CorpusEntry> {
    let overview = record.overview.as_deref()?;
    let tagline = record.tagline.as_deref().unwrap_or("");

    let description = format!(
        "{} {} {}",
        tagline.trim(),
        overview.trim(),
        record.genre_list.join(" ")
    );

    Some(CorpusEntry::new(record.title.clone(), description))
}

fn showing_entry(record: &MovieRecord) -> CorpusEntry {
    describe(record).unwrap_or_else(|| CorpusEntry::new(record.title.clone(), String::new()))
}

/// Keeps the most popular row per title, ordered by descending popularity
///
/// Ties keep the row seen first. NaN popularity ranks below every number.
pub fn dedupe_by_popularity(mut movies: Vec<HistoricalMovie>) -> Vec<HistoricalMovie> {
    movies.sort_by(by_descending_popularity);

    let mut seen = HashSet::new();
    let before = movies.len();
    movies.retain(|movie| seen.insert(movie.record.title.clone()));

    if movies.len() < before {
        tracing::debug!(
            duplicates = before - movies.len(),
            "Dropped duplicate historical titles"
        );
    }

    movies
}

fn popularity_key(popularity: f64) -> f64 {
    if popularity.is_nan() {
        f64::NEG_INFINITY
    } else {
        popularity
    }
}

fn by_descending_popularity(a: &HistoricalMovie, b: &HistoricalMovie) -> Ordering {
    popularity_key(b.popularity).total_cmp(&popularity_key(a.popularity))
}
