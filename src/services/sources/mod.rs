use crate::{
    error::AppResult,
    models::{HistoricalMovie, MovieRecord, Screening},
};

pub mod json;

pub use json::JsonFileSource;

/// Provider of the two movie catalogs and the daily screening listing
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Historical catalog; may contain duplicate titles
    async fn historical(&self) -> AppResult<Vec<HistoricalMovie>>;

    /// Movies currently showing
    async fn current(&self) -> AppResult<Vec<MovieRecord>>;

    /// Today's screenings of currently-showing movies
    ///
    /// Sources without a listing return an empty list.
    async fn showtimes(&self) -> AppResult<Vec<Screening>> {
        Ok(Vec::new())
    }

    /// Source name for logging
    fn name(&self) -> &'static str;
}
