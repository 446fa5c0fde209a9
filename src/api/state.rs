use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::Screening,
    services::Recommender,
    storage::Snapshot,
};

/// Shared, read-only application state
///
/// Loaded once at start-up from the artifact store; request handlers never
/// rebuild or mutate it.
pub struct AppState {
    pub recommender: Recommender,
    screenings: HashMap<String, Vec<Screening>>,
}

impl AppState {
    /// Creates the state, grouping screenings by title in start-time order
    pub fn new(recommender: Recommender, screenings: Vec<Screening>) -> Self {
        let mut by_title: HashMap<String, Vec<Screening>> = HashMap::new();
        for screening in screenings {
            by_title
                .entry(screening.title.clone())
                .or_default()
                .push(screening);
        }
        for listing in by_title.values_mut() {
            listing.sort_by_key(|s| s.showtime);
        }

        Self {
            recommender,
            screenings: by_title,
        }
    }

    /// Builds the state from persisted artifacts plus today's listing
    pub fn from_snapshot(snapshot: Snapshot, screenings: Vec<Screening>) -> AppResult<Self> {
        let recommender = Recommender::new(snapshot.merged, snapshot.current, snapshot.matrix)?;
        Ok(Self::new(recommender, screenings))
    }

    /// Screenings of one title, earliest first
    pub fn screenings_for(&self, title: &str) -> &[Screening] {
        self.screenings
            .get(title)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
