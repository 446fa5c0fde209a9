use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::Screening,
    services::Candidate,
};

use super::AppState;

const DEFAULT_CANDIDATES: usize = 5;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub favorite: String,
    pub recommendation: String,
    pub candidates: Vec<Candidate>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Most similar currently-showing movies for a favorite title
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_CANDIDATES);

    tracing::info!(
        request_id = %request_id,
        favorite = %params.title,
        limit,
        "Processing recommendation request"
    );

    let candidates = state.recommender.recommend_ranked(&params.title, limit)?;
    let recommendation = candidates
        .first()
        .map(|candidate| candidate.title.clone())
        .ok_or_else(|| AppError::Internal("ranking returned no candidate".to_string()))?;

    tracing::info!(
        request_id = %request_id,
        recommendation = %recommendation,
        "Recommendation completed"
    );

    Ok(Json(RecommendationResponse {
        favorite: params.title,
        recommendation,
        candidates,
    }))
}

/// Titles in the merged corpus, in row order
pub async fn list_movies(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(
        state
            .recommender
            .merged()
            .titles()
            .map(str::to_string)
            .collect(),
    )
}

/// Titles currently showing
pub async fn list_showing(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(
        state
            .recommender
            .showing()
            .titles()
            .map(str::to_string)
            .collect(),
    )
}

/// Today's screenings of a currently-showing title
pub async fn showtimes(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> AppResult<Json<Vec<Screening>>> {
    if !state.recommender.showing().contains(&title) {
        return Err(AppError::TitleNotFound(title));
    }

    Ok(Json(state.screenings_for(&title).to_vec()))
}
