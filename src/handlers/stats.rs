//! # Processing Stats Handler

use axum::{extract::State, response::Json};

use crate::error::{ApiError, ErrorType};
use crate::models::ProcessingStats;
use crate::repositories::StatsRepository;
use crate::server::AppState;

/// Get the processing statistics row
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Current statistics", body = ProcessingStats),
        (status = 404, description = "Statistics not initialized", body = ApiError)
    ),
    tag = "stats"
)]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<ProcessingStats>, ApiError> {
    StatsRepository::new(&state.store)
        .get_stats()
        .await
        .map(Json)
        .ok_or_else(|| ErrorType::NotFound.with_message("Stats not found"))
}
