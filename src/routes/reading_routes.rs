use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::dto::ApiResponse;
use crate::models::{Reading, ReadingFilters};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_reading_router() -> Router<AppState> {
    Router::new().route("/", get(list_readings))
}

async fn list_readings(
    State(state): State<AppState>,
    Query(filters): Query<ReadingFilters>,
) -> Result<Json<ApiResponse<Vec<Reading>>>, AppError> {
    if let (Some(from), Some(to)) = (filters.from, filters.to) {
        if from > to {
            return Err(bad_request_error("'from' must not be after 'to'"));
        }
    }

    let readings = state.readings.list(&filters).await?;
    Ok(Json(ApiResponse::success(readings)))
}
