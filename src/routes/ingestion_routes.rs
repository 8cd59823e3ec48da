use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info};

use crate::dto::{ApiResponse, RunIngestionRequest, RunsQuery};
use crate::models::IngestionRun;
use crate::services::TickResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_ingestion_router() -> Router<AppState> {
    Router::new()
        .route("/run", post(run_ingestion))
        .route("/runs", get(list_runs))
}

// El body es opcional: sin body equivale a { "force": false }
async fn run_ingestion(
    State(state): State<AppState>,
    request: Option<Json<RunIngestionRequest>>,
) -> (StatusCode, Json<ApiResponse<TickResult>>) {
    let force = request
        .and_then(|Json(request)| request.force)
        .unwrap_or(false);
    info!("📨 Ciclo de ingesta solicitado vía API (force={})", force);

    // El ciclo corre en su propia tarea: un timeout o una desconexión del
    // cliente no lo cortan a medias
    let result = match state.scheduler.spawn_tick(force).await {
        Ok(result) => result,
        Err(e) => {
            error!("❌ La tarea del ciclo de ingesta terminó de forma anómala: {}", e);
            let result = TickResult::Failed {
                message: "Ingestion task aborted".to_string(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::success(result)));
        }
    };
    let status = match &result {
        TickResult::Ran { .. } | TickResult::NotDue { .. } => StatusCode::OK,
        TickResult::Busy => StatusCode::CONFLICT,
        TickResult::Failed { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(ApiResponse::success(result)))
}

async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<RunsQuery>,
) -> Result<Json<ApiResponse<Vec<IngestionRun>>>, AppError> {
    let runs = state.runs.recent(query.effective_limit()).await?;
    Ok(Json(ApiResponse::success(runs)))
}
