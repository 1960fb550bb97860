use axum::{
    Json,
    extract::{Query, State},
};
use rollbook_core::{AppError, ErrorResponse};
use rollbook_models::change_logs::{ChangeLogFilterParams, PaginatedChangeLogsResponse};
use tracing::instrument;

use crate::modules::change_logs::service::ChangeLogService;
use crate::state::AppState;

/// List audit trail entries, newest first
#[utoipa::path(
    get,
    path = "/api/change-logs",
    params(ChangeLogFilterParams),
    responses(
        (status = 200, description = "Page of change log entries", body = PaginatedChangeLogsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Change Logs"
)]
#[instrument(skip(state))]
pub async fn get_change_logs(
    State(state): State<AppState>,
    Query(filters): Query<ChangeLogFilterParams>,
) -> Result<Json<PaginatedChangeLogsResponse>, AppError> {
    let page = ChangeLogService::list(&state, filters).await?;
    Ok(Json(page))
}
