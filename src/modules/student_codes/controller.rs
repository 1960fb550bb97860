use axum::{Json, extract::State, http::StatusCode};
use rollbook_core::{AppError, ErrorResponse};
use rollbook_models::{GapReport, ReassignmentReport};
use tracing::instrument;

use crate::middleware::auth::CurrentUser;
use crate::modules::student_codes::model::NextCodeResponse;
use crate::modules::student_codes::service::StudentCodeService;
use crate::state::AppState;

/// Preview the code the next student would receive
#[utoipa::path(
    get,
    path = "/api/student-codes/next",
    responses(
        (status = 200, description = "Next free student code", body = NextCodeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Codes"
)]
#[instrument(skip(state))]
pub async fn get_next_code(
    State(state): State<AppState>,
) -> Result<Json<NextCodeResponse>, AppError> {
    Ok(Json(StudentCodeService::next_code(&state).await?))
}

/// Report unused codes below the highest allocated one
#[utoipa::path(
    get,
    path = "/api/student-codes/gaps",
    responses(
        (status = 200, description = "Gap report", body = GapReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Codes"
)]
#[instrument(skip(state))]
pub async fn get_gaps(State(state): State<AppState>) -> Result<Json<GapReport>, AppError> {
    Ok(Json(StudentCodeService::gaps(&state).await?))
}

/// Renumber all students gaplessly in registration order
///
/// Writes are not transactional. When one fails the run stops and the same
/// report body comes back with status 500, listing what was written, the
/// failed entry and what is still pending.
#[utoipa::path(
    post,
    path = "/api/student-codes/reassign",
    responses(
        (status = 200, description = "All codes written", body = ReassignmentReport),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "A write failed part-way", body = ReassignmentReport)
    ),
    security(("bearer_auth" = [])),
    tag = "Student Codes"
)]
#[instrument(skip(state, current), fields(actor = %current.id()))]
pub async fn reassign_codes(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<(StatusCode, Json<ReassignmentReport>), AppError> {
    let report = StudentCodeService::reassign(&state, Some(current.id())).await?;

    let status = if report.complete {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(report)))
}
