use axum::{Json, extract::State, http::StatusCode};
use rollbook_core::{AppError, ErrorResponse};
use rollbook_models::User;
use rollbook_models::users::RegisterUserDto;
use tracing::instrument;

use crate::middleware::auth::{CurrentUser, IdentityUser};
use crate::modules::auth::model::SyncResponse;
use crate::modules::auth::service::AuthService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Register the signed-in identity as a student or teacher
///
/// Students receive the lowest free student code, returned as `studentCode`.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterUserDto,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 401, description = "Missing or invalid identity token", body = ErrorResponse),
        (status = 403, description = "Admin self-registration is not allowed", body = ErrorResponse),
        (status = 409, description = "Identity or email already registered", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, identity, dto))]
pub async fn register(
    State(state): State<AppState>,
    identity: IdentityUser,
    ValidatedJson(dto): ValidatedJson<RegisterUserDto>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = AuthService::register(&state, &identity.0, dto).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Match the signed-in identity to its user record
///
/// Records created before identity linking are matched once by email and
/// then keep the identity's UID.
#[utoipa::path(
    post,
    path = "/api/auth/sync",
    responses(
        (status = 200, description = "Matched user record", body = SyncResponse),
        (status = 401, description = "Missing or invalid identity token", body = ErrorResponse),
        (status = 404, description = "No record for this identity; register first", body = ErrorResponse),
        (status = 409, description = "Email linked to a different identity", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(state, identity))]
pub async fn sync(
    State(state): State<AppState>,
    identity: IdentityUser,
) -> Result<Json<SyncResponse>, AppError> {
    Ok(Json(AuthService::sync(&state, &identity.0).await?))
}

/// Current user's record
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Missing or invalid identity token", body = ErrorResponse),
        (status = 403, description = "Identity not linked to a user", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Authentication"
)]
#[instrument(skip(current))]
pub async fn me(current: CurrentUser) -> Json<User> {
    Json(current.0)
}
