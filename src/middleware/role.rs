//! Role guards applied as route layers.

use anyhow::anyhow;
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use rollbook_core::AppError;

use crate::middleware::auth::CurrentUser;
use crate::state::AppState;

/// Lets the request through only when the caller is a linked admin.
///
/// ```rust,ignore
/// let admin_routes = Router::new()
///     .route("/", get(get_users))
///     .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));
/// ```
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let current = CurrentUser::from_request_parts(&mut parts, &state).await?;
    if !current.is_admin() {
        return Err(AppError::forbidden(anyhow!(
            "Access denied. Admin role required"
        )));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}
