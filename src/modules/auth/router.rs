use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::auth::controller::{me, register, sync};
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/sync", post(sync))
        .route("/me", get(me))
}
