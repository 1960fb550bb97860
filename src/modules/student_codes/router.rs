use axum::{
    Router,
    routing::{get, post},
};

use crate::modules::student_codes::controller::{get_gaps, get_next_code, reassign_codes};
use crate::state::AppState;

pub fn init_student_codes_router() -> Router<AppState> {
    Router::new()
        .route("/next", get(get_next_code))
        .route("/gaps", get(get_gaps))
        .route("/reassign", post(reassign_codes))
}
