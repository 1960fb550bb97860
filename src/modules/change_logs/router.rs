use axum::{Router, routing::get};

use crate::modules::change_logs::controller::get_change_logs;
use crate::state::AppState;

pub fn init_change_logs_router() -> Router<AppState> {
    Router::new().route("/", get(get_change_logs))
}
