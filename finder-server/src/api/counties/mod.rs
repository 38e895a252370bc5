//! County API.

mod handler;

use axum::{Router, routing::get};

use crate::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/counties/for-point/", get(handler::for_point))
        .route("/counties/distinct-provinces/", get(handler::distinct_provinces))
}
