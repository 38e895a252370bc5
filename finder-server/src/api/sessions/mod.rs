//! Session API.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions/", get(handler::list).post(handler::create))
        .route(
            "/sessions/{id}/",
            get(handler::retrieve)
                .put(handler::replace)
                .patch(handler::patch)
                .delete(handler::destroy),
        )
        .route("/sessions/geojson/", get(handler::geojson))
        .route("/sessions/in-bbox/", get(handler::in_bbox))
        .route("/sessions/nearest/", post(handler::nearest))
        .route("/sessions/distinct-systems/", get(handler::distinct_systems))
}
