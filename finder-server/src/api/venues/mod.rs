//! Venue API.

mod handler;

use axum::{Router, routing::get};

use crate::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/venues/", get(handler::list).post(handler::create))
        .route(
            "/venues/{id}/",
            get(handler::retrieve)
                .put(handler::replace)
                .patch(handler::patch)
                .delete(handler::destroy),
        )
        .route("/venues/geojson/", get(handler::geojson))
}
