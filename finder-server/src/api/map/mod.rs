//! Map page.

use axum::{Router, response::Html, routing::get};

use crate::AppState;

const MAP_PAGE: &str = include_str!("../../../assets/map.html");

pub(super) fn router() -> Router<AppState> {
    Router::new().route("/", get(page))
}

/// GET / - the Leaflet map shell
async fn page() -> Html<&'static str> {
    Html(MAP_PAGE)
}
