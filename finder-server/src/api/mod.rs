//! Route tables.
//!
//! - [`sessions`]: session CRUD and the session map queries
//! - [`venues`]: venue CRUD and the venue map layer
//! - [`counties`]: county lookup and province labels
//! - [`map`]: the embedded map page

mod counties;
mod map;
mod sessions;
mod venues;

use axum::Router;

use crate::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .merge(map::router())
        .merge(sessions::router())
        .merge(venues::router())
        .merge(counties::router())
}
