//! County API handlers.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use finder_core::{CountyProperties, Feature, query};

use crate::{
    ApiError, AppState,
    params::{Pairs, PointParams},
};

/// GET /counties/for-point/?lat=&lng=
pub async fn for_point(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Json<Feature<CountyProperties>>, ApiError> {
    let Query(pairs) = query?;
    let point = PointParams::from_pairs(&pairs).point()?;
    let county = state
        .with_store(move |store| query::county_for_point(store, &point)?.ok_or(ApiError::NoCounty))
        .await?;
    Ok(Json(county))
}

/// GET /counties/distinct-provinces/
pub async fn distinct_provinces(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let provinces = state
        .with_store(|store| Ok(query::distinct_provinces(store)?))
        .await?;
    Ok(Json(provinces))
}
