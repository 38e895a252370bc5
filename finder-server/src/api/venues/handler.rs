//! Venue API handlers.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use finder_core::{FeatureCollection, VenueId, VenueProperties, query};

use crate::{ApiError, AppState, VenueBody, VenueResource, params::path_id};

/// GET /venues/ - all venues ordered by name
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<VenueResource>>, ApiError> {
    let venues = state.with_store(|store| Ok(store.venues()?)).await?;
    Ok(Json(venues.iter().map(VenueResource::from).collect()))
}

/// POST /venues/
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<VenueBody>, JsonRejection>,
) -> Result<(StatusCode, Json<VenueResource>), ApiError> {
    let Json(body) = payload?;
    let draft = body.into_draft(None, false)?;
    let venue = state
        .with_store(move |store| Ok(store.insert_venue(draft)?))
        .await?;
    tracing::debug!(id = venue.id, "venue created");
    Ok((StatusCode::CREATED, Json(VenueResource::from(&venue))))
}

/// GET /venues/{id}/
pub async fn retrieve(
    State(state): State<AppState>,
    id: Result<Path<VenueId>, PathRejection>,
) -> Result<Json<VenueResource>, ApiError> {
    let id = path_id(id)?;
    let venue = state
        .with_store(move |store| store.venue(id)?.ok_or(ApiError::NotFound))
        .await?;
    Ok(Json(VenueResource::from(&venue)))
}

/// PUT /venues/{id}/
pub async fn replace(
    State(state): State<AppState>,
    id: Result<Path<VenueId>, PathRejection>,
    payload: Result<Json<VenueBody>, JsonRejection>,
) -> Result<Json<VenueResource>, ApiError> {
    update(state, path_id(id)?, payload?.0, false).await
}

/// PATCH /venues/{id}/
pub async fn patch(
    State(state): State<AppState>,
    id: Result<Path<VenueId>, PathRejection>,
    payload: Result<Json<VenueBody>, JsonRejection>,
) -> Result<Json<VenueResource>, ApiError> {
    update(state, path_id(id)?, payload?.0, true).await
}

async fn update(
    state: AppState,
    id: VenueId,
    body: VenueBody,
    partial: bool,
) -> Result<Json<VenueResource>, ApiError> {
    let venue = state
        .with_store(move |store| {
            let stored = store.venue(id)?.ok_or(ApiError::NotFound)?;
            let draft = body.into_draft(Some(&stored), partial)?;
            store.update_venue(id, draft)?.ok_or(ApiError::NotFound)
        })
        .await?;
    Ok(Json(VenueResource::from(&venue)))
}

/// DELETE /venues/{id}/ - sessions at the venue keep their location and lose
/// the reference
pub async fn destroy(
    State(state): State<AppState>,
    id: Result<Path<VenueId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    let deleted = state
        .with_store(move |store| Ok(store.delete_venue(id)?))
        .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// GET /venues/geojson/
pub async fn geojson(
    State(state): State<AppState>,
) -> Result<Json<FeatureCollection<VenueProperties>>, ApiError> {
    let collection = state
        .with_store(|store| Ok(query::venues_geojson(store)?))
        .await?;
    Ok(Json(collection))
}
