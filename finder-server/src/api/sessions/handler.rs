//! Session API handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use finder_core::{FeatureCollection, SessionId, SessionProperties, query};

use crate::{
    ApiError, AppState, SessionBody, SessionResource,
    params::{BboxParams, FilterParams, NearestBody, Pairs, path_id},
};

type Collection = Json<FeatureCollection<SessionProperties>>;

/// GET /sessions/ - all sessions ordered by start time
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SessionResource>>, ApiError> {
    let records = state.with_store(|store| Ok(store.sessions()?)).await?;
    Ok(Json(records.iter().map(SessionResource::from).collect()))
}

/// POST /sessions/
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<SessionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResource>), ApiError> {
    let Json(body) = payload?;
    let draft = body.into_draft(None, false)?;
    let record = state
        .with_store(move |store| Ok(store.insert_session(draft)?))
        .await?;
    tracing::debug!(id = record.session.id, "session created");
    Ok((StatusCode::CREATED, Json(SessionResource::from(&record))))
}

/// GET /sessions/{id}/
pub async fn retrieve(
    State(state): State<AppState>,
    id: Result<Path<SessionId>, PathRejection>,
) -> Result<Json<SessionResource>, ApiError> {
    let id = path_id(id)?;
    let record = state
        .with_store(move |store| store.session(id)?.ok_or(ApiError::NotFound))
        .await?;
    Ok(Json(SessionResource::from(&record)))
}

/// PUT /sessions/{id}/
pub async fn replace(
    State(state): State<AppState>,
    id: Result<Path<SessionId>, PathRejection>,
    payload: Result<Json<SessionBody>, JsonRejection>,
) -> Result<Json<SessionResource>, ApiError> {
    update(state, path_id(id)?, payload?.0, false).await
}

/// PATCH /sessions/{id}/
pub async fn patch(
    State(state): State<AppState>,
    id: Result<Path<SessionId>, PathRejection>,
    payload: Result<Json<SessionBody>, JsonRejection>,
) -> Result<Json<SessionResource>, ApiError> {
    update(state, path_id(id)?, payload?.0, true).await
}

async fn update(
    state: AppState,
    id: SessionId,
    body: SessionBody,
    partial: bool,
) -> Result<Json<SessionResource>, ApiError> {
    let record = state
        .with_store(move |store| {
            let stored = store.session(id)?.ok_or(ApiError::NotFound)?;
            let draft = body.into_draft(Some(&stored.session), partial)?;
            store.update_session(id, draft)?.ok_or(ApiError::NotFound)
        })
        .await?;
    Ok(Json(SessionResource::from(&record)))
}

/// DELETE /sessions/{id}/
pub async fn destroy(
    State(state): State<AppState>,
    id: Result<Path<SessionId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    let deleted = state
        .with_store(move |store| Ok(store.delete_session(id)?))
        .await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// GET /sessions/geojson/?q=&system=&open=&province=
pub async fn geojson(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Collection, ApiError> {
    let Query(pairs) = query?;
    let filters = FilterParams::from_pairs(&pairs).into_query();
    let collection = state
        .with_store(move |store| Ok(query::sessions_geojson(store, &filters)?))
        .await?;
    Ok(Json(collection))
}

/// GET /sessions/in-bbox/?west=&south=&east=&north=&system=&open=&province=
pub async fn in_bbox(
    State(state): State<AppState>,
    query: Result<Query<Pairs>, QueryRejection>,
) -> Result<Collection, ApiError> {
    let Query(pairs) = query?;
    let (bbox, filters) = BboxParams::from_pairs(&pairs).into_parts()?;
    let collection = state
        .with_store(move |store| Ok(query::sessions_in_bbox(store, &bbox, &filters)?))
        .await?;
    Ok(Json(collection))
}

/// POST /sessions/nearest/ with `{lat, lng, limit?, system?, open?, province?}`
/// as JSON or a urlencoded form
pub async fn nearest(
    State(state): State<AppState>,
    body: NearestBody,
) -> Result<Collection, ApiError> {
    let search = body.into_query()?;
    let collection = state
        .with_store(move |store| Ok(query::nearest_sessions(store, &search)?))
        .await?;
    Ok(Json(collection))
}

/// GET /sessions/distinct-systems/
pub async fn distinct_systems(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let systems = state
        .with_store(|store| Ok(query::distinct_game_systems(store)?))
        .await?;
    Ok(Json(systems))
}
