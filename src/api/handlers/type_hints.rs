use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::{require_actor, StatusResponse};
use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::domain::registry;
use crate::models::api::{PagedResult, TypeHintView};

#[derive(Debug, Deserialize)]
pub struct TypeHintListParams {
    pub q: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTypeHintPayload {
    pub key: String,
    pub label_en: String,
    pub label_ar: String,
    pub priority: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTypeHintPayload {
    pub label_en: String,
    pub label_ar: String,
    pub priority: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct ActorPayload {
    pub actor: String,
}

#[derive(Debug, Deserialize)]
pub struct ActorQueryParams {
    pub actor: String,
}

#[tracing::instrument(skip(state, params))]
pub async fn list_handler(
    Query(params): Query<TypeHintListParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<PagedResult<TypeHintView>>> {
    let page = registry::list_hints(
        &state.pool,
        params.q.as_deref(),
        params.include_deleted,
        params.cursor,
        params.limit,
    )
    .await?;

    Ok(Json(page))
}

#[tracing::instrument(skip(state))]
pub async fn get_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<TypeHintView>> {
    let hint = registry::get_hint(&state.pool, &key).await?;
    Ok(Json(hint))
}

#[tracing::instrument(skip(state, payload), fields(key = %payload.key))]
pub async fn create_handler(
    State(state): State<AppState>,
    Json(payload): Json<CreateTypeHintPayload>,
) -> ApiResult<Json<TypeHintView>> {
    info!("Processing type hint create request");
    require_actor(&payload.actor)?;

    let hint = registry::create_hint(
        &state.pool,
        &state.hints,
        &payload.key,
        &payload.label_en,
        &payload.label_ar,
        payload.priority,
        payload.start_date,
        payload.end_date,
        &payload.actor,
    )
    .await?;

    Ok(Json(hint))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTypeHintPayload>,
) -> ApiResult<Json<TypeHintView>> {
    info!("Processing type hint update request");
    require_actor(&payload.actor)?;

    let hint = registry::update_hint(
        &state.pool,
        &state.hints,
        &key,
        &payload.label_en,
        &payload.label_ar,
        payload.priority,
        payload.start_date,
        payload.end_date,
        &payload.actor,
    )
    .await?;

    Ok(Json(hint))
}

#[tracing::instrument(skip(state, payload))]
pub async fn activate_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ActorPayload>,
) -> ApiResult<Json<TypeHintView>> {
    require_actor(&payload.actor)?;
    let hint =
        registry::set_hint_active(&state.pool, &state.hints, &key, true, &payload.actor).await?;
    Ok(Json(hint))
}

#[tracing::instrument(skip(state, payload))]
pub async fn deactivate_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ActorPayload>,
) -> ApiResult<Json<TypeHintView>> {
    require_actor(&payload.actor)?;
    let hint =
        registry::set_hint_active(&state.pool, &state.hints, &key, false, &payload.actor).await?;
    Ok(Json(hint))
}

#[tracing::instrument(skip(state, payload))]
pub async fn restore_handler(
    Path(key): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ActorPayload>,
) -> ApiResult<Json<TypeHintView>> {
    require_actor(&payload.actor)?;
    let hint = registry::restore_hint(&state.pool, &state.hints, &key, &payload.actor).await?;
    Ok(Json(hint))
}

#[tracing::instrument(skip(state, params))]
pub async fn delete_handler(
    Path(key): Path<String>,
    Query(params): Query<ActorQueryParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<StatusResponse>> {
    require_actor(&params.actor)?;
    registry::delete_hint(&state.pool, &state.hints, &key, &params.actor).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}
