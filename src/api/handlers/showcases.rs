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
use crate::domain::showcases;
use crate::models::api::{PagedResult, ShowcaseDetail, ShowcaseDraft};

#[derive(Debug, Deserialize)]
pub struct ShowcaseListParams {
    #[serde(default)]
    pub include_deleted: bool,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ShowcasePayload {
    pub type_hint: String,
    pub title_en: String,
    pub title_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub show_all_text_en: Option<String>,
    pub show_all_text_ar: Option<String>,
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

impl ShowcasePayload {
    fn into_parts(self) -> (ShowcaseDraft, String) {
        let draft = ShowcaseDraft {
            type_hint: self.type_hint,
            title_en: self.title_en,
            title_ar: self.title_ar,
            description_en: self.description_en,
            description_ar: self.description_ar,
            show_all_text_en: self.show_all_text_en,
            show_all_text_ar: self.show_all_text_ar,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        (draft, self.actor)
    }
}

#[tracing::instrument(skip(state, params))]
pub async fn list_handler(
    Query(params): Query<ShowcaseListParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<PagedResult<ShowcaseDetail>>> {
    let page = showcases::list_showcases(
        &state.pool,
        params.include_deleted,
        params.cursor,
        params.limit,
    )
    .await?;

    Ok(Json(page))
}

#[tracing::instrument(skip(state, payload), fields(type_hint = %payload.type_hint))]
pub async fn create_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShowcasePayload>,
) -> ApiResult<Json<ShowcaseDetail>> {
    info!("Processing showcase create request");
    require_actor(&payload.actor)?;

    let (draft, actor) = payload.into_parts();
    let showcase =
        showcases::create_showcase(&state.pool, &state.thresholds, &draft, &actor).await?;

    Ok(Json(showcase))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<ShowcasePayload>,
) -> ApiResult<Json<ShowcaseDetail>> {
    info!("Processing showcase update request");
    require_actor(&payload.actor)?;

    let (draft, actor) = payload.into_parts();
    let showcase =
        showcases::update_showcase(&state.pool, &state.thresholds, id, &draft, &actor).await?;

    Ok(Json(showcase))
}

#[tracing::instrument(skip(state, payload))]
pub async fn activate_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<ActorPayload>,
) -> ApiResult<Json<ShowcaseDetail>> {
    require_actor(&payload.actor)?;
    let showcase = showcases::set_showcase_active(&state.pool, id, true, &payload.actor).await?;
    Ok(Json(showcase))
}

#[tracing::instrument(skip(state, payload))]
pub async fn deactivate_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(payload): Json<ActorPayload>,
) -> ApiResult<Json<ShowcaseDetail>> {
    require_actor(&payload.actor)?;
    let showcase = showcases::set_showcase_active(&state.pool, id, false, &payload.actor).await?;
    Ok(Json(showcase))
}

#[tracing::instrument(skip(state, params))]
pub async fn delete_handler(
    Path(id): Path<i64>,
    Query(params): Query<ActorQueryParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<StatusResponse>> {
    require_actor(&params.actor)?;
    showcases::delete_showcase(&state.pool, id, &params.actor).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}
