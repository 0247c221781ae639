use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::api::error::ApiResult;
use crate::api::server::AppState;
use crate::domain::search::SearchRequest;
use crate::domain::{curation, search};
use crate::models::api::{PagedResult, ProductCard, ShowcaseWithItems};

#[derive(Debug, Deserialize)]
pub struct ShowcasesQueryParams {
    pub viewer_id: Option<String>,
    pub limit: Option<i64>,
}

#[tracing::instrument(skip(state, params))]
pub async fn get_showcases_handler(
    Query(params): Query<ShowcasesQueryParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ShowcaseWithItems>>> {
    info!("Processing storefront showcases request");

    let sections = curation::get_active_showcases(
        &state.pool,
        &state.thresholds,
        params.viewer_id.as_deref(),
        params.limit,
    )
    .await?;

    Ok(Json(sections))
}

#[derive(Debug, Deserialize)]
pub struct SearchQueryParams {
    pub term: Option<String>,
    pub type_hint: Option<String>,
    pub viewer_id: Option<String>,
    pub category_id: Option<i64>,
    pub sub_category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<Decimal>,
    pub max_rating: Option<Decimal>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub before_num_of_days: Option<i64>,
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

#[tracing::instrument(
    skip(state, params),
    fields(
        term = params.term.as_deref().unwrap_or("-"),
        type_hint = params.type_hint.as_deref().unwrap_or("-")
    )
)]
pub async fn search_handler(
    Query(params): Query<SearchQueryParams>,
    State(state): State<AppState>,
) -> ApiResult<Json<PagedResult<ProductCard>>> {
    info!("Processing storefront search request");

    let viewer_id = params.viewer_id;
    let request = SearchRequest {
        term: params.term,
        type_hint: params.type_hint,
        category_id: params.category_id,
        sub_category_id: params.sub_category_id,
        min_price: params.min_price,
        max_price: params.max_price,
        min_rating: params.min_rating,
        max_rating: params.max_rating,
        created_from: params.created_from,
        created_to: params.created_to,
        before_num_of_days: params.before_num_of_days,
        cursor: params.cursor,
        limit: params.limit,
    };

    let page =
        search::search_products(&state.pool, &state.hints, viewer_id.as_deref(), &request).await?;

    Ok(Json(page))
}
