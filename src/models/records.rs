use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row in merch_typehint. The `key` is the stable identifier used by
/// showcases and products; `id` is only used for pagination cursors.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TypeHintRecord {
    pub id: i64,
    pub key: String,
    pub label_en: String,
    pub label_ar: String,
    pub priority: i32,
    pub is_system: bool,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub status_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row in merch_showcase
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ShowcaseRecord {
    pub id: i64,
    pub type_hint: String,
    pub title_en: String,
    pub title_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub show_all_text_en: Option<String>,
    pub show_all_text_ar: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub is_system: bool,
    pub created_by: String,
    pub updated_by: Option<String>,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Showcase joined with the bits of its type hint the storefront needs:
/// the hint's priority drives section ordering and is_system picks the
/// selection rule.
#[derive(Debug, Clone, FromRow)]
pub struct VisibleShowcaseRow {
    pub id: i64,
    pub type_hint: String,
    pub title_en: String,
    pub title_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub show_all_text_en: Option<String>,
    pub show_all_text_ar: Option<String>,
    pub hint_priority: i32,
    pub hint_is_system: bool,
}

/// Row in catalog_product. Owned by the catalog service; this crate
/// only ever reads it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: i64,
    pub slug: String,
    pub name_en: String,
    pub name_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<i64>,
    pub sub_category_id: Option<i64>,
    pub price: Decimal,
    pub rating: Option<Decimal>,
    pub type_hint: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub available_count: i32,
    pub view_count: i64,
    pub sell_count: i64,
    pub favorite_count: i64,
    pub weekly_view_count: i64,
    pub weekly_favorite_count: i64,
    pub weekly_score: Decimal,
    pub random_tag: f64,
    pub created_at: DateTime<Utc>,
}
