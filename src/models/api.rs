use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::records::{ProductRecord, ShowcaseRecord, TypeHintRecord, VisibleShowcaseRow};

/// Product as served to the storefront. Counters and ranking fields
/// stay internal; the card only carries what a section tile renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCard {
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
    pub available_count: i32,
    pub is_wish_listed: bool,
}

impl ProductCard {
    pub fn from_record(record: &ProductRecord, wishlist: &HashSet<i64>) -> Self {
        ProductCard {
            id: record.id,
            slug: record.slug.clone(),
            name_en: record.name_en.clone(),
            name_ar: record.name_ar.clone(),
            description_en: record.description_en.clone(),
            description_ar: record.description_ar.clone(),
            tags: record.tags.clone(),
            category_id: record.category_id,
            sub_category_id: record.sub_category_id,
            price: record.price,
            rating: record.rating,
            available_count: record.available_count,
            is_wish_listed: wishlist.contains(&record.id),
        }
    }
}

/// Showcase header fields as served to the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseView {
    pub id: i64,
    pub type_hint: String,
    pub title_en: String,
    pub title_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub show_all_text_en: Option<String>,
    pub show_all_text_ar: Option<String>,
}

impl ShowcaseView {
    pub fn from_row(row: &VisibleShowcaseRow) -> Self {
        ShowcaseView {
            id: row.id,
            type_hint: row.type_hint.clone(),
            title_en: row.title_en.clone(),
            title_ar: row.title_ar.clone(),
            description_en: row.description_en.clone(),
            description_ar: row.description_ar.clone(),
            show_all_text_en: row.show_all_text_en.clone(),
            show_all_text_ar: row.show_all_text_ar.clone(),
        }
    }
}

/// One storefront section: the showcase header plus its sampled items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseWithItems {
    pub showcase: ShowcaseView,
    pub items: Vec<ProductCard>,
}

/// Cursor-paginated result set. The cursor is the last-seen row id;
/// `None` means the walk is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<i64>,
}

impl<T> PagedResult<T> {
    pub fn empty() -> Self {
        PagedResult {
            items: Vec::new(),
            next_cursor: None,
        }
    }
}

/// Type hint as returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeHintView {
    pub id: i64,
    pub key: String,
    pub label_en: String,
    pub label_ar: String,
    pub priority: i32,
    pub is_system: bool,
    pub is_active: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status_reason: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TypeHintRecord> for TypeHintView {
    fn from(record: TypeHintRecord) -> Self {
        TypeHintView {
            id: record.id,
            key: record.key,
            label_en: record.label_en,
            label_ar: record.label_ar,
            priority: record.priority,
            is_system: record.is_system,
            is_active: record.is_active,
            start_date: record.start_date,
            end_date: record.end_date,
            status_reason: record.status_reason,
            deleted_at: record.deleted_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Editable showcase fields, as accepted by the admin create and
/// update endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseDraft {
    pub type_hint: String,
    pub title_en: String,
    pub title_ar: String,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub show_all_text_en: Option<String>,
    pub show_all_text_ar: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Showcase as returned by the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowcaseDetail {
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
    pub is_system: bool,
    pub status_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ShowcaseRecord> for ShowcaseDetail {
    fn from(record: ShowcaseRecord) -> Self {
        ShowcaseDetail {
            id: record.id,
            type_hint: record.type_hint,
            title_en: record.title_en,
            title_ar: record.title_ar,
            description_en: record.description_en,
            description_ar: record.description_ar,
            show_all_text_en: record.show_all_text_en,
            show_all_text_ar: record.show_all_text_ar,
            start_date: record.start_date,
            end_date: record.end_date,
            is_active: record.is_active,
            is_system: record.is_system,
            status_reason: record.status_reason,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
