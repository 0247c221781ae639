use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use super::cache::HintCache;
use super::registry::is_eligible_at;
use super::strategy::{SelectionRule, SystemHint};
use super::{clamp_page_size, DomainError};
use crate::db::queries::products::{self, ProductSearchSql};
use crate::db::queries::{type_hints, wishlists};
use crate::models::api::{PagedResult, ProductCard};
use crate::models::records::TypeHintRecord;

/// Rolling created-within filter never reaches past this
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Everything a storefront search request can carry. A request with
/// neither a term nor a hint has nothing to rank and yields an empty
/// page.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub term: Option<String>,
    pub type_hint: Option<String>,
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

enum HintDisposition {
    /// No hint requested
    None,
    /// Unknown, deleted, inactive or out-of-window hint
    Ineligible,
    /// Built-in hint: orders by its metric, filters nothing
    System(SystemHint),
    /// Curated hint: filters to products tagged with it
    Curated(String),
}

fn classify_hint(
    requested: Option<&str>,
    hints: &HashMap<String, TypeHintRecord>,
    now: DateTime<Utc>,
) -> HintDisposition {
    let key = match requested {
        Some(key) => key,
        None => return HintDisposition::None,
    };
    let record = match hints.get(key) {
        Some(record) => record,
        None => return HintDisposition::Ineligible,
    };
    if !is_eligible_at(record, now) {
        return HintDisposition::Ineligible;
    }
    match SystemHint::from_key(key) {
        Some(system) if record.is_system => HintDisposition::System(system),
        _ => HintDisposition::Curated(key.to_string()),
    }
}

/// The rolling day filter wins over absolute bounds when both are sent
fn resolve_date_window(
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    before_num_of_days: Option<i64>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    match before_num_of_days {
        Some(days) => {
            let days = days.clamp(0, MAX_LOOKBACK_DAYS);
            (Some(now - Duration::days(days)), None)
        }
        None => (created_from, created_to),
    }
}

fn validate_ranges(request: &SearchRequest) -> Result<(), DomainError> {
    if let (Some(min), Some(max)) = (request.min_price, request.max_price) {
        if min > max {
            return Err(DomainError::Validation(
                "min_price must not exceed max_price".to_string(),
            ));
        }
    }
    if let (Some(min), Some(max)) = (request.min_rating, request.max_rating) {
        if min > max {
            return Err(DomainError::Validation(
                "min_rating must not exceed max_rating".to_string(),
            ));
        }
    }
    if let (Some(from), Some(to)) = (request.created_from, request.created_to) {
        if from > to {
            return Err(DomainError::Validation(
                "created_from must not exceed created_to".to_string(),
            ));
        }
    }
    Ok(())
}

/// Hint-aware product search with keyset pagination.
///
/// A system hint orders the page by its popularity metric; a curated
/// hint narrows the page to products tagged with it. An unknown or
/// currently ineligible hint yields an empty page rather than an error,
/// since storefront rails lapse mid-session all the time.
#[tracing::instrument(skip(pool, cache, request), fields(viewer = viewer_id.unwrap_or("-")))]
pub async fn search_products(
    pool: &PgPool,
    cache: &HintCache,
    viewer_id: Option<&str>,
    request: &SearchRequest,
) -> Result<PagedResult<ProductCard>, DomainError> {
    let now = Utc::now();
    validate_ranges(request)?;

    let term = request.term.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let hint_key = request
        .type_hint
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    if term.is_none() && hint_key.is_none() {
        return Ok(PagedResult::empty());
    }

    let disposition = match hint_key {
        None => HintDisposition::None,
        Some(_) => {
            let hints = cache.get_or_load(|| type_hints::load_all(pool)).await?;
            classify_hint(hint_key, &hints, now)
        }
    };

    let (rule, order): (Option<SelectionRule>, &[&'static str]) = match &disposition {
        HintDisposition::None => (None, &[]),
        HintDisposition::Ineligible => {
            debug!("Requested type hint is not eligible, returning empty page");
            return Ok(PagedResult::empty());
        }
        HintDisposition::System(system) => (None, system.sort_keys()),
        HintDisposition::Curated(key) => (Some(SelectionRule::TagEquals { key: key.clone() }), &[]),
    };

    let (created_after, created_before) = resolve_date_window(
        request.created_from,
        request.created_to,
        request.before_num_of_days,
        now,
    );

    let limit = clamp_page_size(request.limit);
    let args = ProductSearchSql {
        term,
        rule: rule.as_ref(),
        order,
        category_id: request.category_id,
        sub_category_id: request.sub_category_id,
        min_price: request.min_price,
        max_price: request.max_price,
        min_rating: request.min_rating,
        max_rating: request.max_rating,
        created_after,
        created_before,
        cursor: request.cursor,
        limit,
    };

    let records = products::search(pool, &args).await?;

    let wishlist: HashSet<i64> = match viewer_id {
        Some(viewer) => wishlists::load_product_ids(pool, viewer)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    let next_cursor = if records.len() as i64 == limit {
        records.last().map(|record| record.id)
    } else {
        None
    };
    let items = records
        .iter()
        .map(|record| ProductCard::from_record(record, &wishlist))
        .collect();

    debug!("Search returned {} products", records.len());
    Ok(PagedResult { items, next_cursor })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint(key: &str, is_system: bool, is_active: bool) -> TypeHintRecord {
        let now = Utc::now();
        TypeHintRecord {
            id: 1,
            key: key.to_string(),
            label_en: key.to_string(),
            label_ar: key.to_string(),
            priority: 10,
            is_system,
            is_active,
            start_date: None,
            end_date: None,
            created_by: "test".to_string(),
            updated_by: None,
            status_reason: None,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn taxonomy(records: Vec<TypeHintRecord>) -> HashMap<String, TypeHintRecord> {
        records
            .into_iter()
            .map(|record| (record.key.clone(), record))
            .collect()
    }

    #[test]
    fn unknown_hint_is_ineligible() {
        let hints = taxonomy(vec![hint("trending", true, true)]);
        let disposition = classify_hint(Some("no_such_hint"), &hints, Utc::now());
        assert!(matches!(disposition, HintDisposition::Ineligible));
    }

    #[test]
    fn inactive_hint_is_ineligible() {
        let hints = taxonomy(vec![hint("summer_picks", false, false)]);
        let disposition = classify_hint(Some("summer_picks"), &hints, Utc::now());
        assert!(matches!(disposition, HintDisposition::Ineligible));
    }

    #[test]
    fn builtin_key_on_system_row_sorts_by_metric() {
        let hints = taxonomy(vec![hint("best_sellers", true, true)]);
        let disposition = classify_hint(Some("best_sellers"), &hints, Utc::now());
        assert!(matches!(
            disposition,
            HintDisposition::System(SystemHint::BestSellers)
        ));
    }

    #[test]
    fn curated_hint_filters_by_tag() {
        let hints = taxonomy(vec![hint("summer_picks", false, true)]);
        let disposition = classify_hint(Some("summer_picks"), &hints, Utc::now());
        match disposition {
            HintDisposition::Curated(key) => assert_eq!(key, "summer_picks"),
            _ => panic!("expected a curated disposition"),
        }
    }

    #[test]
    fn builtin_key_without_system_flag_falls_back_to_tag() {
        // An admin row that reuses a built-in key must not inherit the
        // metric ordering
        let hints = taxonomy(vec![hint("trending", false, true)]);
        let disposition = classify_hint(Some("trending"), &hints, Utc::now());
        assert!(matches!(disposition, HintDisposition::Curated(_)));
    }

    #[test]
    fn rolling_window_wins_over_absolute_bounds() {
        let now = Utc::now();
        let from = Some(now - Duration::days(90));
        let to = Some(now - Duration::days(30));

        let (after, before) = resolve_date_window(from, to, Some(7), now);
        assert_eq!(after, Some(now - Duration::days(7)));
        assert_eq!(before, None);

        let (after, before) = resolve_date_window(from, to, None, now);
        assert_eq!(after, from);
        assert_eq!(before, to);
    }

    #[test]
    fn rolling_window_is_capped() {
        let now = Utc::now();
        let (after, _) = resolve_date_window(None, None, Some(1_000_000), now);
        assert_eq!(after, Some(now - Duration::days(MAX_LOOKBACK_DAYS)));

        let (after, _) = resolve_date_window(None, None, Some(-5), now);
        assert_eq!(after, Some(now));
    }

    #[test]
    fn inverted_ranges_are_rejected() {
        let request = SearchRequest {
            term: Some("lamp".to_string()),
            min_price: Some(Decimal::from(100)),
            max_price: Some(Decimal::from(10)),
            ..Default::default()
        };
        assert!(matches!(
            validate_ranges(&request),
            Err(DomainError::Validation(_))
        ));

        let request = SearchRequest {
            term: Some("lamp".to_string()),
            min_rating: Some(Decimal::from(4)),
            max_rating: Some(Decimal::from(2)),
            ..Default::default()
        };
        assert!(matches!(
            validate_ranges(&request),
            Err(DomainError::Validation(_))
        ));

        let request = SearchRequest {
            term: Some("lamp".to_string()),
            ..Default::default()
        };
        assert!(validate_ranges(&request).is_ok());
    }
}
