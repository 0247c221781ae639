use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use super::registry::{check_window_allows_activation, is_eligible_at, validate_window};
use super::strategy::{SelectionRule, SelectionThresholds};
use super::{clamp_page_size, DomainError};
use crate::db::queries::{products, showcases, type_hints};
use crate::models::api::{PagedResult, ShowcaseDetail, ShowcaseDraft};
use crate::models::records::TypeHintRecord;

/// A showcase may only bind to a hint that is currently eligible
async fn load_eligible_hint(
    pool: &PgPool,
    key: &str,
    now: DateTime<Utc>,
) -> Result<TypeHintRecord, DomainError> {
    let record = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;
    if !is_eligible_at(&record, now) {
        return Err(DomainError::Conflict(format!(
            "Type hint is not currently eligible: {}",
            key
        )));
    }
    Ok(record)
}

/// Refuse to stand up a section no product would ever fill
fn check_pool_not_empty(key: &str, matching: i64) -> Result<(), DomainError> {
    if matching == 0 {
        return Err(DomainError::Conflict(format!(
            "No sellable products currently match type hint: {}",
            key
        )));
    }
    Ok(())
}

async fn ensure_nonempty_pool(
    pool: &PgPool,
    hint: &TypeHintRecord,
    thresholds: &SelectionThresholds,
) -> Result<(), DomainError> {
    let rule = SelectionRule::for_hint(&hint.key, hint.is_system, thresholds);
    let matching = products::count_matching(pool, &rule).await?;
    check_pool_not_empty(&hint.key, matching)
}

fn validate_titles(draft: &ShowcaseDraft) -> Result<(), DomainError> {
    if draft.title_en.trim().is_empty() || draft.title_ar.trim().is_empty() {
        return Err(DomainError::Validation(
            "titles must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[tracing::instrument(skip(pool))]
pub async fn list_showcases(
    pool: &PgPool,
    include_deleted: bool,
    cursor: Option<i64>,
    limit: Option<i64>,
) -> Result<PagedResult<ShowcaseDetail>, DomainError> {
    let limit = clamp_page_size(limit);
    let records = showcases::list(pool, include_deleted, cursor, limit).await?;

    let next_cursor = if records.len() as i64 == limit {
        records.last().map(|record| record.id)
    } else {
        None
    };
    let items = records.into_iter().map(ShowcaseDetail::from).collect();

    Ok(PagedResult { items, next_cursor })
}

#[tracing::instrument(skip(pool, thresholds, draft), fields(type_hint = %draft.type_hint))]
pub async fn create_showcase(
    pool: &PgPool,
    thresholds: &SelectionThresholds,
    draft: &ShowcaseDraft,
    actor: &str,
) -> Result<ShowcaseDetail, DomainError> {
    // 1. Validate the payload
    validate_titles(draft)?;
    validate_window(draft.start_date, draft.end_date)?;

    // 2. The bound hint must be live and must select something today
    let hint = load_eligible_hint(pool, &draft.type_hint, Utc::now()).await?;
    ensure_nonempty_pool(pool, &hint, thresholds).await?;

    // 3. Insert inactive; activation is a separate step
    let record = showcases::insert(pool, draft, actor).await?;

    info!("Created showcase {} for hint {}", record.id, record.type_hint);
    Ok(record.into())
}

#[tracing::instrument(skip(pool, thresholds, draft))]
pub async fn update_showcase(
    pool: &PgPool,
    thresholds: &SelectionThresholds,
    id: i64,
    draft: &ShowcaseDraft,
    actor: &str,
) -> Result<ShowcaseDetail, DomainError> {
    validate_titles(draft)?;
    validate_window(draft.start_date, draft.end_date)?;

    let existing = showcases::get_by_id(pool, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Showcase not found: {}", id)))?;

    // Rebinding to another hint re-runs the creation checks; editing
    // titles on a showcase whose hint lapsed stays allowed
    if draft.type_hint != existing.type_hint {
        if existing.is_system {
            return Err(DomainError::Forbidden(
                "System showcases keep their built-in hint".to_string(),
            ));
        }
        let hint = load_eligible_hint(pool, &draft.type_hint, Utc::now()).await?;
        ensure_nonempty_pool(pool, &hint, thresholds).await?;
    }

    let record = showcases::update_fields(pool, id, draft, actor)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Showcase not found: {}", id)))?;

    info!("Updated showcase {}", id);
    Ok(record.into())
}

#[tracing::instrument(skip(pool))]
pub async fn set_showcase_active(
    pool: &PgPool,
    id: i64,
    active: bool,
    actor: &str,
) -> Result<ShowcaseDetail, DomainError> {
    let existing = showcases::get_by_id(pool, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Showcase not found: {}", id)))?;

    if active {
        let now = Utc::now();
        check_window_allows_activation(existing.start_date, existing.end_date, now)?;
        load_eligible_hint(pool, &existing.type_hint, now).await?;
    }

    let affected = showcases::set_active(pool, id, active, actor).await?;
    if affected == 0 {
        return Err(DomainError::Conflict(format!(
            "Showcase is already {}: {}",
            if active { "active" } else { "inactive" },
            id
        )));
    }

    info!("Set showcase {} active={}", id, active);

    let record = showcases::get_by_id(pool, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Showcase not found: {}", id)))?;
    Ok(record.into())
}

#[tracing::instrument(skip(pool))]
pub async fn delete_showcase(pool: &PgPool, id: i64, actor: &str) -> Result<(), DomainError> {
    let existing = showcases::get_by_id(pool, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Showcase not found: {}", id)))?;

    if existing.is_system {
        return Err(DomainError::Forbidden(
            "System showcases cannot be deleted".to_string(),
        ));
    }

    let affected = showcases::soft_delete(pool, id, actor).await?;
    if affected == 0 {
        return Err(DomainError::NotFound(format!("Showcase not found: {}", id)));
    }

    info!("Soft-deleted showcase {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_empty_selection_pool_refuses_the_showcase() {
        let refused = check_pool_not_empty("summer_picks", 0);
        match refused {
            Err(DomainError::Conflict(msg)) => {
                assert!(msg.contains("No sellable products"));
                assert!(msg.contains("summer_picks"));
            }
            other => panic!("expected a conflict, got {:?}", other),
        }

        assert!(check_pool_not_empty("summer_picks", 1).is_ok());
        assert!(check_pool_not_empty("best_sellers", 12).is_ok());
    }

    #[test]
    fn blank_titles_are_rejected() {
        let draft = |en: &str, ar: &str| ShowcaseDraft {
            type_hint: "summer_picks".to_string(),
            title_en: en.to_string(),
            title_ar: ar.to_string(),
            description_en: None,
            description_ar: None,
            show_all_text_en: None,
            show_all_text_ar: None,
            start_date: None,
            end_date: None,
        };

        assert!(matches!(
            validate_titles(&draft("  ", "عروض الصيف")),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            validate_titles(&draft("Summer Picks", "")),
            Err(DomainError::Validation(_))
        ));
        assert!(validate_titles(&draft("Summer Picks", "عروض الصيف")).is_ok());
    }
}
