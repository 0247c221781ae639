use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use super::cache::HintCache;
use super::{clamp_page_size, DomainError};
use crate::db::queries::type_hints;
use crate::models::api::{PagedResult, TypeHintView};
use crate::models::records::TypeHintRecord;

/// A hint drives selection only while it is live and inside its
/// activation window. Open-ended sides of the window always pass.
pub fn is_eligible_at(record: &TypeHintRecord, now: DateTime<Utc>) -> bool {
    if record.deleted_at.is_some() || !record.is_active {
        return false;
    }
    window_is_open(record.start_date, record.end_date, now)
}

fn window_is_open(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    if let Some(start) = start_date {
        if start > now {
            return false;
        }
    }
    if let Some(end) = end_date {
        if end < now {
            return false;
        }
    }
    true
}

/// Reject windows that end before they begin
pub(crate) fn validate_window(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(), DomainError> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(DomainError::Validation(
                "end_date must not precede start_date".to_string(),
            ));
        }
    }
    Ok(())
}

/// Activation is pointless outside the window, so it is refused rather
/// than silently scheduled
pub(crate) fn check_window_allows_activation(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    if let Some(end) = end_date {
        if end < now {
            return Err(DomainError::InvalidState(
                "activation window has already elapsed".to_string(),
            ));
        }
    }
    if let Some(start) = start_date {
        if start > now {
            return Err(DomainError::InvalidState(
                "activation window has not yet begun".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_labels(key: &str, label_en: &str, label_ar: &str) -> Result<(), DomainError> {
    if key.trim().is_empty() {
        return Err(DomainError::Validation("key must not be empty".to_string()));
    }
    if label_en.trim().is_empty() || label_ar.trim().is_empty() {
        return Err(DomainError::Validation(
            "labels must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[tracing::instrument(skip(pool))]
pub async fn list_hints(
    pool: &PgPool,
    search: Option<&str>,
    include_deleted: bool,
    cursor: Option<i64>,
    limit: Option<i64>,
) -> Result<PagedResult<TypeHintView>, DomainError> {
    let limit = clamp_page_size(limit);
    let records = type_hints::list(pool, search, include_deleted, cursor, limit).await?;

    let next_cursor = if records.len() as i64 == limit {
        records.last().map(|record| record.id)
    } else {
        None
    };
    let items = records.into_iter().map(TypeHintView::from).collect();

    Ok(PagedResult { items, next_cursor })
}

#[tracing::instrument(skip(pool))]
pub async fn get_hint(pool: &PgPool, key: &str) -> Result<TypeHintView, DomainError> {
    let record = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;
    Ok(record.into())
}

#[tracing::instrument(skip(pool, cache, label_en, label_ar))]
pub async fn create_hint(
    pool: &PgPool,
    cache: &HintCache,
    key: &str,
    label_en: &str,
    label_ar: &str,
    priority: i32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    actor: &str,
) -> Result<TypeHintView, DomainError> {
    // 1. Validate the payload before touching the database
    validate_labels(key, label_en, label_ar)?;
    validate_window(start_date, end_date)?;

    // 2. Uniqueness spans key and both labels over live rows
    if type_hints::has_conflict(pool, key, label_en, label_ar, None).await? {
        return Err(DomainError::Conflict(format!(
            "A type hint with this key or label already exists: {}",
            key
        )));
    }

    // 3. Insert inactive; activation is its own deliberate step
    let record = type_hints::insert(
        pool, key, label_en, label_ar, priority, start_date, end_date, actor,
    )
    .await
    .map_err(conflict_on_unique)?;

    cache.invalidate().await;
    info!("Created type hint {} (id {})", record.key, record.id);
    Ok(record.into())
}

#[tracing::instrument(skip(pool, cache, label_en, label_ar))]
pub async fn update_hint(
    pool: &PgPool,
    cache: &HintCache,
    key: &str,
    label_en: &str,
    label_ar: &str,
    priority: i32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    actor: &str,
) -> Result<TypeHintView, DomainError> {
    validate_labels(key, label_en, label_ar)?;
    validate_window(start_date, end_date)?;

    // System hints take edits to labels, priority, and window alike;
    // only toggling and deletion are reserved
    let existing = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;

    if type_hints::has_conflict(pool, key, label_en, label_ar, Some(existing.id)).await? {
        return Err(DomainError::Conflict(format!(
            "A type hint with this key or label already exists: {}",
            key
        )));
    }

    let record = type_hints::update_fields(
        pool, key, label_en, label_ar, priority, start_date, end_date, actor,
    )
    .await?
    .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;

    cache.invalidate().await;
    info!("Updated type hint {}", record.key);
    Ok(record.into())
}

#[tracing::instrument(skip(pool, cache))]
pub async fn set_hint_active(
    pool: &PgPool,
    cache: &HintCache,
    key: &str,
    active: bool,
    actor: &str,
) -> Result<TypeHintView, DomainError> {
    let existing = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;

    if existing.is_system {
        return Err(DomainError::Forbidden(
            "System type hints cannot be toggled".to_string(),
        ));
    }

    if active {
        check_window_allows_activation(existing.start_date, existing.end_date, Utc::now())?;
    }

    // The UPDATE re-checks the state; zero rows means a concurrent
    // transition already landed
    let affected = type_hints::set_active(pool, key, active, actor).await?;
    if affected == 0 {
        return Err(DomainError::Conflict(format!(
            "Type hint is already {}: {}",
            if active { "active" } else { "inactive" },
            key
        )));
    }

    cache.invalidate().await;
    info!("Set type hint {} active={}", key, active);

    let record = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;
    Ok(record.into())
}

#[tracing::instrument(skip(pool, cache))]
pub async fn delete_hint(
    pool: &PgPool,
    cache: &HintCache,
    key: &str,
    actor: &str,
) -> Result<(), DomainError> {
    let existing = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;

    if existing.is_system {
        return Err(DomainError::Forbidden(
            "System type hints cannot be deleted".to_string(),
        ));
    }

    let affected = type_hints::soft_delete(pool, key, actor).await?;
    if affected == 0 {
        return Err(DomainError::NotFound(format!(
            "Type hint not found: {}",
            key
        )));
    }

    cache.invalidate().await;
    info!("Soft-deleted type hint {}", key);
    Ok(())
}

#[tracing::instrument(skip(pool, cache))]
pub async fn restore_hint(
    pool: &PgPool,
    cache: &HintCache,
    key: &str,
    actor: &str,
) -> Result<TypeHintView, DomainError> {
    let existing = type_hints::get_by_key_any(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;

    if existing.deleted_at.is_none() {
        return Err(DomainError::Conflict(format!(
            "Type hint is not deleted: {}",
            key
        )));
    }

    // The key or labels may have been reused while this row was gone
    if type_hints::has_conflict(pool, key, &existing.label_en, &existing.label_ar, Some(existing.id))
        .await?
    {
        return Err(DomainError::Conflict(format!(
            "A live type hint now uses this key or label: {}",
            key
        )));
    }

    let affected = type_hints::restore(pool, existing.id, actor).await?;
    if affected == 0 {
        return Err(DomainError::Conflict(format!(
            "Type hint is not deleted: {}",
            key
        )));
    }

    cache.invalidate().await;
    info!("Restored type hint {}", key);

    // Restored rows come back inactive and must be re-activated
    let record = type_hints::get_by_key(pool, key)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Type hint not found: {}", key)))?;
    Ok(record.into())
}

fn conflict_on_unique(e: crate::db::DatabaseError) -> DomainError {
    if e.is_integrity_error() {
        DomainError::Conflict("A type hint with this key or label already exists".to_string())
    } else {
        e.into()
    }
}
