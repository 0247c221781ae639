use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::errors::{DatabaseError, Result};
use crate::db::sql::{escape_like, SqlParam, SqlQuery};
use crate::models::records::TypeHintRecord;

const TYPE_HINT_COLUMNS: &str = "id, key, label_en, label_ar, priority, is_system, is_active, \
     start_date, end_date, created_by, updated_by, status_reason, deleted_at, created_at, updated_at";

/// Load every non-deleted type hint, for the config cache
#[tracing::instrument(skip(pool))]
pub async fn load_all(pool: &PgPool) -> Result<Vec<TypeHintRecord>> {
    let records = sqlx::query_as::<_, TypeHintRecord>(&format!(
        "SELECT {} FROM merch_typehint WHERE deleted_at IS NULL ORDER BY priority ASC, id ASC",
        TYPE_HINT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    debug!("Loaded {} type hints", records.len());
    Ok(records)
}

/// Load a single non-deleted type hint by key
#[tracing::instrument(skip(pool), fields(key = %key))]
pub async fn get_by_key(pool: &PgPool, key: &str) -> Result<Option<TypeHintRecord>> {
    let record = sqlx::query_as::<_, TypeHintRecord>(&format!(
        "SELECT {} FROM merch_typehint WHERE key = $1 AND deleted_at IS NULL",
        TYPE_HINT_COLUMNS
    ))
    .bind(key)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(record)
}

/// Restore-target lookup. Deleted keys are reclaimable, so several
/// rows can share one key; pick the live row when there is one,
/// otherwise the most recently deleted.
pub fn build_get_any_sql(key: &str) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let k = query.push(SqlParam::Text(key.to_string()));
    query.sql = format!(
        "SELECT {} FROM merch_typehint WHERE key = ${} \
         ORDER BY deleted_at DESC NULLS FIRST LIMIT 1",
        TYPE_HINT_COLUMNS, k
    );
    query
}

/// Load a type hint by key regardless of deletion state, for restore
#[tracing::instrument(skip(pool), fields(key = %key))]
pub async fn get_by_key_any(pool: &PgPool, key: &str) -> Result<Option<TypeHintRecord>> {
    build_get_any_sql(key).fetch_optional(pool).await
}

/// Admin listing with optional free-text filter over key and labels
pub fn build_list_sql(
    search: Option<&str>,
    include_deleted: bool,
    cursor: Option<i64>,
    limit: i64,
) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let mut conditions: Vec<String> = Vec::new();

    if !include_deleted {
        conditions.push("deleted_at IS NULL".to_string());
    }

    if let Some(term) = search {
        let n = query.push(SqlParam::Text(format!("%{}%", escape_like(term))));
        conditions.push(format!(
            "(key ILIKE ${0} OR label_en ILIKE ${0} OR label_ar ILIKE ${0})",
            n
        ));
    }

    if let Some(cursor) = cursor {
        let n = query.push(SqlParam::Int(cursor));
        conditions.push(format!("id < ${}", n));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let n = query.push(SqlParam::Int(limit));
    query.sql = format!(
        "SELECT {} FROM merch_typehint{} ORDER BY id DESC LIMIT ${}",
        TYPE_HINT_COLUMNS, where_clause, n
    );
    query
}

#[tracing::instrument(skip(pool))]
pub async fn list(
    pool: &PgPool,
    search: Option<&str>,
    include_deleted: bool,
    cursor: Option<i64>,
    limit: i64,
) -> Result<Vec<TypeHintRecord>> {
    let query = build_list_sql(search, include_deleted, cursor, limit);
    let records = query.fetch_all::<TypeHintRecord>(pool).await?;

    debug!("Listed {} type hints", records.len());
    Ok(records)
}

/// Uniqueness probe: does any other non-deleted hint claim this key or
/// either label?
pub fn build_conflict_sql(
    key: &str,
    label_en: &str,
    label_ar: &str,
    exclude_id: Option<i64>,
) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let k = query.push(SqlParam::Text(key.to_string()));
    let en = query.push(SqlParam::Text(label_en.to_string()));
    let ar = query.push(SqlParam::Text(label_ar.to_string()));

    let mut sql = format!(
        "SELECT COUNT(*) FROM merch_typehint \
         WHERE deleted_at IS NULL AND (key = ${} OR label_en = ${} OR label_ar = ${})",
        k, en, ar
    );

    if let Some(id) = exclude_id {
        let n = query.push(SqlParam::Int(id));
        sql.push_str(&format!(" AND id <> ${}", n));
    }

    query.sql = sql;
    query
}

pub async fn has_conflict(
    pool: &PgPool,
    key: &str,
    label_en: &str,
    label_ar: &str,
    exclude_id: Option<i64>,
) -> Result<bool> {
    let query = build_conflict_sql(key, label_en, label_ar, exclude_id);
    let count = query.fetch_count(pool).await?;
    Ok(count > 0)
}

/// Insert a new admin-defined hint. New hints start inactive and are
/// activated explicitly once the operator is happy with the window.
#[tracing::instrument(skip(pool), fields(key = %key))]
pub async fn insert(
    pool: &PgPool,
    key: &str,
    label_en: &str,
    label_ar: &str,
    priority: i32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    created_by: &str,
) -> Result<TypeHintRecord> {
    debug!("Inserting type hint: {}", key);

    let record = sqlx::query_as::<_, TypeHintRecord>(&format!(
        "INSERT INTO merch_typehint \
             (key, label_en, label_ar, priority, is_system, is_active, start_date, end_date, \
              created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, FALSE, FALSE, $5, $6, $7, NOW(), NOW()) \
         RETURNING {}",
        TYPE_HINT_COLUMNS
    ))
    .bind(key)
    .bind(label_en)
    .bind(label_ar)
    .bind(priority)
    .bind(start_date)
    .bind(end_date)
    .bind(created_by)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Inserted type hint {} with id {}", record.key, record.id);
    Ok(record)
}

/// Update the editable fields of a non-deleted hint
#[tracing::instrument(skip(pool), fields(key = %key))]
pub async fn update_fields(
    pool: &PgPool,
    key: &str,
    label_en: &str,
    label_ar: &str,
    priority: i32,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    updated_by: &str,
) -> Result<Option<TypeHintRecord>> {
    let record = sqlx::query_as::<_, TypeHintRecord>(&format!(
        "UPDATE merch_typehint \
         SET label_en = $2, label_ar = $3, priority = $4, start_date = $5, end_date = $6, \
             updated_by = $7, updated_at = NOW() \
         WHERE key = $1 AND deleted_at IS NULL \
         RETURNING {}",
        TYPE_HINT_COLUMNS
    ))
    .bind(key)
    .bind(label_en)
    .bind(label_ar)
    .bind(priority)
    .bind(start_date)
    .bind(end_date)
    .bind(updated_by)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(record)
}

/// Flip activation. The predicate re-checks everything the caller
/// validated so a lost race shows up as zero rows, not a bad write.
#[tracing::instrument(skip(pool), fields(key = %key, active = active))]
pub async fn set_active(pool: &PgPool, key: &str, active: bool, actor: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE merch_typehint \
         SET is_active = $2, updated_by = $3, status_reason = NULL, updated_at = NOW() \
         WHERE key = $1 AND deleted_at IS NULL AND is_system = FALSE AND is_active <> $2",
    )
    .bind(key)
    .bind(active)
    .bind(actor)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let affected = result.rows_affected();
    info!("Set type hint {} active={} ({} rows)", key, active, affected);
    Ok(affected)
}

/// Soft-delete a hint. Deactivates it at the same time so the next
/// cascade sweep takes its showcases down.
#[tracing::instrument(skip(pool), fields(key = %key))]
pub async fn soft_delete(pool: &PgPool, key: &str, actor: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE merch_typehint \
         SET deleted_at = NOW(), is_active = FALSE, updated_by = $2, updated_at = NOW() \
         WHERE key = $1 AND deleted_at IS NULL AND is_system = FALSE",
    )
    .bind(key)
    .bind(actor)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let affected = result.rows_affected();
    info!("Soft-deleted type hint {} ({} rows)", key, affected);
    Ok(affected)
}

/// Clear the deletion marker on one row, addressed by id: reclaimed
/// keys can leave several deleted rows behind, and reviving more than
/// one would break live-row uniqueness.
pub fn build_restore_sql(id: i64, actor: &str) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let i = query.push(SqlParam::Int(id));
    let a = query.push(SqlParam::Text(actor.to_string()));
    query.sql = format!(
        "UPDATE merch_typehint \
         SET deleted_at = NULL, updated_by = ${}, updated_at = NOW() \
         WHERE id = ${} AND deleted_at IS NOT NULL",
        a, i
    );
    query
}

/// The hint comes back inactive; activation is a separate explicit step
#[tracing::instrument(skip(pool), fields(id = id))]
pub async fn restore(pool: &PgPool, id: i64, actor: &str) -> Result<u64> {
    let affected = build_restore_sql(id, actor).execute(pool).await?;
    info!("Restored type hint {} ({} rows)", id, affected);
    Ok(affected)
}
