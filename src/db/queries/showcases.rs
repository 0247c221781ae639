use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::errors::{DatabaseError, Result};
use crate::db::sql::{SqlParam, SqlQuery};
use crate::models::api::ShowcaseDraft;
use crate::models::records::{ShowcaseRecord, VisibleShowcaseRow};

const SHOWCASE_COLUMNS: &str = "id, type_hint, title_en, title_ar, description_en, description_ar, \
     show_all_text_en, show_all_text_ar, start_date, end_date, is_active, is_deleted, is_system, \
     created_by, updated_by, status_reason, created_at, updated_at";

/// Load a single non-deleted showcase
#[tracing::instrument(skip(pool), fields(id = id))]
pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<ShowcaseRecord>> {
    let record = sqlx::query_as::<_, ShowcaseRecord>(&format!(
        "SELECT {} FROM merch_showcase WHERE id = $1 AND is_deleted = FALSE",
        SHOWCASE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(record)
}

/// Load the showcases the storefront should render right now: showcase
/// and hint both active, neither deleted, both windows open. Ordered by
/// hint priority, then showcase id for a stable tie-break.
#[tracing::instrument(skip(pool))]
pub async fn load_visible(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<VisibleShowcaseRow>> {
    let rows = sqlx::query_as::<_, VisibleShowcaseRow>(
        r#"
        SELECT
            s.id,
            s.type_hint,
            s.title_en,
            s.title_ar,
            s.description_en,
            s.description_ar,
            s.show_all_text_en,
            s.show_all_text_ar,
            t.priority AS hint_priority,
            t.is_system AS hint_is_system
        FROM merch_showcase s
        JOIN merch_typehint t ON t.key = s.type_hint
        WHERE s.is_active = TRUE
            AND s.is_deleted = FALSE
            AND (s.start_date IS NULL OR s.start_date <= $1)
            AND (s.end_date IS NULL OR s.end_date >= $1)
            AND t.is_active = TRUE
            AND t.deleted_at IS NULL
            AND (t.start_date IS NULL OR t.start_date <= $1)
            AND (t.end_date IS NULL OR t.end_date >= $1)
        ORDER BY t.priority ASC, s.id ASC
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Loaded {} visible showcases", rows.len());
    Ok(rows)
}

pub fn build_admin_list_sql(include_deleted: bool, cursor: Option<i64>, limit: i64) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let mut conditions: Vec<String> = Vec::new();

    if !include_deleted {
        conditions.push("is_deleted = FALSE".to_string());
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
        "SELECT {} FROM merch_showcase{} ORDER BY id DESC LIMIT ${}",
        SHOWCASE_COLUMNS, where_clause, n
    );
    query
}

#[tracing::instrument(skip(pool))]
pub async fn list(
    pool: &PgPool,
    include_deleted: bool,
    cursor: Option<i64>,
    limit: i64,
) -> Result<Vec<ShowcaseRecord>> {
    let query = build_admin_list_sql(include_deleted, cursor, limit);
    let records = query.fetch_all::<ShowcaseRecord>(pool).await?;

    debug!("Listed {} showcases", records.len());
    Ok(records)
}

/// Insert a new showcase. Starts inactive; activation is explicit.
#[tracing::instrument(skip(pool, draft), fields(type_hint = %draft.type_hint))]
pub async fn insert(
    pool: &PgPool,
    draft: &ShowcaseDraft,
    created_by: &str,
) -> Result<ShowcaseRecord> {
    debug!("Inserting showcase for type hint: {}", draft.type_hint);

    let record = sqlx::query_as::<_, ShowcaseRecord>(&format!(
        "INSERT INTO merch_showcase \
             (type_hint, title_en, title_ar, description_en, description_ar, \
              show_all_text_en, show_all_text_ar, start_date, end_date, \
              is_active, is_deleted, is_system, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, FALSE, FALSE, $10, NOW(), NOW()) \
         RETURNING {}",
        SHOWCASE_COLUMNS
    ))
    .bind(&draft.type_hint)
    .bind(&draft.title_en)
    .bind(&draft.title_ar)
    .bind(&draft.description_en)
    .bind(&draft.description_ar)
    .bind(&draft.show_all_text_en)
    .bind(&draft.show_all_text_ar)
    .bind(draft.start_date)
    .bind(draft.end_date)
    .bind(created_by)
    .fetch_one(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    info!("Inserted showcase {} for hint {}", record.id, record.type_hint);
    Ok(record)
}

/// Update the editable fields of a non-deleted showcase
#[tracing::instrument(skip(pool, draft), fields(id = id))]
pub async fn update_fields(
    pool: &PgPool,
    id: i64,
    draft: &ShowcaseDraft,
    updated_by: &str,
) -> Result<Option<ShowcaseRecord>> {
    let record = sqlx::query_as::<_, ShowcaseRecord>(&format!(
        "UPDATE merch_showcase \
         SET type_hint = $2, title_en = $3, title_ar = $4, description_en = $5, \
             description_ar = $6, show_all_text_en = $7, show_all_text_ar = $8, \
             start_date = $9, end_date = $10, updated_by = $11, updated_at = NOW() \
         WHERE id = $1 AND is_deleted = FALSE \
         RETURNING {}",
        SHOWCASE_COLUMNS
    ))
    .bind(id)
    .bind(&draft.type_hint)
    .bind(&draft.title_en)
    .bind(&draft.title_ar)
    .bind(&draft.description_en)
    .bind(&draft.description_ar)
    .bind(&draft.show_all_text_en)
    .bind(&draft.show_all_text_ar)
    .bind(draft.start_date)
    .bind(draft.end_date)
    .bind(updated_by)
    .fetch_optional(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    Ok(record)
}

/// Flip activation. System showcases can be toggled (hiding a built-in
/// section is a merchandising call), deletion is what they refuse.
#[tracing::instrument(skip(pool), fields(id = id, active = active))]
pub async fn set_active(pool: &PgPool, id: i64, active: bool, actor: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE merch_showcase \
         SET is_active = $2, updated_by = $3, status_reason = NULL, updated_at = NOW() \
         WHERE id = $1 AND is_deleted = FALSE AND is_active <> $2",
    )
    .bind(id)
    .bind(active)
    .bind(actor)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let affected = result.rows_affected();
    info!("Set showcase {} active={} ({} rows)", id, active, affected);
    Ok(affected)
}

#[tracing::instrument(skip(pool), fields(id = id))]
pub async fn soft_delete(pool: &PgPool, id: i64, actor: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE merch_showcase \
         SET is_deleted = TRUE, is_active = FALSE, updated_by = $2, updated_at = NOW() \
         WHERE id = $1 AND is_deleted = FALSE AND is_system = FALSE",
    )
    .bind(id)
    .bind(actor)
    .execute(pool)
    .await
    .map_err(DatabaseError::QueryError)?;

    let affected = result.rows_affected();
    info!("Soft-deleted showcase {} ({} rows)", id, affected);
    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_sql_default_shape() {
        let query = build_admin_list_sql(false, None, 20);

        assert!(query.sql.contains("WHERE is_deleted = FALSE"));
        assert!(query.sql.contains("ORDER BY id DESC LIMIT $1"));
        assert_eq!(query.params, vec![SqlParam::Int(20)]);
    }

    #[test]
    fn admin_list_sql_with_cursor() {
        let query = build_admin_list_sql(false, Some(31), 10);

        assert!(query.sql.contains("is_deleted = FALSE AND id < $1"));
        assert!(query.sql.contains("LIMIT $2"));
        assert_eq!(query.params, vec![SqlParam::Int(31), SqlParam::Int(10)]);
    }

    #[test]
    fn admin_list_sql_can_include_deleted() {
        let query = build_admin_list_sql(true, None, 10);
        assert!(!query.sql.contains("is_deleted"));
    }
}
