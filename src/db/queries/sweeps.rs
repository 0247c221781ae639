use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::db::errors::Result;
use crate::db::sql::{SqlParam, SqlQuery};

/// Deactivate every active row in `table` whose end_date has passed.
/// The predicate only matches still-active rows, so a second run over
/// the same data writes nothing.
pub fn build_expiry_sql(table: &str, now: DateTime<Utc>) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let n = query.push(SqlParam::Timestamp(now));
    query.sql = format!(
        "UPDATE {} \
         SET is_active = FALSE, updated_by = 'system', status_reason = 'window_elapsed', \
             updated_at = NOW() \
         WHERE is_active = TRUE AND end_date IS NOT NULL AND end_date < ${}",
        table, n
    );
    query
}

#[tracing::instrument(skip(pool), fields(table = %table))]
pub async fn expire_rows(pool: &PgPool, table: &str, now: DateTime<Utc>) -> Result<u64> {
    let affected = build_expiry_sql(table, now).execute(pool).await?;

    if affected > 0 {
        info!("Expired {} rows in {}", affected, table);
    } else {
        debug!("No lapsed rows in {}", table);
    }
    Ok(affected)
}

/// Deactivate still-active showcases whose type hint has gone inactive
/// or been deleted. One statement, no read-then-write window.
pub fn build_cascade_sql() -> SqlQuery {
    SqlQuery::new(
        "UPDATE merch_showcase s \
         SET is_active = FALSE, updated_by = 'system', status_reason = 'type_hint_inactive', \
             updated_at = NOW() \
         FROM merch_typehint t \
         WHERE t.key = s.type_hint AND s.is_active = TRUE \
             AND (t.is_active = FALSE OR t.deleted_at IS NOT NULL)",
    )
}

#[tracing::instrument(skip(pool))]
pub async fn cascade_showcases(pool: &PgPool) -> Result<u64> {
    let affected = build_cascade_sql().execute(pool).await?;

    if affected > 0 {
        info!("Cascade-deactivated {} showcases", affected);
    } else {
        debug!("No orphaned showcases");
    }
    Ok(affected)
}
