use sqlx::{PgPool, Row};
use tracing::debug;

use crate::db::errors::{DatabaseError, Result};

/// Product ids the viewer has wishlisted. Loaded once per storefront
/// request to annotate every returned card.
#[tracing::instrument(skip(pool), fields(user_id = %user_id))]
pub async fn load_product_ids(pool: &PgPool, user_id: &str) -> Result<Vec<i64>> {
    let rows = sqlx::query("SELECT product_id FROM catalog_wishlistitem WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DatabaseError::QueryError)?;

    let ids = rows
        .iter()
        .map(|row| row.try_get::<i64, _>(0).map_err(DatabaseError::QueryError))
        .collect::<Result<Vec<i64>>>()?;

    debug!("Viewer has {} wishlisted products", ids.len());
    Ok(ids)
}
