use sqlx::PgPool;
use tracing::info;

use crate::db::errors::{DatabaseError, Result};
use crate::domain::strategy::SystemHint;

/// Ensure the built-in hints and their showcases exist. Runs on every
/// server boot; existing rows are left untouched, including any label
/// or priority edits operators have made since.
#[tracing::instrument(skip(pool))]
pub async fn seed_system_hints(pool: &PgPool) -> Result<()> {
    for hint in SystemHint::ALL {
        sqlx::query(
            "INSERT INTO merch_typehint \
                 (key, label_en, label_ar, priority, is_system, is_active, created_by, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, TRUE, TRUE, 'system', NOW(), NOW()) \
             ON CONFLICT (key) WHERE deleted_at IS NULL DO NOTHING",
        )
        .bind(hint.key())
        .bind(hint.default_label_en())
        .bind(hint.default_label_ar())
        .bind(hint.default_priority())
        .execute(pool)
        .await
        .map_err(DatabaseError::QueryError)?;

        sqlx::query(
            "INSERT INTO merch_showcase \
                 (type_hint, title_en, title_ar, show_all_text_en, show_all_text_ar, \
                  is_active, is_deleted, is_system, created_by, created_at, updated_at) \
             SELECT $1, $2, $3, 'Show All', 'عرض الكل', TRUE, FALSE, TRUE, 'system', NOW(), NOW() \
             WHERE NOT EXISTS \
                 (SELECT 1 FROM merch_showcase WHERE type_hint = $1 AND is_system = TRUE)",
        )
        .bind(hint.key())
        .bind(hint.default_label_en())
        .bind(hint.default_label_ar())
        .execute(pool)
        .await
        .map_err(DatabaseError::QueryError)?;
    }

    info!("System hints and showcases seeded");
    Ok(())
}
