// Domain layer - business logic with no HTTP concerns

pub mod cache;
pub mod curation;
pub mod reconciler;
pub mod registry;
pub mod search;
pub mod showcases;
pub mod strategy;

use crate::db::DatabaseError;

/// Hard ceiling on any paginated page, whatever the caller asks for
pub const MAX_PAGE_SIZE: i64 = 50;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Per-showcase item ceiling
pub const MAX_SHOWCASE_ITEMS: i64 = 20;
pub const DEFAULT_SHOWCASE_ITEMS: i64 = 10;

pub fn clamp_page_size(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

pub fn clamp_item_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_SHOWCASE_ITEMS)
        .clamp(1, MAX_SHOWCASE_ITEMS)
}

// Domain error type - no HTTP concerns
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<DatabaseError> for DomainError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound(msg) => DomainError::NotFound(msg),
            other => DomainError::Database(other.to_string()),
        }
    }
}

// Re-export commonly used types and functions
pub use curation::get_active_showcases;
pub use reconciler::{run_sweeps, SweepReport};
pub use search::{search_products, SearchRequest};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_clamps() {
        assert_eq!(clamp_page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(5)), 5);
        assert_eq!(clamp_page_size(Some(500)), MAX_PAGE_SIZE);
        assert_eq!(clamp_page_size(Some(0)), 1);
        assert_eq!(clamp_page_size(Some(-3)), 1);
    }

    #[test]
    fn item_limit_defaults_and_clamps() {
        assert_eq!(clamp_item_limit(None), DEFAULT_SHOWCASE_ITEMS);
        assert_eq!(clamp_item_limit(Some(15)), 15);
        assert_eq!(clamp_item_limit(Some(100)), MAX_SHOWCASE_ITEMS);
    }
}
