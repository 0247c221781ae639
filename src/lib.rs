pub mod api;
pub mod db;
pub mod domain;
pub mod models;

// Re-export commonly used types
pub use models::{
    PagedResult, ProductCard, ShowcaseView, ShowcaseWithItems, TypeHintView,
};

pub use db::{init_pool, get_pool, with_retry, DatabaseError};

pub use domain::{
    cache::HintCache,
    strategy::{SelectionRule, SelectionThresholds, SystemHint},
    DomainError,
};
