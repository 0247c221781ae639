pub mod api;
pub mod records;

pub use api::{
    PagedResult, ProductCard, ShowcaseDetail, ShowcaseDraft, ShowcaseView, ShowcaseWithItems,
    TypeHintView,
};
pub use records::{ProductRecord, ShowcaseRecord, TypeHintRecord, VisibleShowcaseRow};
