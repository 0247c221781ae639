use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use sqlx::PgPool;
use tokio::sync::Mutex;
use tracing::debug;

use super::strategy::{SelectionRule, SelectionThresholds};
use super::{clamp_item_limit, DomainError};
use crate::db::queries::{products, showcases, wishlists};
use crate::models::api::{ProductCard, ShowcaseView, ShowcaseWithItems};
use crate::models::records::{ProductRecord, VisibleShowcaseRow};

/// Build the storefront feed: every showcase whose own window and whose
/// hint are currently live, each filled with a fresh sample of sellable
/// products, ordered by hint priority.
#[tracing::instrument(skip(pool, thresholds), fields(viewer = viewer_id.unwrap_or("-")))]
pub async fn get_active_showcases(
    pool: &PgPool,
    thresholds: &SelectionThresholds,
    viewer_id: Option<&str>,
    item_limit: Option<i64>,
) -> Result<Vec<ShowcaseWithItems>, DomainError> {
    let now = Utc::now();
    let limit = clamp_item_limit(item_limit);

    // 1. Load the visible showcases with their hint metadata in one pass
    let visible = showcases::load_visible(pool, now).await?;
    if visible.is_empty() {
        return Ok(Vec::new());
    }

    // 2. The viewer's wishlist is read once and shared across sections
    let wishlist: HashSet<i64> = match viewer_id {
        Some(viewer) => wishlists::load_product_ids(pool, viewer)
            .await?
            .into_iter()
            .collect(),
        None => HashSet::new(),
    };

    // 3. Resolve sections concurrently. The shared id set keeps sections
    //    from repeating each other's products. It is advisory: two
    //    sections racing may both pick the same product, which costs a
    //    duplicate card and nothing else.
    let used_ids: Arc<Mutex<HashSet<i64>>> = Arc::new(Mutex::new(HashSet::new()));

    let resolved = join_all(visible.iter().map(|row| {
        let used_ids = used_ids.clone();
        let wishlist = &wishlist;
        async move { resolve_showcase(pool, row, thresholds, used_ids, wishlist, limit).await }
    }))
    .await;

    // 4. Keep priority order, drop sections that sampled nothing
    let mut sections = Vec::new();
    for result in resolved {
        let section = result?;
        if !section.items.is_empty() {
            sections.push(section);
        }
    }

    debug!("Serving {} showcase sections", sections.len());
    Ok(sections)
}

async fn resolve_showcase(
    pool: &PgPool,
    row: &VisibleShowcaseRow,
    thresholds: &SelectionThresholds,
    used_ids: Arc<Mutex<HashSet<i64>>>,
    wishlist: &HashSet<i64>,
    limit: i64,
) -> Result<ShowcaseWithItems, DomainError> {
    let rule = SelectionRule::for_hint(&row.type_hint, row.hint_is_system, thresholds);
    let threshold_tag = rand::random::<f64>();

    let exclude: Vec<i64> = { used_ids.lock().await.iter().copied().collect() };

    let picked = sample_fairly(pool, &rule, threshold_tag, &exclude, limit).await?;

    {
        let mut guard = used_ids.lock().await;
        guard.extend(picked.iter().map(|product| product.id));
    }

    let items = picked
        .iter()
        .map(|product| ProductCard::from_record(product, wishlist))
        .collect();

    Ok(ShowcaseWithItems {
        showcase: ShowcaseView::from_row(row),
        items,
    })
}

/// Two-sided scan around a uniform draw: rows tagged at or above the
/// draw come first, then the scan wraps below it if the section still
/// has room. Each product carries a pre-assigned uniform random_tag, so
/// every matching product has the same chance of appearing without the
/// database ever sorting the pool randomly.
async fn sample_fairly(
    pool: &PgPool,
    rule: &SelectionRule,
    threshold_tag: f64,
    exclude: &[i64],
    limit: i64,
) -> Result<Vec<ProductRecord>, DomainError> {
    let mut picked = products::sample(pool, rule, threshold_tag, true, exclude, limit).await?;

    if (picked.len() as i64) < limit {
        let mut exclude_low = exclude.to_vec();
        exclude_low.extend(picked.iter().map(|product| product.id));
        let remaining = limit - picked.len() as i64;
        let wrapped =
            products::sample(pool, rule, threshold_tag, false, &exclude_low, remaining).await?;
        picked.extend(wrapped);
    }

    Ok(picked)
}
