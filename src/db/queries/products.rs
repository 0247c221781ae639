use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::debug;

use crate::db::errors::Result;
use crate::db::sql::{escape_like, SqlParam, SqlQuery};
use crate::domain::strategy::SelectionRule;
use crate::models::records::ProductRecord;

const PRODUCT_COLUMNS: &str = "id, slug, name_en, name_ar, description_en, description_ar, tags, \
     category_id, sub_category_id, price, rating, type_hint, is_active, is_deleted, \
     available_count, view_count, sell_count, favorite_count, weekly_view_count, \
     weekly_favorite_count, weekly_score, random_tag, created_at";

/// Products a showcase may surface: live, in stock, and passing the
/// hint's selection rule
fn sellable_conditions() -> Vec<String> {
    vec![
        "is_active = TRUE".to_string(),
        "is_deleted = FALSE".to_string(),
        "available_count > 0".to_string(),
    ]
}

fn push_rule(query: &mut SqlQuery, conditions: &mut Vec<String>, rule: &SelectionRule) {
    match rule {
        SelectionRule::MetricAtLeast { column, threshold } => {
            let n = query.push(SqlParam::Int(*threshold));
            conditions.push(format!("{} >= ${}", column, n));
        }
        SelectionRule::TagEquals { key } => {
            let n = query.push(SqlParam::Text(key.clone()));
            conditions.push(format!("type_hint = ${}", n));
        }
    }
}

/// One side of the random_tag scan. `above` selects rows at or past the
/// drawn threshold; the backfill pass runs with `above = false` and the
/// ids already taken in `exclude`. Both sides scan the random_tag index
/// in ascending order, so no shuffle or OFFSET is ever needed.
pub fn build_sample_sql(
    rule: &SelectionRule,
    threshold_tag: f64,
    above: bool,
    exclude: &[i64],
    limit: i64,
) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let mut conditions = sellable_conditions();

    push_rule(&mut query, &mut conditions, rule);

    let tag = query.push(SqlParam::Float(threshold_tag));
    if above {
        conditions.push(format!("random_tag >= ${}", tag));
    } else {
        conditions.push(format!("random_tag < ${}", tag));
    }

    if !exclude.is_empty() {
        let n = query.push(SqlParam::IdList(exclude.to_vec()));
        conditions.push(format!("NOT (id = ANY(${}))", n));
    }

    let lim = query.push(SqlParam::Int(limit));
    query.sql = format!(
        "SELECT {} FROM catalog_product WHERE {} ORDER BY random_tag ASC LIMIT ${}",
        PRODUCT_COLUMNS,
        conditions.join(" AND "),
        lim
    );
    query
}

#[tracing::instrument(skip(pool, rule, exclude), fields(above = above, limit = limit))]
pub async fn sample(
    pool: &PgPool,
    rule: &SelectionRule,
    threshold_tag: f64,
    above: bool,
    exclude: &[i64],
    limit: i64,
) -> Result<Vec<ProductRecord>> {
    let query = build_sample_sql(rule, threshold_tag, above, exclude, limit);
    let records = query.fetch_all::<ProductRecord>(pool).await?;

    debug!("Sampled {} products (above={})", records.len(), above);
    Ok(records)
}

/// How many products currently satisfy a hint's selection rule. Used to
/// refuse showcases that would render empty.
pub fn build_count_sql(rule: &SelectionRule) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let mut conditions = sellable_conditions();
    push_rule(&mut query, &mut conditions, rule);

    query.sql = format!(
        "SELECT COUNT(*) FROM catalog_product WHERE {}",
        conditions.join(" AND ")
    );
    query
}

#[tracing::instrument(skip(pool, rule))]
pub async fn count_matching(pool: &PgPool, rule: &SelectionRule) -> Result<i64> {
    let query = build_count_sql(rule);
    let count = query.fetch_count(pool).await?;

    debug!("{} products match selection rule", count);
    Ok(count)
}

/// Inputs for one ranked-search page, already validated and clamped by
/// the caller. `rule` carries the tag filter for admin hints; system
/// hints contribute `order` keys instead of a filter. The id tiebreak
/// is always appended, which is also what makes the cursor work.
#[derive(Debug, Clone, Default)]
pub struct ProductSearchSql<'a> {
    pub term: Option<&'a str>,
    pub rule: Option<&'a SelectionRule>,
    pub order: &'a [&'static str],
    pub category_id: Option<i64>,
    pub sub_category_id: Option<i64>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<Decimal>,
    pub max_rating: Option<Decimal>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub cursor: Option<i64>,
    pub limit: i64,
}

pub fn build_search_sql(args: &ProductSearchSql) -> SqlQuery {
    let mut query = SqlQuery::new("");
    let mut conditions = vec![
        "is_active = TRUE".to_string(),
        "is_deleted = FALSE".to_string(),
    ];

    if let Some(term) = args.term {
        let n = query.push(SqlParam::Text(format!("%{}%", escape_like(term))));
        conditions.push(format!(
            "(name_en ILIKE ${0} OR name_ar ILIKE ${0} OR description_en ILIKE ${0} \
             OR description_ar ILIKE ${0} OR slug ILIKE ${0} \
             OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ${0}))",
            n
        ));
    }

    if let Some(rule) = args.rule {
        push_rule(&mut query, &mut conditions, rule);
    }

    if let Some(category_id) = args.category_id {
        let n = query.push(SqlParam::Int(category_id));
        conditions.push(format!("category_id = ${}", n));
    }

    if let Some(sub_category_id) = args.sub_category_id {
        let n = query.push(SqlParam::Int(sub_category_id));
        conditions.push(format!("sub_category_id = ${}", n));
    }

    if let Some(min_price) = args.min_price {
        let n = query.push(SqlParam::Number(min_price));
        conditions.push(format!("price >= ${}", n));
    }

    if let Some(max_price) = args.max_price {
        let n = query.push(SqlParam::Number(max_price));
        conditions.push(format!("price <= ${}", n));
    }

    if let Some(min_rating) = args.min_rating {
        let n = query.push(SqlParam::Number(min_rating));
        conditions.push(format!("rating >= ${}", n));
    }

    if let Some(max_rating) = args.max_rating {
        let n = query.push(SqlParam::Number(max_rating));
        conditions.push(format!("rating <= ${}", n));
    }

    if let Some(created_after) = args.created_after {
        let n = query.push(SqlParam::Timestamp(created_after));
        conditions.push(format!("created_at >= ${}", n));
    }

    if let Some(created_before) = args.created_before {
        let n = query.push(SqlParam::Timestamp(created_before));
        conditions.push(format!("created_at <= ${}", n));
    }

    if let Some(cursor) = args.cursor {
        let n = query.push(SqlParam::Int(cursor));
        conditions.push(format!("id < ${}", n));
    }

    let mut order_keys: Vec<&str> = args.order.to_vec();
    order_keys.push("id DESC");

    let lim = query.push(SqlParam::Int(args.limit));
    query.sql = format!(
        "SELECT {} FROM catalog_product WHERE {} ORDER BY {} LIMIT ${}",
        PRODUCT_COLUMNS,
        conditions.join(" AND "),
        order_keys.join(", "),
        lim
    );
    query
}

#[tracing::instrument(skip(pool, args))]
pub async fn search(pool: &PgPool, args: &ProductSearchSql<'_>) -> Result<Vec<ProductRecord>> {
    let query = build_search_sql(args);
    let records = query.fetch_all::<ProductRecord>(pool).await?;

    debug!("Search returned {} products", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::SystemHint;
    use rust_decimal_macros::dec;

    fn metric_rule() -> SelectionRule {
        SelectionRule::MetricAtLeast {
            column: "sell_count",
            threshold: 10,
        }
    }

    fn tag_rule() -> SelectionRule {
        SelectionRule::TagEquals {
            key: "summer_picks".to_string(),
        }
    }

    #[test]
    fn sample_sql_scans_upward_from_threshold() {
        let query = build_sample_sql(&metric_rule(), 0.37, true, &[], 10);

        assert!(query.sql.contains("is_active = TRUE"));
        assert!(query.sql.contains("is_deleted = FALSE"));
        assert!(query.sql.contains("available_count > 0"));
        assert!(query.sql.contains("sell_count >= $1"));
        assert!(query.sql.contains("random_tag >= $2"));
        assert!(query.sql.contains("ORDER BY random_tag ASC LIMIT $3"));
        assert!(!query.sql.contains("ANY"));
        assert_eq!(
            query.params,
            vec![
                SqlParam::Int(10),
                SqlParam::Float(0.37),
                SqlParam::Int(10),
            ]
        );
    }

    #[test]
    fn sample_sql_backfill_takes_lower_band_and_excludes_taken_ids() {
        let query = build_sample_sql(&tag_rule(), 0.9, false, &[4, 8], 5);

        assert!(query.sql.contains("type_hint = $1"));
        assert!(query.sql.contains("random_tag < $2"));
        assert!(query.sql.contains("NOT (id = ANY($3))"));
        assert!(query.sql.contains("LIMIT $4"));
        assert_eq!(
            query.params,
            vec![
                SqlParam::Text("summer_picks".to_string()),
                SqlParam::Float(0.9),
                SqlParam::IdList(vec![4, 8]),
                SqlParam::Int(5),
            ]
        );
    }

    #[test]
    fn count_sql_applies_rule_over_sellable_products() {
        let query = build_count_sql(&metric_rule());

        assert!(query.sql.starts_with("SELECT COUNT(*) FROM catalog_product"));
        assert!(query.sql.contains("available_count > 0"));
        assert!(query.sql.contains("sell_count >= $1"));
        assert_eq!(query.params, vec![SqlParam::Int(10)]);
    }

    #[test]
    fn search_sql_term_spans_names_descriptions_slug_and_tags() {
        let args = ProductSearchSql {
            term: Some("mug"),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);

        assert!(query.sql.contains("name_en ILIKE $1"));
        assert!(query.sql.contains("name_ar ILIKE $1"));
        assert!(query.sql.contains("description_en ILIKE $1"));
        assert!(query.sql.contains("description_ar ILIKE $1"));
        assert!(query.sql.contains("slug ILIKE $1"));
        assert!(query.sql.contains("unnest(tags) AS tag WHERE tag ILIKE $1"));
        assert!(query.sql.contains("ORDER BY id DESC LIMIT $2"));
        assert_eq!(query.params[0], SqlParam::Text("%mug%".to_string()));
    }

    #[test]
    fn search_sql_escapes_like_wildcards() {
        let args = ProductSearchSql {
            term: Some("100%_cotton"),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);

        assert_eq!(
            query.params[0],
            SqlParam::Text("%100\\%\\_cotton%".to_string())
        );
    }

    #[test]
    fn search_sql_availability_is_not_filtered() {
        let args = ProductSearchSql {
            term: Some("mug"),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);
        assert!(!query.sql.contains("available_count"));
    }

    #[test]
    fn search_sql_metric_sort_keeps_cursor_filter() {
        let args = ProductSearchSql {
            order: SystemHint::Trending.sort_keys(),
            cursor: Some(500),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);

        assert!(query.sql.contains("id < $1"));
        assert!(query.sql.contains(
            "ORDER BY weekly_score DESC, weekly_favorite_count DESC, weekly_view_count DESC, id DESC"
        ));
        assert_eq!(query.params, vec![SqlParam::Int(500), SqlParam::Int(20)]);
    }

    #[test]
    fn search_sql_admin_hint_filters_by_tag_with_default_order() {
        let rule = tag_rule();
        let args = ProductSearchSql {
            rule: Some(&rule),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);

        assert!(query.sql.contains("type_hint = $1"));
        assert!(query.sql.contains("ORDER BY id DESC LIMIT $2"));
    }

    #[test]
    fn search_sql_filters_compose_conjunctively() {
        let args = ProductSearchSql {
            term: Some("mug"),
            category_id: Some(3),
            min_price: Some(dec!(5)),
            max_price: Some(dec!(50)),
            min_rating: Some(dec!(3.5)),
            limit: 20,
            ..Default::default()
        };
        let query = build_search_sql(&args);

        assert!(query.sql.contains("category_id = $2"));
        assert!(query.sql.contains("price >= $3"));
        assert!(query.sql.contains("price <= $4"));
        assert!(query.sql.contains("rating >= $5"));
        assert_eq!(query.sql.matches(" AND ").count(), 6);
    }
}
