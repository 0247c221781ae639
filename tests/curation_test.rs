//! In-memory walk of the curator's sampling contract: the two-sided
//! scan over pre-assigned random tags must reach every matching
//! product, honor cross-section exclusions, and never pick outside the
//! selection rule.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use rust_decimal_macros::dec;
    use storefront_ranker::domain::strategy::{SelectionRule, SelectionThresholds};
    use storefront_ranker::models::records::ProductRecord;

    fn product(id: i64, random_tag: f64, view_count: i64, type_hint: Option<&str>) -> ProductRecord {
        ProductRecord {
            id,
            slug: format!("product-{}", id),
            name_en: format!("Product {}", id),
            name_ar: format!("منتج {}", id),
            description_en: None,
            description_ar: None,
            tags: vec![],
            category_id: None,
            sub_category_id: None,
            price: dec!(25),
            rating: None,
            type_hint: type_hint.map(str::to_string),
            is_active: true,
            is_deleted: false,
            available_count: 5,
            view_count,
            sell_count: 0,
            favorite_count: 0,
            weekly_view_count: 0,
            weekly_favorite_count: 0,
            weekly_score: dec!(0),
            random_tag,
            created_at: Utc::now(),
        }
    }

    fn sellable(record: &ProductRecord) -> bool {
        record.is_active && !record.is_deleted && record.available_count > 0
    }

    /// Mirrors the curator's two queries: rows tagged at or above the
    /// draw in ascending tag order, then a wrap below the draw for
    /// whatever room is left
    fn sample(
        pool: &[ProductRecord],
        rule: &SelectionRule,
        draw: f64,
        exclude: &HashSet<i64>,
        limit: usize,
    ) -> Vec<i64> {
        let mut above: Vec<&ProductRecord> = pool
            .iter()
            .filter(|p| sellable(p) && rule.matches(p))
            .filter(|p| p.random_tag >= draw && !exclude.contains(&p.id))
            .collect();
        above.sort_by(|a, b| a.random_tag.partial_cmp(&b.random_tag).unwrap());
        above.truncate(limit);

        let mut picked: Vec<i64> = above.iter().map(|p| p.id).collect();

        if picked.len() < limit {
            let taken: HashSet<i64> = picked.iter().copied().collect();
            let mut below: Vec<&ProductRecord> = pool
                .iter()
                .filter(|p| sellable(p) && rule.matches(p))
                .filter(|p| {
                    p.random_tag < draw && !exclude.contains(&p.id) && !taken.contains(&p.id)
                })
                .collect();
            below.sort_by(|a, b| a.random_tag.partial_cmp(&b.random_tag).unwrap());
            below.truncate(limit - picked.len());
            picked.extend(below.iter().map(|p| p.id));
        }

        picked
    }

    fn viewed_pool() -> Vec<ProductRecord> {
        (1..=9)
            .map(|id| product(id, id as f64 / 10.0, 500, None))
            .collect()
    }

    #[test]
    fn every_draw_reaches_the_whole_pool() {
        let pool = viewed_pool();
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        for draw in [0.0, 0.35, 0.85, 0.999] {
            let picked = sample(&pool, &rule, draw, &HashSet::new(), pool.len());
            let unique: HashSet<i64> = picked.iter().copied().collect();
            assert_eq!(unique.len(), pool.len(), "draw {} lost products", draw);
        }
    }

    #[test]
    fn uniform_draws_favor_no_part_of_the_tag_range() {
        let pool: Vec<ProductRecord> = (1..=10)
            .map(|id| product(id, id as f64 / 10.0 - 0.05, 500, None))
            .collect();
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        let trials = 1000;
        let mut hits = vec![0u32; pool.len() + 1];
        for i in 0..trials {
            let draw = (i as f64 + 0.5) / trials as f64;
            for id in sample(&pool, &rule, draw, &HashSet::new(), 3) {
                hits[id as usize] += 1;
            }
        }

        // Tags sit at 0.05, 0.15, .. 0.95, so a uniform sweep of draws
        // lands each product in exactly three of every ten sections
        for (id, count) in hits.iter().enumerate().skip(1) {
            assert_eq!(*count, 300, "product {} appeared {} times", id, count);
        }
    }

    #[test]
    fn high_draw_wraps_below_the_threshold() {
        let pool = viewed_pool();
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        // Only the 0.9 tag sits at or above the draw; the rest of the
        // section wraps around to the lowest tags
        let picked = sample(&pool, &rule, 0.85, &HashSet::new(), 3);
        assert_eq!(picked, vec![9, 1, 2]);
    }

    #[test]
    fn cross_section_exclusions_hold() {
        let pool = viewed_pool();
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        let mut used: HashSet<i64> = HashSet::new();

        let first = sample(&pool, &rule, 0.25, &used, 4);
        used.extend(first.iter().copied());
        let second = sample(&pool, &rule, 0.25, &used, 4);
        used.extend(second.iter().copied());

        let overlap: Vec<&i64> = first.iter().filter(|id| second.contains(id)).collect();
        assert!(overlap.is_empty(), "sections repeated {:?}", overlap);
        assert_eq!(first.len() + second.len(), 8);
    }

    #[test]
    fn rule_filters_are_never_bypassed() {
        let mut pool = viewed_pool();
        // Below the engagement floor and out of stock respectively
        pool.push(product(20, 0.55, 10, None));
        let mut dead = product(21, 0.6, 500, None);
        dead.available_count = 0;
        pool.push(dead);

        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        let picked = sample(&pool, &rule, 0.0, &HashSet::new(), pool.len());
        assert!(!picked.contains(&20));
        assert!(!picked.contains(&21));
    }

    #[test]
    fn tag_rule_sections_stay_on_their_tag() {
        let pool = vec![
            product(1, 0.2, 0, Some("summer_picks")),
            product(2, 0.4, 0, Some("summer_picks")),
            product(3, 0.6, 0, Some("ramadan")),
            product(4, 0.8, 0, None),
        ];
        let thresholds = SelectionThresholds::default();
        let rule = SelectionRule::for_hint("summer_picks", false, &thresholds);

        let picked = sample(&pool, &rule, 0.5, &HashSet::new(), 10);
        let unique: HashSet<i64> = picked.iter().copied().collect();
        assert_eq!(unique, HashSet::from([1, 2]));
    }

    #[test]
    fn section_size_does_not_depend_on_the_draw() {
        let pool = viewed_pool();
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        for draw in [0.0, 0.2, 0.5, 0.77, 0.95] {
            let picked = sample(&pool, &rule, draw, &HashSet::new(), 4);
            assert_eq!(picked.len(), 4, "draw {} changed the section size", draw);
        }
    }

    #[test]
    fn thin_pools_yield_short_sections() {
        let pool = vec![product(1, 0.3, 500, None), product(2, 0.7, 500, None)];
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 100,
        };

        let picked = sample(&pool, &rule, 0.5, &HashSet::new(), 10);
        assert_eq!(picked.len(), 2);
    }
}
