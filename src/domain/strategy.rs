use crate::models::records::ProductRecord;

/// The built-in ranking hints. These exist from bootstrap, are flagged
/// system in merch_typehint, and cannot be toggled or deleted through
/// the admin API. Everything else in the taxonomy is an admin-defined
/// tag hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemHint {
    BestSellers,
    MostViewed,
    MostFavorited,
    Trending,
}

impl SystemHint {
    pub const ALL: [SystemHint; 4] = [
        SystemHint::BestSellers,
        SystemHint::MostViewed,
        SystemHint::MostFavorited,
        SystemHint::Trending,
    ];

    pub fn from_key(key: &str) -> Option<SystemHint> {
        match key {
            "best_sellers" => Some(SystemHint::BestSellers),
            "most_viewed" => Some(SystemHint::MostViewed),
            "most_favorited" => Some(SystemHint::MostFavorited),
            "trending" => Some(SystemHint::Trending),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SystemHint::BestSellers => "best_sellers",
            SystemHint::MostViewed => "most_viewed",
            SystemHint::MostFavorited => "most_favorited",
            SystemHint::Trending => "trending",
        }
    }

    pub fn default_label_en(&self) -> &'static str {
        match self {
            SystemHint::BestSellers => "Best Sellers",
            SystemHint::MostViewed => "Most Viewed",
            SystemHint::MostFavorited => "Most Favorited",
            SystemHint::Trending => "Trending Now",
        }
    }

    pub fn default_label_ar(&self) -> &'static str {
        match self {
            SystemHint::BestSellers => "الأكثر مبيعاً",
            SystemHint::MostViewed => "الأكثر مشاهدة",
            SystemHint::MostFavorited => "الأكثر تفضيلاً",
            SystemHint::Trending => "الرائج الآن",
        }
    }

    /// Position of the section on the storefront, lower renders first
    pub fn default_priority(&self) -> i32 {
        match self {
            SystemHint::BestSellers => 10,
            SystemHint::MostViewed => 20,
            SystemHint::MostFavorited => 30,
            SystemHint::Trending => 40,
        }
    }

    /// Column the minimum-engagement filter applies to
    pub fn metric_column(&self) -> &'static str {
        match self {
            SystemHint::BestSellers => "sell_count",
            SystemHint::MostViewed => "view_count",
            SystemHint::MostFavorited => "favorite_count",
            SystemHint::Trending => "weekly_favorite_count",
        }
    }

    /// Sort keys for ranked search under this hint, most significant
    /// first. The query builder appends the id tiebreak.
    pub fn sort_keys(&self) -> &'static [&'static str] {
        match self {
            SystemHint::BestSellers => &["sell_count DESC"],
            SystemHint::MostViewed => &["view_count DESC"],
            SystemHint::MostFavorited => &["favorite_count DESC"],
            SystemHint::Trending => &[
                "weekly_score DESC",
                "weekly_favorite_count DESC",
                "weekly_view_count DESC",
            ],
        }
    }

    pub fn threshold(&self, thresholds: &SelectionThresholds) -> i64 {
        match self {
            SystemHint::BestSellers => thresholds.min_sell_count,
            SystemHint::MostViewed => thresholds.min_view_count,
            SystemHint::MostFavorited => thresholds.min_favorite_count,
            SystemHint::Trending => thresholds.min_weekly_favorite_count,
        }
    }

    pub fn selection_rule(&self, thresholds: &SelectionThresholds) -> SelectionRule {
        SelectionRule::MetricAtLeast {
            column: self.metric_column(),
            threshold: self.threshold(thresholds),
        }
    }
}

/// Minimum engagement a product needs before a system section will
/// surface it. Injected so operating environments and tests can tune
/// the floors without touching the selection logic.
#[derive(Debug, Clone)]
pub struct SelectionThresholds {
    pub min_sell_count: i64,
    pub min_view_count: i64,
    pub min_favorite_count: i64,
    pub min_weekly_favorite_count: i64,
}

impl Default for SelectionThresholds {
    fn default() -> Self {
        SelectionThresholds {
            min_sell_count: 10,
            min_view_count: 100,
            min_favorite_count: 25,
            min_weekly_favorite_count: 5,
        }
    }
}

/// How a hint narrows the product pool. System hints filter on an
/// engagement metric; admin hints match the product's assigned tag.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionRule {
    MetricAtLeast {
        column: &'static str,
        threshold: i64,
    },
    TagEquals {
        key: String,
    },
}

impl SelectionRule {
    /// Resolve the rule for a hint. The is_system flag comes from the
    /// registry row; a row flagged system with an unrecognized key falls
    /// back to tag matching rather than guessing a metric.
    pub fn for_hint(key: &str, is_system: bool, thresholds: &SelectionThresholds) -> SelectionRule {
        match SystemHint::from_key(key) {
            Some(hint) if is_system => hint.selection_rule(thresholds),
            _ => SelectionRule::TagEquals {
                key: key.to_string(),
            },
        }
    }

    /// In-process check that a product satisfies this rule. The store
    /// applies the same predicate in SQL; this form backs validations
    /// and tests that already hold the row.
    pub fn matches(&self, record: &ProductRecord) -> bool {
        match self {
            SelectionRule::MetricAtLeast { column, threshold } => {
                let value = match *column {
                    "sell_count" => record.sell_count,
                    "view_count" => record.view_count,
                    "favorite_count" => record.favorite_count,
                    "weekly_favorite_count" => record.weekly_favorite_count,
                    _ => return false,
                };
                value >= *threshold
            }
            SelectionRule::TagEquals { key } => record.type_hint.as_deref() == Some(key.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn product_with_views(view_count: i64) -> ProductRecord {
        ProductRecord {
            id: 1,
            slug: "sample".to_string(),
            name_en: "Sample".to_string(),
            name_ar: "عينة".to_string(),
            description_en: None,
            description_ar: None,
            tags: vec![],
            category_id: None,
            sub_category_id: None,
            price: dec!(10),
            rating: None,
            type_hint: Some("summer_picks".to_string()),
            is_active: true,
            is_deleted: false,
            available_count: 3,
            view_count,
            sell_count: 0,
            favorite_count: 0,
            weekly_view_count: 0,
            weekly_favorite_count: 0,
            weekly_score: dec!(0),
            random_tag: 0.5,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keys_round_trip() {
        for hint in SystemHint::ALL {
            assert_eq!(SystemHint::from_key(hint.key()), Some(hint));
        }
        assert_eq!(SystemHint::from_key("summer_picks"), None);
    }

    #[test]
    fn system_hint_resolves_to_metric_rule() {
        let thresholds = SelectionThresholds::default();
        let rule = SelectionRule::for_hint("best_sellers", true, &thresholds);
        assert_eq!(
            rule,
            SelectionRule::MetricAtLeast {
                column: "sell_count",
                threshold: thresholds.min_sell_count,
            }
        );
    }

    #[test]
    fn admin_hint_resolves_to_tag_rule() {
        let thresholds = SelectionThresholds::default();
        let rule = SelectionRule::for_hint("summer_picks", false, &thresholds);
        assert_eq!(
            rule,
            SelectionRule::TagEquals {
                key: "summer_picks".to_string(),
            }
        );
    }

    #[test]
    fn system_key_without_system_flag_matches_as_tag() {
        let thresholds = SelectionThresholds::default();
        let rule = SelectionRule::for_hint("trending", false, &thresholds);
        assert_eq!(
            rule,
            SelectionRule::TagEquals {
                key: "trending".to_string(),
            }
        );
    }

    #[test]
    fn metric_threshold_admits_and_excludes() {
        let rule = SelectionRule::MetricAtLeast {
            column: "view_count",
            threshold: 10,
        };
        assert!(rule.matches(&product_with_views(15)));
        assert!(!rule.matches(&product_with_views(5)));
    }

    #[test]
    fn tag_rule_matches_assigned_hint_only() {
        let rule = SelectionRule::TagEquals {
            key: "summer_picks".to_string(),
        };
        assert!(rule.matches(&product_with_views(0)));

        let rule = SelectionRule::TagEquals {
            key: "winter_picks".to_string(),
        };
        assert!(!rule.matches(&product_with_views(0)));
    }

    #[test]
    fn trending_sorts_by_weekly_signals() {
        assert_eq!(
            SystemHint::Trending.sort_keys(),
            &[
                "weekly_score DESC",
                "weekly_favorite_count DESC",
                "weekly_view_count DESC",
            ]
        );
        assert_eq!(SystemHint::BestSellers.sort_keys(), &["sell_count DESC"]);
    }
}
