// Canned analytical reports — fixed SQL templates run through the cache gate.

use serde::Serialize;

/// A pre-built report: fixed SQL over the `products` table, no parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ReportDef {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub sql: &'static str,
}

/// Rating variability per category: how consistent are customer ratings
/// within each product category.
const VARIABILITY_SQL: &str = r#"
SELECT
    "categoryName" AS category,
    COUNT(*) AS number_of_products,
    ROUND(AVG(rating), 2) AS avg_rating,
    ROUND(STDDEV_SAMP(rating), 2) AS std_dev_rating,
    ROUND(VAR_SAMP(rating), 2) AS variance_rating
FROM products
WHERE rating IS NOT NULL AND rating > 0
GROUP BY category
HAVING COUNT(*) > 10
ORDER BY std_dev_rating DESC;
"#;

/// Z-score of each category's average rating against the overall mean.
const ZSCORE_SQL: &str = r#"
WITH category_stats AS (
    SELECT
        "categoryName" AS category,
        COUNT(*) as number_of_products,
        AVG(rating) AS avg_rating
    FROM products
    WHERE rating IS NOT NULL AND rating > 0
    GROUP BY category
    HAVING number_of_products > 10
),
overall_stats AS (
    SELECT
        AVG(rating) AS overall_avg_rating,
        STDDEV_SAMP(rating) AS overall_std_dev_rating
    FROM products
    WHERE rating IS NOT NULL AND rating > 0
)
SELECT
    cs.category,
    cs.number_of_products,
    ROUND(cs.avg_rating, 2) AS avg_rating,
    ROUND(
        (cs.avg_rating - os.overall_avg_rating) / NULLIF(os.overall_std_dev_rating, 0),
        2
    ) AS z_score
FROM category_stats cs, overall_stats os
ORDER BY z_score DESC;
"#;

pub const REPORTS: &[ReportDef] = &[
    ReportDef {
        name: "rating-variability",
        title: "Rating Variability by Category",
        description: "Standard deviation and variance of product ratings within each category.",
        sql: VARIABILITY_SQL,
    },
    ReportDef {
        name: "rating-zscore",
        title: "Category Ratings vs. Dataset Average (Z-Score)",
        description: "Categories performing significantly better or worse than the overall mean.",
        sql: ZSCORE_SQL,
    },
];

pub fn find(name: &str) -> Option<&'static ReportDef> {
    REPORTS.iter().find(|r| r.name == name)
}
