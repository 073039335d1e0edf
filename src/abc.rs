//! ABC product classification by cumulative revenue share

use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use crate::config::AbcThresholds;
use crate::error::{AnalyticsError, Result};
use crate::frame::{PRODUCT, PRODUCT_KEY, QUANTITY, TOTAL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AbcCategory {
    A,
    B,
    C,
}

impl AbcCategory {
    pub const ALL: [AbcCategory; 3] = [AbcCategory::A, AbcCategory::B, AbcCategory::C];

    /// Category for a cumulative revenue percentage
    pub fn from_cumulative_pct(cumulative_pct: f64, thresholds: &AbcThresholds) -> Self {
        if cumulative_pct <= thresholds.a_max_pct {
            AbcCategory::A
        } else if cumulative_pct <= thresholds.b_max_pct {
            AbcCategory::B
        } else {
            AbcCategory::C
        }
    }
}

impl fmt::Display for AbcCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AbcCategory::A => "A",
            AbcCategory::B => "B",
            AbcCategory::C => "C",
        };
        f.write_str(label)
    }
}

/// Per-product revenue aggregate with its ABC tier
#[derive(Debug, Clone, PartialEq)]
pub struct ProductAggregate {
    pub product: String,
    pub num_sales: usize,
    pub units_sold: f64,
    pub revenue: f64,
    pub revenue_pct: f64,
    pub cumulative_pct: f64,
    pub category: AbcCategory,
}

struct ProductTotals<'a> {
    product: &'a str,
    num_sales: usize,
    units_sold: f64,
    revenue: f64,
}

/// Aggregate sales per product and assign ABC categories
///
/// Products come back sorted by revenue, highest first. Equal revenues keep
/// ascending product order since the sort is stable. Rows without a product
/// are left out.
///
/// # Errors
/// * `ZeroTotalRevenue` when revenue shares would divide by zero
pub fn classify_products(
    sales: &DataFrame,
    thresholds: &AbcThresholds,
) -> Result<Vec<ProductAggregate>> {
    let grouped = sales
        .clone()
        .lazy()
        .filter(col(PRODUCT).is_not_null())
        .group_by([col(PRODUCT)])
        .agg([
            col(PRODUCT_KEY).first(),
            len().cast(DataType::Int64).alias("num_sales"),
            col(QUANTITY).sum().alias("units_sold"),
            col(TOTAL).sum().alias("revenue"),
        ])
        .sort([PRODUCT_KEY, PRODUCT], SortMultipleOptions::default())
        .collect()?;

    let names = grouped.column(PRODUCT)?.str()?;
    let num_sales = grouped.column("num_sales")?.i64()?;
    let units_sold = grouped.column("units_sold")?.f64()?;
    let revenue = grouped.column("revenue")?.f64()?;

    let mut ranked: Vec<ProductTotals> = names
        .into_no_null_iter()
        .zip(num_sales.into_no_null_iter())
        .zip(units_sold.into_iter().zip(revenue.into_iter()))
        .map(|((product, num_sales), (units_sold, revenue))| ProductTotals {
            product,
            num_sales: num_sales as usize,
            units_sold: units_sold.unwrap_or(0.0),
            revenue: revenue.unwrap_or(0.0),
        })
        .collect();
    ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));

    let total_revenue: f64 = ranked.iter().map(|t| t.revenue).sum();
    if total_revenue == 0.0 {
        return Err(AnalyticsError::ZeroTotalRevenue);
    }

    let mut cumulative_pct = 0.0;
    let products = ranked
        .into_iter()
        .map(|t| {
            let revenue_pct = t.revenue / total_revenue * 100.0;
            cumulative_pct += revenue_pct;
            ProductAggregate {
                product: t.product.to_string(),
                num_sales: t.num_sales,
                units_sold: t.units_sold,
                revenue: t.revenue,
                revenue_pct,
                cumulative_pct,
                category: AbcCategory::from_cumulative_pct(cumulative_pct, thresholds),
            }
        })
        .collect();

    Ok(products)
}

/// Number of products per category, in A, B, C order
pub fn category_counts(products: &[ProductAggregate]) -> [(AbcCategory, usize); 3] {
    AbcCategory::ALL.map(|category| {
        let count = products.iter().filter(|p| p.category == category).count();
        (category, count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::sale_line;
    use crate::frame::tests::frame_from_lines;

    fn transactions(sales: &[(&str, f64)]) -> DataFrame {
        let lines: Vec<String> = sales
            .iter()
            .enumerate()
            .map(|(i, (product, total))| sale_line("2024-01-10", i as u32, "C1", product, 1.0, *total))
            .collect();
        frame_from_lines(&lines)
    }

    #[test]
    fn test_classification_thresholds() {
        let data = transactions(&[
            ("P1", 50.0),
            ("P2", 30.0),
            ("P3", 10.0),
            ("P4", 5.0),
            ("P5", 3.0),
            ("P6", 2.0),
        ]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();

        let names: Vec<&str> = products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["P1", "P2", "P3", "P4", "P5", "P6"]);

        let categories: Vec<AbcCategory> = products.iter().map(|p| p.category).collect();
        use AbcCategory::*;
        // cumulative: 50, 80, 90, 95, 98, 100
        assert_eq!(categories, vec![A, A, B, B, C, C]);
        assert_eq!(
            category_counts(&products),
            [(A, 2), (B, 2), (C, 2)]
        );
    }

    #[test]
    fn test_aggregates_per_product() {
        let data = transactions(&[("Soap", 10.0), ("Bleach", 40.0), ("Soap", 15.0)]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].product, "Bleach");
        assert_eq!(products[0].num_sales, 1);
        assert_eq!(products[1].product, "Soap");
        assert_eq!(products[1].num_sales, 2);
        assert_eq!(products[1].units_sold, 2.0);
        assert_eq!(products[1].revenue, 25.0);
    }

    #[test]
    fn test_shares_sum_to_100_and_cumulative_is_monotonic() {
        let data = transactions(&[
            ("P1", 13.7),
            ("P2", 99.1),
            ("P3", 0.4),
            ("P4", 41.0),
            ("P5", 41.0),
            ("P6", 7.3),
            ("P7", 250.25),
        ]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();

        let share_sum: f64 = products.iter().map(|p| p.revenue_pct).sum();
        assert!((share_sum - 100.0).abs() < 1e-9);
        assert!(products
            .windows(2)
            .all(|w| w[1].cumulative_pct >= w[0].cumulative_pct));
        assert!((products.last().unwrap().cumulative_pct - 100.0).abs() < 1e-9);

        for product in &products {
            let expected = AbcCategory::from_cumulative_pct(product.cumulative_pct, &AbcThresholds::default());
            assert_eq!(product.category, expected);
        }
    }

    #[test]
    fn test_equal_revenue_keeps_product_order() {
        let data = transactions(&[("Zeta", 10.0), ("Alpha", 10.0), ("Mid", 10.0)]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_numeric_product_ids_keep_numeric_order() {
        let data = transactions(&[("10", 10.0), ("9", 10.0), ("100", 10.0)]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();
        let names: Vec<&str> = products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["9", "10", "100"]);
    }

    #[test]
    fn test_rows_without_product_are_left_out() {
        let data = frame_from_lines(&[
            sale_line("2024-01-10", 1, "C1", "Soap", 2.0, 10.0),
            "2024-01-11,1,2,C1,,1,30,30,Cash,img.png,1,2024,Retail".to_string(),
            "2024-01-12,1,3,C2,Soap,,,,Cash,img.png,1,2024,Retail".to_string(),
        ]);
        let products = classify_products(&data, &AbcThresholds::default()).unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product, "Soap");
        assert_eq!(products[0].num_sales, 2);
        assert_eq!(products[0].units_sold, 2.0);
        assert_eq!(products[0].revenue, 10.0);
        assert_eq!(products[0].revenue_pct, 100.0);
    }

    #[test]
    fn test_zero_total_revenue_is_an_error() {
        let data = transactions(&[("P1", 0.0), ("P2", 0.0)]);
        let result = classify_products(&data, &AbcThresholds::default());
        assert!(matches!(result, Err(AnalyticsError::ZeroTotalRevenue)));
    }
}
