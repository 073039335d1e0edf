//! Scalar business KPIs and the monthly revenue series

use polars::prelude::*;

use crate::error::{AnalyticsError, Result};
use crate::frame::{CUSTOMER, MONTH, TOTAL, YEAR};

const REVENUE: &str = "revenue";

#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub total_revenue: f64,
    pub transactions: usize,
    /// Mean `Total_Sale` over the transactions that have one
    pub average_ticket: f64,
    pub unique_customers: usize,
}

/// Revenue for one calendar month present in the data
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
}

impl MonthlyRevenue {
    /// Axis label such as "2024-03"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Compute the headline KPIs
///
/// Missing totals are skipped by the sum and the mean. Rows without a
/// customer still count as transactions but not towards unique customers.
pub fn compute_kpis(sales: &DataFrame) -> Result<Kpis> {
    if sales.height() == 0 {
        return Err(AnalyticsError::EmptyDataset);
    }

    let summary = sales
        .clone()
        .lazy()
        .select([
            col(TOTAL).sum().alias("total_revenue"),
            col(TOTAL).mean().alias("average_ticket"),
            col(CUSTOMER)
                .drop_nulls()
                .n_unique()
                .cast(DataType::Int64)
                .alias("unique_customers"),
        ])
        .collect()?;

    let total_revenue = summary.column("total_revenue")?.f64()?.get(0).unwrap_or(0.0);
    let average_ticket = summary.column("average_ticket")?.f64()?.get(0).unwrap_or(0.0);
    let unique_customers = summary.column("unique_customers")?.i64()?.get(0).unwrap_or(0);

    Ok(Kpis {
        total_revenue,
        transactions: sales.height(),
        average_ticket,
        unique_customers: unique_customers as usize,
    })
}

/// Sum revenue per calendar month, oldest first
///
/// Months without transactions are absent from the series, not zero-filled.
pub fn monthly_revenue(sales: &DataFrame) -> Result<Vec<MonthlyRevenue>> {
    let by_month = sales
        .clone()
        .lazy()
        .group_by([col(YEAR), col(MONTH)])
        .agg([col(TOTAL).sum().alias(REVENUE)])
        .sort([YEAR, MONTH], SortMultipleOptions::default())
        .collect()?;

    let years = by_month.column(YEAR)?.i32()?;
    let months = by_month.column(MONTH)?.i32()?;
    let revenue = by_month.column(REVENUE)?.f64()?;

    let series = years
        .into_no_null_iter()
        .zip(months.into_no_null_iter())
        .zip(revenue.into_iter())
        .map(|((year, month), revenue)| MonthlyRevenue {
            year,
            month: month as u32,
            revenue: revenue.unwrap_or(0.0),
        })
        .collect();

    Ok(series)
}
