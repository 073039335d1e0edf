//! RFM (Recency, Frequency, Monetary) scoring and customer segmentation

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binning::{
    score_with_fallback, stable_ranks, Strategy, ASCENDING_LABELS, DESCENDING_LABELS,
};
use crate::config::RfmSettings;
use crate::error::{AnalyticsError, Result};
use crate::frame::{CUSTOMER, CUSTOMER_KEY, SOLD_AT, TOTAL};

const SECONDS_PER_DAY: i64 = 86_400;

/// Customer segment derived from the R, F and M scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Champions,
    Loyal,
    Potential,
    #[serde(rename = "At Risk")]
    AtRisk,
    Lost,
    Occasional,
}

impl Segment {
    pub const ALL: [Segment; 6] = [
        Segment::Champions,
        Segment::Loyal,
        Segment::Potential,
        Segment::AtRisk,
        Segment::Lost,
        Segment::Occasional,
    ];

    /// Segment rules, first match wins
    pub fn from_scores(r: u8, f: u8, m: u8) -> Self {
        if r >= 4 && f >= 4 && m >= 4 {
            Segment::Champions
        } else if f >= 4 && m >= 4 {
            Segment::Loyal
        } else if r >= 4 && f <= 2 {
            Segment::Potential
        } else if r <= 2 && f >= 3 {
            Segment::AtRisk
        } else if r <= 2 && f <= 2 {
            Segment::Lost
        } else {
            Segment::Occasional
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Champions => "Champions",
            Segment::Loyal => "Loyal",
            Segment::Potential => "Potential",
            Segment::AtRisk => "At Risk",
            Segment::Lost => "Lost",
            Segment::Occasional => "Occasional",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Segment {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Segment::ALL
            .into_iter()
            .find(|segment| segment.label() == s)
            .ok_or_else(|| AnalyticsError::UnknownSegment(s.to_string()))
    }
}

/// One row of the RFM table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRfm {
    #[serde(rename = "Customer")]
    pub customer: String,
    /// Days between the reference date and the last purchase
    #[serde(rename = "Recency")]
    pub recency: i64,
    #[serde(rename = "Frequency")]
    pub frequency: usize,
    #[serde(rename = "Monetary")]
    pub monetary: f64,
    #[serde(rename = "R")]
    pub r: u8,
    #[serde(rename = "F")]
    pub f: u8,
    #[serde(rename = "M")]
    pub m: u8,
    #[serde(rename = "Segment")]
    pub segment: Segment,
}

/// Strategy used for each of the three score columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringStrategies {
    pub recency: Strategy,
    pub frequency: Strategy,
    pub monetary: Strategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RfmAnalysis {
    /// Latest sale plus one day
    pub reference_date: NaiveDateTime,
    /// Sorted by monetary value, highest first
    pub customers: Vec<CustomerRfm>,
    pub strategies: ScoringStrategies,
}

impl RfmAnalysis {
    /// Customer count per segment, most common first
    pub fn segment_counts(&self) -> Vec<(Segment, usize)> {
        let mut counts: Vec<(Segment, usize)> = Segment::ALL
            .into_iter()
            .map(|segment| {
                let count = self.customers.iter().filter(|c| c.segment == segment).count();
                (segment, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }
}

/// Compute per-customer RFM metrics, scores and segments
///
/// Rows without a customer are left out of the per-customer table but still
/// set the reference date.
///
/// # Arguments
/// * `sales` - Transaction frame
/// * `settings` - Scoring settings (neutral fallback score)
///
/// # Returns
/// * `RfmAnalysis` with exactly one record per customer
pub fn compute_rfm(sales: &DataFrame, settings: &RfmSettings) -> Result<RfmAnalysis> {
    let latest = sales
        .column(SOLD_AT)?
        .i64()?
        .max()
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
        .ok_or(AnalyticsError::EmptyDataset)?
        .naive_utc();
    let reference_date = latest + Duration::days(1);
    let reference_seconds = reference_date.and_utc().timestamp();

    let grouped = sales
        .clone()
        .lazy()
        .filter(col(CUSTOMER).is_not_null())
        .group_by([col(CUSTOMER)])
        .agg([
            col(CUSTOMER_KEY).first(),
            col(SOLD_AT).max().alias("last_purchase"),
            len().cast(DataType::Int64).alias("frequency"),
            col(TOTAL).sum().alias("monetary"),
        ])
        .sort([CUSTOMER_KEY, CUSTOMER], SortMultipleOptions::default())
        .collect()?;

    let names: Vec<&str> = grouped.column(CUSTOMER)?.str()?.into_no_null_iter().collect();
    let recency: Vec<i64> = grouped
        .column("last_purchase")?
        .i64()?
        .into_no_null_iter()
        .map(|last| (reference_seconds - last) / SECONDS_PER_DAY)
        .collect();
    let frequency: Vec<usize> = grouped
        .column("frequency")?
        .i64()?
        .into_no_null_iter()
        .map(|count| count as usize)
        .collect();
    let monetary: Vec<f64> = grouped
        .column("monetary")?
        .f64()?
        .into_iter()
        .map(|total| total.unwrap_or(0.0))
        .collect();

    let frequency_values: Vec<f64> = frequency.iter().map(|&count| count as f64).collect();
    let recency_values: Vec<f64> = recency.iter().map(|&days| days as f64).collect();
    let neutral = settings.neutral_score;
    let r_outcome = score_with_fallback(&recency_values, &DESCENDING_LABELS, neutral);
    let f_outcome = score_with_fallback(&stable_ranks(&frequency_values), &ASCENDING_LABELS, neutral);
    let m_outcome = score_with_fallback(&stable_ranks(&monetary), &ASCENDING_LABELS, neutral);

    let strategies = ScoringStrategies {
        recency: r_outcome.strategy(),
        frequency: f_outcome.strategy(),
        monetary: m_outcome.strategy(),
    };
    debug!(?strategies, customers = names.len(), "RFM scores assigned");

    let r_scores = r_outcome.into_scores();
    let f_scores = f_outcome.into_scores();
    let m_scores = m_outcome.into_scores();

    let mut customers: Vec<CustomerRfm> = names
        .into_iter()
        .enumerate()
        .map(|(i, customer)| {
            let (r, f, m) = (r_scores[i], f_scores[i], m_scores[i]);
            CustomerRfm {
                customer: customer.to_string(),
                recency: recency[i],
                frequency: frequency[i],
                monetary: monetary[i],
                r,
                f,
                m,
                segment: Segment::from_scores(r, f, m),
            }
        })
        .collect();

    customers.sort_by(|a, b| b.monetary.total_cmp(&a.monetary));

    Ok(RfmAnalysis {
        reference_date,
        customers,
        strategies,
    })
}
