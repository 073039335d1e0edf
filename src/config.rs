//! Analysis configuration: paths, thresholds and chart settings

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AnalyticsError, Result};

pub const RFM_CSV_FILE: &str = "rfm_analysis.csv";
pub const MONTHLY_TREND_FILE: &str = "1_monthly_sales_trend.png";
pub const TOP_CUSTOMERS_FILE: &str = "2_top_customers.png";
pub const SEGMENTS_FILE: &str = "3_rfm_segments_distribution.png";
pub const TOP_PRODUCTS_FILE: &str = "4_top_products.png";
pub const PARETO_FILE: &str = "5_pareto_products.png";

/// Cumulative revenue share limits for the A and B tiers, in percent
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AbcThresholds {
    pub a_max_pct: f64,
    pub b_max_pct: f64,
}

impl Default for AbcThresholds {
    fn default() -> Self {
        Self {
            a_max_pct: 80.0,
            b_max_pct: 95.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RfmSettings {
    /// Score given when neither quantile nor equal-width binning can place a value
    pub neutral_score: u8,
}

impl Default for RfmSettings {
    fn default() -> Self {
        Self { neutral_score: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub width: u32,
    pub height: u32,
    /// Number of customers/products shown in the top-N bar charts
    pub top_n: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            top_n: 10,
        }
    }
}

/// Everything a pipeline run needs, passed explicitly to each stage
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub abc: AbcThresholds,
    pub rfm: RfmSettings,
    pub charts: ChartSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/bclean_sales.csv"),
            output_dir: PathBuf::from("results"),
            abc: AbcThresholds::default(),
            rfm: RfmSettings::default(),
            charts: ChartSettings::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let (a_max_pct, b_max_pct) = (self.abc.a_max_pct, self.abc.b_max_pct);
        if !(a_max_pct > 0.0 && a_max_pct <= b_max_pct && b_max_pct <= 100.0) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "ABC thresholds must satisfy 0 < a <= b <= 100, got a={} b={}",
                a_max_pct, b_max_pct
            )));
        }
        if !(1..=5).contains(&self.rfm.neutral_score) {
            return Err(AnalyticsError::InvalidConfig(format!(
                "neutral RFM score must be within 1..=5, got {}",
                self.rfm.neutral_score
            )));
        }
        if self.charts.width == 0 || self.charts.height == 0 || self.charts.top_n == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "chart dimensions and top_n must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rfm_csv_path(&self) -> PathBuf {
        self.output_dir.join(RFM_CSV_FILE)
    }
}
