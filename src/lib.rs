//! SalesForge: descriptive sales analytics and RFM customer segmentation
//!
//! This library loads a sales export, computes business KPIs and a monthly
//! revenue series, classifies products into ABC tiers, and scores customers
//! on Recency, Frequency and Monetary value to assign segments.

pub mod abc;
pub mod binning;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod frame;
pub mod kpi;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod rfm;
pub mod viz;

// Re-export public items for easier access
pub use abc::{classify_products, AbcCategory, ProductAggregate};
pub use binning::{score_with_fallback, stable_ranks, ScoreOutcome, Strategy};
pub use cli::Args;
pub use config::AnalysisConfig;
pub use data::{load_sales, load_sales_from_reader, DataQualityReport, Transaction};
pub use error::AnalyticsError;
pub use frame::sales_frame;
pub use kpi::{compute_kpis, monthly_revenue, Kpis, MonthlyRevenue};
pub use pipeline::{analyze, run_pipeline, PipelineOutput, SalesAnalysis};
pub use report::{read_rfm_csv, write_rfm_csv};
pub use rfm::{compute_rfm, CustomerRfm, RfmAnalysis, Segment};

/// Result type for the CLI-facing layers (pipeline, charts)
pub type Result<T> = anyhow::Result<T>;
