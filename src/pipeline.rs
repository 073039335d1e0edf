//! Stage orchestration: load, aggregate, classify, score, then write artifacts

use std::fs;
use std::time::Instant;

use anyhow::Context;
use tracing::info;

use crate::abc::{classify_products, ProductAggregate};
use crate::config::AnalysisConfig;
use crate::data::{load_sales, DataQualityReport, Transaction};
use crate::frame::sales_frame;
use crate::kpi::{compute_kpis, monthly_revenue, Kpis, MonthlyRevenue};
use crate::report::write_rfm_csv;
use crate::rfm::{compute_rfm, RfmAnalysis};
use crate::viz;

/// Results of the four analysis stages
#[derive(Debug, Clone, PartialEq)]
pub struct SalesAnalysis {
    pub kpis: Kpis,
    pub monthly: Vec<MonthlyRevenue>,
    pub products: Vec<ProductAggregate>,
    pub rfm: RfmAnalysis,
}

/// Everything a full run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub quality: DataQualityReport,
    pub analysis: SalesAnalysis,
}

/// Run the pure analysis stages over loaded transactions
pub fn analyze(
    transactions: &[Transaction],
    config: &AnalysisConfig,
) -> crate::error::Result<SalesAnalysis> {
    let sales = sales_frame(transactions)?;

    let kpis = compute_kpis(&sales)?;
    let monthly = monthly_revenue(&sales)?;
    info!(
        total_revenue = kpis.total_revenue,
        transactions = kpis.transactions,
        months = monthly.len(),
        "KPIs computed"
    );

    let products = classify_products(&sales, &config.abc)?;
    info!(products = products.len(), "ABC classification done");

    let rfm = compute_rfm(&sales, &config.rfm)?;
    info!(
        customers = rfm.customers.len(),
        recency = %rfm.strategies.recency,
        frequency = %rfm.strategies.frequency,
        monetary = %rfm.strategies.monetary,
        "RFM scoring done"
    );

    Ok(SalesAnalysis {
        kpis,
        monthly,
        products,
        rfm,
    })
}

/// Full run: load the export, analyze, and write the RFM table and charts
///
/// Existing files in the output directory are overwritten.
pub fn run_pipeline(config: &AnalysisConfig, render_charts: bool) -> crate::Result<PipelineOutput> {
    let start_time = Instant::now();

    let (transactions, quality) = load_sales(&config.input_path)
        .with_context(|| format!("Failed to load sales from {}", config.input_path.display()))?;
    quality.log();

    let analysis = analyze(&transactions, config)?;

    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;

    let csv_path = config.rfm_csv_path();
    write_rfm_csv(&csv_path, &analysis.rfm.customers)
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;
    info!(path = %csv_path.display(), "RFM table saved");

    if render_charts {
        viz::generate_charts(&analysis.monthly, &analysis.products, &analysis.rfm, config)?;
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Pipeline complete"
    );

    Ok(PipelineOutput { quality, analysis })
}
