//! SalesForge: sales KPIs, ABC classification and RFM segmentation CLI
//!
//! Entry point that loads the sales export, runs the analysis stages and
//! writes the RFM table and charts.

use anyhow::Result;
use clap::Parser;
use salesforge::{logging, report, run_pipeline, Args};
use std::time::Instant;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let config = args.analysis_config()?;
    config.validate()?;

    if args.verbose {
        println!("SalesForge - Sales Analytics & RFM Segmentation");
        println!("================================================\n");
        println!("Input file: {}", config.input_path.display());
        println!("Output directory: {}", config.output_dir.display());
    }

    let start_time = Instant::now();
    let output = run_pipeline(&config, !args.skip_charts)?;
    let analysis = &output.analysis;

    report::print_summary(&analysis.kpis, &analysis.products, &analysis.rfm);

    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    println!("RFM table saved to: {}", config.rfm_csv_path().display());
    if !args.skip_charts {
        println!("Charts saved in: {}", config.output_dir.display());
    }

    Ok(())
}
