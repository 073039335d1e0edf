//! Chart rendering with Plotters: trend, top-N bars, segment pie and Pareto

use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;
use tracing::info;

use crate::abc::ProductAggregate;
use crate::config::{
    AnalysisConfig, ChartSettings, MONTHLY_TREND_FILE, PARETO_FILE, SEGMENTS_FILE,
    TOP_CUSTOMERS_FILE, TOP_PRODUCTS_FILE,
};
use crate::kpi::MonthlyRevenue;
use crate::rfm::{RfmAnalysis, Segment};

/// Color palette for bars and pie slices
const PALETTE: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// Cumulative share marked on the Pareto chart
const PARETO_REFERENCE_PCT: f64 = 80.0;

/// Monthly revenue line with a marker per month
pub fn create_monthly_trend_chart(
    series: &[MonthlyRevenue],
    output_path: &Path,
    settings: &ChartSettings,
) -> crate::Result<()> {
    if series.is_empty() {
        anyhow::bail!("No monthly revenue to plot");
    }

    let labels: Vec<String> = series.iter().map(MonthlyRevenue::label).collect();
    let values: Vec<f64> = series.iter().map(|m| m.revenue).collect();
    let (y_min, y_max) = value_bounds(&values);

    let root = BitMapBackend::new(output_path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Monthly Sales Trend", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(index_range(labels.len()), y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&|x| category_label(&labels, *x))
        .y_desc("Sales ($)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let points: Vec<(f64, f64)> = values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect();
    chart.draw_series(LineSeries::new(points.clone(), PALETTE[0].stroke_width(2)))?;
    chart.draw_series(points.into_iter().map(|p| Circle::new(p, 5, PALETTE[0].filled())))?;

    root.present()?;
    info!(path = %output_path.display(), "Monthly trend chart saved");

    Ok(())
}

/// Horizontal bar chart, first entry drawn on top
pub fn create_horizontal_bar_chart(
    bars: &[(String, f64)],
    title: &str,
    x_desc: &str,
    output_path: &Path,
    settings: &ChartSettings,
) -> crate::Result<()> {
    if bars.is_empty() {
        anyhow::bail!("No bars to plot for '{}'", title);
    }

    // Reverse so the largest value sits at the top of the y axis
    let labels: Vec<String> = bars.iter().rev().map(|(name, _)| name.clone()).collect();
    let values: Vec<f64> = bars.iter().rev().map(|(_, value)| *value).collect();
    let (x_min, x_max) = value_bounds(&values);

    let root = BitMapBackend::new(output_path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(160)
        .build_cartesian_2d(x_min..x_max, index_range(labels.len()))?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(labels.len())
        .y_label_formatter(&|y| category_label(&labels, *y))
        .x_desc(x_desc)
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &value)| {
        let y = i as f64;
        Rectangle::new([(0.0, y - 0.4), (value, y + 0.4)], PALETTE[0].filled())
    }))?;

    root.present()?;
    info!(path = %output_path.display(), title, "Bar chart saved");

    Ok(())
}

/// Pie of customer counts per RFM segment, with percentages
pub fn create_segment_pie_chart(
    counts: &[(Segment, usize)],
    output_path: &Path,
    settings: &ChartSettings,
) -> crate::Result<()> {
    if counts.is_empty() {
        anyhow::bail!("No segments to plot");
    }

    let sizes: Vec<f64> = counts.iter().map(|(_, count)| *count as f64).collect();
    let labels: Vec<&str> = counts.iter().map(|(segment, _)| segment.label()).collect();
    let colors: Vec<RGBColor> = (0..counts.len()).map(|i| PALETTE[i % PALETTE.len()]).collect();

    let root = BitMapBackend::new(output_path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Customer Segmentation (RFM)", ("sans-serif", 30))?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
    pie.percentages(("sans-serif", 16).into_font().color(&WHITE));
    area.draw(&pie)?;

    root.present()?;
    info!(path = %output_path.display(), "Segment distribution chart saved");

    Ok(())
}

/// Revenue bars per product with cumulative share on a secondary axis
pub fn create_pareto_chart(
    products: &[ProductAggregate],
    output_path: &Path,
    settings: &ChartSettings,
) -> crate::Result<()> {
    if products.is_empty() {
        anyhow::bail!("No products to plot");
    }

    let revenues: Vec<f64> = products.iter().map(|p| p.revenue).collect();
    let (y_min, y_max) = value_bounds(&revenues);
    let x_range = index_range(products.len());

    let root = BitMapBackend::new(output_path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Pareto Analysis - Products", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .right_y_label_area_size(60)
        .build_cartesian_2d(x_range.clone(), y_min..y_max)?
        .set_secondary_coord(x_range.clone(), 0f64..105f64);

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Product rank")
        .y_desc("Revenue ($)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc("Cumulative %")
        .draw()?;

    chart.draw_series(revenues.iter().enumerate().map(|(i, &revenue)| {
        let x = i as f64;
        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, revenue)], PALETTE[0].filled())
    }))?;

    chart
        .draw_secondary_series(LineSeries::new(
            products
                .iter()
                .enumerate()
                .map(|(i, p)| (i as f64, p.cumulative_pct)),
            RED.stroke_width(2),
        ))?
        .label("Cumulative %")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .draw_secondary_series(dashed_segments(x_range.start, x_range.end, PARETO_REFERENCE_PCT))?
        .label(format!("{}% reference", PARETO_REFERENCE_PCT))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    info!(path = %output_path.display(), "Pareto chart saved");

    Ok(())
}

/// Render all five charts into the configured output directory
pub fn generate_charts(
    monthly: &[MonthlyRevenue],
    products: &[ProductAggregate],
    rfm: &RfmAnalysis,
    config: &AnalysisConfig,
) -> crate::Result<()> {
    let dir = &config.output_dir;
    let settings = &config.charts;

    create_monthly_trend_chart(monthly, &dir.join(MONTHLY_TREND_FILE), settings)?;

    let top_customers = top_n(
        rfm.customers.iter().map(|c| (c.customer.clone(), c.monetary)),
        settings.top_n,
    );
    create_horizontal_bar_chart(
        &top_customers,
        &format!("Top {} Customers by Revenue", settings.top_n),
        "Revenue ($)",
        &dir.join(TOP_CUSTOMERS_FILE),
        settings,
    )?;

    create_segment_pie_chart(&rfm.segment_counts(), &dir.join(SEGMENTS_FILE), settings)?;

    let top_products = top_n(
        products.iter().map(|p| (p.product.clone(), p.revenue)),
        settings.top_n,
    );
    create_horizontal_bar_chart(
        &top_products,
        &format!("Top {} Products by Revenue", settings.top_n),
        "Revenue ($)",
        &dir.join(TOP_PRODUCTS_FILE),
        settings,
    )?;

    create_pareto_chart(products, &dir.join(PARETO_FILE), settings)?;

    Ok(())
}

/// First `n` entries of an already sorted iterator
fn top_n(items: impl Iterator<Item = (String, f64)>, n: usize) -> Vec<(String, f64)> {
    items.take(n).collect()
}

/// Index axis with half a slot of padding on each side
fn index_range(len: usize) -> std::ops::Range<f64> {
    -0.5..(len as f64 - 0.5)
}

/// Axis bounds that always include zero, padded 10% above the largest value
fn value_bounds(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(0.0, f64::min);
    let max = values.iter().copied().fold(0.0, f64::max);
    let upper = if max > 0.0 { max * 1.1 } else { 1.0 };
    let lower = if min < 0.0 { min * 1.1 } else { 0.0 };
    (lower, upper)
}

/// Label for an index-axis tick; blank between categories
fn category_label(labels: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Horizontal dashed line from `start` to `end` at height `y`
fn dashed_segments(start: f64, end: f64, y: f64) -> Vec<PathElement<(f64, f64)>> {
    let dash = 0.125;
    (0u32..)
        .map(|k| start + f64::from(k) * dash * 2.0)
        .take_while(|&x| x < end)
        .map(|x| PathElement::new(vec![(x, y), ((x + dash).min(end), y)], BLACK.stroke_width(2)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label_only_on_whole_indices() {
        let labels = vec!["2024-01".to_string(), "2024-02".to_string()];
        assert_eq!(category_label(&labels, 0.0), "2024-01");
        assert_eq!(category_label(&labels, 1.0), "2024-02");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn test_value_bounds_include_zero() {
        let (lower, upper) = value_bounds(&[10.0, 50.0]);
        assert_eq!(lower, 0.0);
        assert!((upper - 55.0).abs() < 1e-9);
        assert_eq!(value_bounds(&[0.0]), (0.0, 1.0));
        let (lower, upper) = value_bounds(&[-10.0, 20.0]);
        assert!(lower < -10.0);
        assert!(upper > 20.0);
    }

    #[test]
    fn test_top_n_truncates_in_order() {
        let items = vec![
            ("a".to_string(), 3.0),
            ("b".to_string(), 2.0),
            ("c".to_string(), 1.0),
        ];
        let top = top_n(items.clone().into_iter(), 2);
        assert_eq!(top, items[..2].to_vec());
        assert_eq!(top_n(items.clone().into_iter(), 10).len(), 3);
    }

    #[test]
    fn test_dashed_segments_cover_range() {
        let segments = dashed_segments(-0.5, 2.5, 80.0);
        // 3.0 wide range with a 0.25 dash period
        assert_eq!(segments.len(), 12);
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ChartSettings::default();
        assert!(create_monthly_trend_chart(&[], &dir.path().join("t.png"), &settings).is_err());
        assert!(create_pareto_chart(&[], &dir.path().join("p.png"), &settings).is_err());
        assert!(create_segment_pie_chart(&[], &dir.path().join("s.png"), &settings).is_err());
        assert!(
            create_horizontal_bar_chart(&[], "Empty", "x", &dir.path().join("b.png"), &settings).is_err()
        );
    }
}
