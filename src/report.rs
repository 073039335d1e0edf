//! RFM table persistence and the console summary

use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};

use crate::abc::{category_counts, ProductAggregate};
use crate::error::Result;
use crate::kpi::Kpis;
use crate::rfm::{CustomerRfm, RfmAnalysis};

/// Write the RFM table as CSV, replacing any previous file
///
/// Columns: Customer, Recency, Frequency, Monetary, R, F, M, Segment
pub fn write_rfm_csv(path: &Path, customers: &[CustomerRfm]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for customer in customers {
        writer.serialize(customer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back a table written by [`write_rfm_csv`]
pub fn read_rfm_csv(path: &Path) -> Result<Vec<CustomerRfm>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut customers = Vec::new();
    for result in reader.deserialize::<CustomerRfm>() {
        customers.push(result?);
    }
    Ok(customers)
}

/// Print KPIs, ABC tiers and segment distribution to stdout
pub fn print_summary(kpis: &Kpis, products: &[ProductAggregate], rfm: &RfmAnalysis) {
    println!("\n=== Business KPIs ===");
    println!("Total Sales: ${:.0}", kpis.total_revenue);
    println!("Transactions: {}", kpis.transactions);
    println!("Average Ticket: ${:.0}", kpis.average_ticket);
    println!("Unique Customers: {}", kpis.unique_customers);

    println!("\n=== ABC Classification ===");
    for (category, count) in category_counts(products) {
        let percentage = (count as f64 / products.len() as f64) * 100.0;
        println!("  Category {}: {} products ({:.1}%)", category, count, percentage);
    }

    println!("\n=== RFM Segments ===");
    println!("Reference date: {}", rfm.reference_date.date());
    let total_customers = rfm.customers.len();
    for (segment, count) in rfm.segment_counts() {
        let percentage = (count as f64 / total_customers as f64) * 100.0;
        println!("  {:10} | {:5} customers ({:.1}%)", segment.label(), count, percentage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfm::Segment;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn sample_rows() -> Vec<CustomerRfm> {
        vec![
            CustomerRfm {
                customer: "Hotel Plaza".to_string(),
                recency: 3,
                frequency: 12,
                monetary: 1520.75,
                r: 5,
                f: 5,
                m: 5,
                segment: Segment::Champions,
            },
            CustomerRfm {
                customer: "Corner Shop, Ltd".to_string(),
                recency: 140,
                frequency: 4,
                monetary: 99.1,
                r: 1,
                f: 3,
                m: 2,
                segment: Segment::AtRisk,
            },
        ]
    }

    #[test]
    fn test_rfm_csv_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfm_analysis.csv");
        let rows = sample_rows();

        write_rfm_csv(&path, &rows).unwrap();
        let read_back = read_rfm_csv(&path).unwrap();
        assert_eq!(read_back, rows);

        let pairs: BTreeSet<(String, Segment)> = read_back
            .into_iter()
            .map(|row| (row.customer, row.segment))
            .collect();
        assert!(pairs.contains(&("Corner Shop, Ltd".to_string(), Segment::AtRisk)));
    }

    #[test]
    fn test_rfm_csv_header_and_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rfm_analysis.csv");

        write_rfm_csv(&path, &sample_rows()).unwrap();
        write_rfm_csv(&path, &sample_rows()[..1]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Customer,Recency,Frequency,Monetary,R,F,M,Segment")
        );
        assert_eq!(lines.next(), Some("Hotel Plaza,3,12,1520.75,5,5,5,Champions"));
        assert_eq!(lines.next(), None);
    }
}
