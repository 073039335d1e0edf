//! Polars view of the typed transactions shared by the aggregation stages

use polars::prelude::*;

use crate::data::Transaction;
use crate::error::Result;

pub const CUSTOMER: &str = "customer";
pub const CUSTOMER_KEY: &str = "customer_key";
pub const PRODUCT: &str = "product";
pub const PRODUCT_KEY: &str = "product_key";
pub const QUANTITY: &str = "quantity";
pub const TOTAL: &str = "total";
/// Sale timestamp as whole seconds since the Unix epoch
pub const SOLD_AT: &str = "sold_at";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";

/// Build the transaction frame
///
/// Missing customers, products, quantities and totals become nulls. The
/// `*_key` columns carry the numeric value of the id when every present id
/// in that column is a number, so grouped output can be sorted numerically.
pub fn sales_frame(transactions: &[Transaction]) -> Result<DataFrame> {
    let customers: Vec<Option<&str>> = transactions.iter().map(|t| t.customer.as_deref()).collect();
    let products: Vec<Option<&str>> = transactions.iter().map(|t| t.product.as_deref()).collect();

    let frame = df!(
        CUSTOMER => &customers,
        CUSTOMER_KEY => numeric_keys(&customers),
        PRODUCT => &products,
        PRODUCT_KEY => numeric_keys(&products),
        QUANTITY => transactions.iter().map(|t| t.quantity).collect::<Vec<Option<f64>>>(),
        TOTAL => transactions.iter().map(|t| t.total).collect::<Vec<Option<f64>>>(),
        SOLD_AT => transactions.iter().map(|t| t.sold_at.and_utc().timestamp()).collect::<Vec<i64>>(),
        YEAR => transactions.iter().map(|t| t.year_month().0).collect::<Vec<i32>>(),
        MONTH => transactions.iter().map(|t| t.year_month().1 as i32).collect::<Vec<i32>>()
    )?;

    Ok(frame)
}

/// Numeric sort keys for an id column, or all nulls if any id is not a number
fn numeric_keys(ids: &[Option<&str>]) -> Vec<Option<f64>> {
    let parsed: Vec<Option<f64>> = ids
        .iter()
        .map(|id| id.and_then(|text| text.parse::<f64>().ok()).filter(|key| key.is_finite()))
        .collect();
    let all_numeric = ids
        .iter()
        .zip(&parsed)
        .all(|(id, key)| id.is_none() || key.is_some());

    if all_numeric {
        parsed
    } else {
        vec![None; ids.len()]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::load_sales_from_reader;
    use crate::data::tests::HEADER;

    /// Load raw export lines and build their frame
    pub(crate) fn frame_from_lines(lines: &[String]) -> DataFrame {
        let mut text = HEADER.to_string();
        for line in lines {
            text.push('\n');
            text.push_str(line);
        }
        let (transactions, _) = load_sales_from_reader(text.as_bytes()).unwrap();
        sales_frame(&transactions).unwrap()
    }

    #[test]
    fn test_numeric_keys_only_when_every_id_is_numeric() {
        assert_eq!(
            numeric_keys(&[Some("10"), None, Some("2")]),
            vec![Some(10.0), None, Some(2.0)]
        );
        assert_eq!(numeric_keys(&[Some("10"), Some("C2")]), vec![None, None]);
    }

    #[test]
    fn test_sales_frame_keeps_missing_values_as_nulls() {
        let frame = frame_from_lines(&[
            "2024-01-05,1,1,C1,Soap,2,5,10,Cash,img.png,1,2024,Retail".to_string(),
            "2024-02-06,1,2,,Soap,1,,,Cash,img.png,2,2024,Retail".to_string(),
        ]);

        assert_eq!(frame.height(), 2);
        assert_eq!(frame.column(CUSTOMER).unwrap().null_count(), 1);
        assert_eq!(frame.column(TOTAL).unwrap().null_count(), 1);
        assert_eq!(frame.column(CUSTOMER_KEY).unwrap().null_count(), 2);

        let months: Vec<i32> = frame
            .column(MONTH)
            .unwrap()
            .i32()
            .unwrap()
            .into_no_null_iter()
            .collect();
        assert_eq!(months, vec![1, 2]);
    }
}
