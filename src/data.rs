//! Sales export loading, typing and calendar field derivation

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, Month, NaiveDate, NaiveDateTime, Weekday};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, Result};

/// Normalized names of the 13 positional columns of the sales export
pub const COLUMN_NAMES: [&str; 13] = [
    "Sale_Date",
    "Sale",
    "Sale_ID",
    "Customer",
    "Product",
    "Amount",
    "Price",
    "Total_Sale",
    "Pay",
    "Image",
    "Month",
    "Year",
    "Sale_Type",
];

const COL_DATE: usize = 0;
const COL_SALE_ID: usize = 2;
const COL_CUSTOMER: usize = 3;
const COL_PRODUCT: usize = 4;
const COL_AMOUNT: usize = 5;
const COL_PRICE: usize = 6;
const COL_TOTAL: usize = 7;
const COL_PAY: usize = 8;
const COL_SALE_TYPE: usize = 12;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// One typed sale line
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub sold_at: NaiveDateTime,
    pub sale_id: Option<String>,
    pub customer: Option<String>,
    pub product: Option<String>,
    /// Units sold (the export's `Amount` column)
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
    pub payment_method: Option<String>,
    pub sale_type: Option<String>,
    /// Derived from `sold_at`, e.g. "January"
    pub month_name: &'static str,
    /// Derived from `sold_at`, e.g. "Monday"
    pub weekday: &'static str,
}

impl Transaction {
    /// Calendar month key `(year, month)` used for monthly grouping
    pub fn year_month(&self) -> (i32, u32) {
        (self.sold_at.year(), self.sold_at.month())
    }
}

/// Advisory diagnostics gathered while loading
#[derive(Debug, Clone, PartialEq)]
pub struct DataQualityReport {
    pub row_count: usize,
    /// Missing (empty) value count per column, in `COLUMN_NAMES` order
    pub missing: Vec<(&'static str, usize)>,
    /// Rows identical to an earlier row across all columns
    pub duplicate_rows: usize,
}

impl DataQualityReport {
    pub fn total_missing(&self) -> usize {
        self.missing.iter().map(|(_, count)| count).sum()
    }

    /// Emit the diagnostics through the tracing subscriber
    pub fn log(&self) {
        info!(rows = self.row_count, "Loaded sales export");
        for (column, count) in &self.missing {
            if *count > 0 {
                warn!(column = *column, missing = *count, "Missing values");
            } else {
                debug!(column = *column, "No missing values");
            }
        }
        if self.duplicate_rows > 0 {
            warn!(duplicates = self.duplicate_rows, "Duplicate rows in export");
        } else {
            info!("No duplicate rows");
        }
    }
}

/// Load and type a sales export from a CSV file
///
/// # Arguments
/// * `file_path` - Path to the CSV export (13 positional columns, header row first)
///
/// # Returns
/// * Typed transactions plus a data quality report
pub fn load_sales(file_path: &Path) -> Result<(Vec<Transaction>, DataQualityReport)> {
    let file = File::open(file_path)?;
    load_sales_from_reader(file)
}

/// Load and type a sales export from any reader
///
/// Unparseable sale dates abort the load; they are never skipped. Empty cells
/// are only counted in the quality report.
pub fn load_sales_from_reader<R: Read>(reader: R) -> Result<(Vec<Transaction>, DataQualityReport)> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut missing = [0usize; COLUMN_NAMES.len()];
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut duplicate_rows = 0;
    let mut transactions = Vec::new();

    for (index, result) in csv_reader.records().enumerate() {
        // Header is line 1
        let row = index + 2;
        let record = result?;
        if record.len() != COLUMN_NAMES.len() {
            return Err(AnalyticsError::ColumnCount {
                row,
                expected: COLUMN_NAMES.len(),
                found: record.len(),
            });
        }

        for (column, value) in record.iter().enumerate() {
            if value.is_empty() {
                missing[column] += 1;
            }
        }

        let key: Vec<String> = record.iter().map(str::to_string).collect();
        if !seen.insert(key) {
            duplicate_rows += 1;
        }

        transactions.push(parse_record(&record, row)?);
    }

    if transactions.is_empty() {
        return Err(AnalyticsError::EmptyDataset);
    }

    let report = DataQualityReport {
        row_count: transactions.len(),
        missing: COLUMN_NAMES.iter().copied().zip(missing).collect(),
        duplicate_rows,
    };

    Ok((transactions, report))
}

fn parse_record(record: &StringRecord, row: usize) -> Result<Transaction> {
    let date_text = field(record, COL_DATE);
    let sold_at = date_text
        .and_then(parse_sale_datetime)
        .ok_or_else(|| AnalyticsError::InvalidDate {
            row,
            value: date_text.unwrap_or_default().to_string(),
        })?;

    Ok(Transaction {
        sold_at,
        sale_id: field(record, COL_SALE_ID).map(str::to_string),
        customer: field(record, COL_CUSTOMER).map(str::to_string),
        product: field(record, COL_PRODUCT).map(str::to_string),
        quantity: number(record, COL_AMOUNT, row)?,
        unit_price: number(record, COL_PRICE, row)?,
        total: number(record, COL_TOTAL, row)?,
        payment_method: field(record, COL_PAY).map(str::to_string),
        sale_type: field(record, COL_SALE_TYPE).map(str::to_string),
        month_name: month_name(sold_at.month()),
        weekday: weekday_name(sold_at.weekday()),
    })
}

fn field(record: &StringRecord, column: usize) -> Option<&str> {
    record.get(column).filter(|value| !value.is_empty())
}

/// Optional numeric cell; present but unparseable values are fatal
fn number(record: &StringRecord, column: usize, row: usize) -> Result<Option<f64>> {
    field(record, column)
        .map(|text| parse_number(text, column, row))
        .transpose()
}

fn parse_number(text: &str, column: usize, row: usize) -> Result<f64> {
    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| AnalyticsError::InvalidNumber {
            row,
            field: COLUMN_NAMES[column],
            value: text.to_string(),
        })
}

/// Parse a sale timestamp; date-only values are taken at midnight
pub fn parse_sale_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("Unknown")
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
