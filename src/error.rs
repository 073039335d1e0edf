//! Error types for the analytics pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Data frame error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Row {row}: unparseable sale date '{value}'")]
    InvalidDate { row: usize, value: String },

    #[error("Row {row}: invalid number '{value}' in field '{field}'")]
    InvalidNumber {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("No sales rows found in input")]
    EmptyDataset,

    #[error("Unknown segment: {0}")]
    UnknownSegment(String),

    #[error("Division by zero: total revenue is zero, revenue shares are undefined")]
    ZeroTotalRevenue,
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
