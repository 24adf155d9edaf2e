//! Error types for the dashboard.
use serde::Serialize;
use thiserror::Error;

/// Fatal errors: the dashboard cannot render without its datasets or config.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse delimited text
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    /// A numeric column holds something that is not a number
    #[error("{path}: line {line}: column '{column}' is not numeric: {value:?}")]
    InvalidNumber {
        path: String,
        line: u64,
        column: String,
        value: String,
    },

    /// Area and production must be non-negative
    #[error("{path}: line {line}: column '{column}' is negative: {value}")]
    NegativeValue {
        path: String,
        line: u64,
        column: String,
        value: f64,
    },

    /// Filter bounds out of order
    #[error("Invalid year range: {min} > {max}")]
    InvalidYearRange { min: i32, max: i32 },

    /// Configuration could not be assembled
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// JSON export failed
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results using DashboardError
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Non-fatal "insufficient data" sentinel. Panels carrying one of these are
/// shown as an advisory instead of a chart.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataGap {
    /// A filter or group-by produced zero rows
    #[error("no data available for the current selection")]
    EmptyResult,

    /// A ratio had a zero (or undefined) denominator
    #[error("insufficient data: ratio is undefined (zero denominator)")]
    UndefinedRatio,
}
