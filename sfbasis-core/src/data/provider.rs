//! Market-data provider trait, the multi-level response frame, and structured errors.
//!
//! The `MarketDataProvider` trait abstracts over data sources (an HTTP bridge to
//! the terminal's historical-data service, a synthetic generator) so the pull
//! stage can swap implementations and tests can run without a network.

use crate::table::{DateTable, TableColumn};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("response format changed: {0}")]
    ResponseFormat(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Historical data as returned by a provider: a date index and two-level
/// `(ticker, field)` column headers. `rows[i][j]` is the value of column `j`
/// on `index[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoricalFrame {
    pub index: Vec<NaiveDate>,
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl HistoricalFrame {
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// Flatten `(ticker, field)` headers into `"{ticker}_{field}"` columns.
    ///
    /// An empty frame flattens to an empty table.
    pub fn flatten(self) -> Result<DateTable, DataError> {
        if self.is_empty() {
            return Ok(DateTable::empty());
        }
        if self.rows.len() != self.index.len() {
            return Err(DataError::ResponseFormat(format!(
                "{} rows for {} index entries",
                self.rows.len(),
                self.index.len()
            )));
        }

        let width = self.columns.len();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(self.index.len()); width];
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(DataError::ResponseFormat(format!(
                    "row {i} has {} values for {width} columns",
                    row.len()
                )));
            }
            for (j, cell) in row.iter().enumerate() {
                values[j].push(*cell);
            }
        }

        let columns = self
            .columns
            .iter()
            .zip(values)
            .map(|((ticker, field), v)| TableColumn::new(format!("{ticker}_{field}"), v))
            .collect();

        DateTable::from_columns(self.index, columns)
    }
}

/// Where a table came from. Recorded in the metadata sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    MarketData,
    Synthetic,
    Derived,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            DataSource::MarketData => "market_data",
            DataSource::Synthetic => "synthetic",
            DataSource::Derived => "derived",
        }
    }
}

/// Trait for market-data providers.
///
/// A provider answers one historical request for a set of tickers and fields
/// over an inclusive date range. Failures propagate as-is: there is no retry.
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Where tables produced from this provider should be recorded as coming from.
    fn source(&self) -> DataSource;

    /// Fetch daily history for every `(ticker, field)` pair.
    fn historical(
        &self,
        tickers: &[String],
        fields: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalFrame, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn flatten_joins_ticker_and_field() {
        let frame = HistoricalFrame {
            index: vec![d(2), d(3)],
            columns: vec![
                ("USGG2YR Index".into(), "PX_LAST".into()),
                ("USGG5YR Index".into(), "PX_LAST".into()),
            ],
            rows: vec![vec![Some(4.5), Some(4.1)], vec![Some(4.6), None]],
        };

        let table = frame.flatten().unwrap();
        assert_eq!(
            table.column_names(),
            vec!["USGG2YR Index_PX_LAST", "USGG5YR Index_PX_LAST"]
        );
        assert_eq!(table.column("USGG2YR Index_PX_LAST").unwrap(), &[Some(4.5), Some(4.6)]);
        assert_eq!(table.column("USGG5YR Index_PX_LAST").unwrap(), &[Some(4.1), None]);
    }

    #[test]
    fn empty_frame_flattens_to_empty_table() {
        let table = HistoricalFrame::default().flatten().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.width(), 0);
    }

    #[test]
    fn ragged_rows_are_a_format_error() {
        let frame = HistoricalFrame {
            index: vec![d(2)],
            columns: vec![("A".into(), "PX_LAST".into()), ("B".into(), "PX_LAST".into())],
            rows: vec![vec![Some(1.0)]],
        };
        assert!(matches!(frame.flatten(), Err(DataError::ResponseFormat(_))));
    }

    #[test]
    fn file_not_found_names_the_path() {
        let err = DataError::FileNotFound {
            path: PathBuf::from("/tmp/_data/sf_rates.parquet"),
        };
        assert!(err.to_string().contains("sf_rates.parquet"));
    }
}
