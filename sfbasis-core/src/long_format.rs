//! Long-format `(unique_id, ds, y)` basis records and the wide ↔ long reshape.

use crate::data::store::{TableStore, LONG_BASIS_FILE};
use crate::data::{DataError, DataSource};
use crate::table::{DateTable, TableColumn};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use tracing::info;

/// One observation of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    /// Series identifier, e.g. `Treasury_SF_10Y`.
    pub unique_id: String,
    /// Observation date.
    pub ds: NaiveDate,
    /// Value in basis points.
    pub y: f64,
}

/// Melt a wide table into records, one per non-missing cell, ordered by
/// column then date.
pub fn to_long(wide: &DateTable) -> Vec<LongRecord> {
    let mut records = Vec::new();
    for column in wide.columns() {
        for (date, value) in wide.dates().iter().zip(&column.values) {
            if let Some(y) = value {
                records.push(LongRecord {
                    unique_id: column.name.clone(),
                    ds: *date,
                    y: *y,
                });
            }
        }
    }
    records
}

/// Pivot records back to a wide table: dates are the sorted union, columns
/// are the sorted unique ids. A repeated `(unique_id, ds)` pair is an error.
pub fn from_long(records: &[LongRecord]) -> Result<DateTable, DataError> {
    let dates: BTreeSet<NaiveDate> = records.iter().map(|r| r.ds).collect();
    let dates: Vec<NaiveDate> = dates.into_iter().collect();
    let row_of: HashMap<NaiveDate, usize> = dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

    let mut series: BTreeMap<&str, Vec<Option<f64>>> = BTreeMap::new();
    for record in records {
        let values = series
            .entry(record.unique_id.as_str())
            .or_insert_with(|| vec![None; dates.len()]);
        let row = row_of[&record.ds];
        if values[row].is_some() {
            return Err(DataError::Validation(format!(
                "duplicate observation for '{}' on {}",
                record.unique_id, record.ds
            )));
        }
        values[row] = Some(record.y);
    }

    let columns = series
        .into_iter()
        .map(|(name, values)| TableColumn::new(name, values))
        .collect();
    DateTable::from_columns(dates, columns)
}

/// Reshape the wide basis table and persist it as `ftsfr_treasury_sf_basis.parquet`.
pub fn save_long_basis(basis: &DateTable, store: &TableStore) -> Result<PathBuf, DataError> {
    let records = to_long(basis);
    let path = store.write_long(LONG_BASIS_FILE, &records, DataSource::Derived)?;
    info!(records = records.len(), "saved {LONG_BASIS_FILE}");
    Ok(path)
}
