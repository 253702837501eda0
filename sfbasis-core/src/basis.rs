//! Treasury-SF basis calculator.
//!
//! Basis = (Treasury yield − SOFR OIS rate) × 100, in basis points, per tenor.
//!
//! Pipeline: load both rate tables → [`prepare_data`] (rename to canonical
//! `{tenor}_{source}` columns, inner join on date) → optional truncation at an
//! end date → [`compute_basis`] → keep the basis columns → forward fill.

use crate::data::store::{TableStore, BASIS_DATE_COLUMN, BASIS_FILE};
use crate::data::{DataError, DataSource};
use crate::table::DateTable;
use crate::tenor::{RateSource, Tenor, PX_LAST};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{debug, info};

/// Percentage points to basis points.
pub const BPS_PER_PERCENT: f64 = 100.0;

/// Rename raw provider columns (`USGG2YR Index_PX_LAST`) to canonical
/// `{tenor}_{source}` names. Columns that are not `PX_LAST` fields or whose
/// ticker is not in the source's lookup table are dropped.
pub fn normalize_columns(table: DateTable, source: RateSource) -> DateTable {
    let marker = format!("_{PX_LAST}");
    table.rename_columns(|name| {
        if !name.contains(&marker) {
            return None;
        }
        let ticker = name.split_whitespace().next()?;
        source
            .tenor_for_ticker(ticker)
            .map(|tenor| tenor.rate_column(source))
    })
}

/// Normalize both inputs and align them on the dates they share.
pub fn prepare_data(treasury: DateTable, sf: DateTable) -> Result<DateTable, DataError> {
    let treasury = normalize_columns(treasury, RateSource::Treasury);
    let sf = normalize_columns(sf, RateSource::Sf);
    debug!(
        treasury_columns = treasury.width(),
        sf_columns = sf.width(),
        "normalized rate columns"
    );
    treasury.inner_join(&sf)
}

/// Append a `Treasury_SF_{tenor}` column for every tenor with both rate columns.
/// Tenors missing either side are skipped.
pub fn compute_basis(mut merged: DateTable) -> Result<DateTable, DataError> {
    for tenor in Tenor::ALL {
        let (Some(treasury), Some(sf)) = (
            merged.column(&tenor.rate_column(RateSource::Treasury)),
            merged.column(&tenor.rate_column(RateSource::Sf)),
        ) else {
            continue;
        };

        let basis: Vec<Option<f64>> = treasury
            .iter()
            .zip(sf)
            .map(|(t, s)| match (t, s) {
                (Some(t), Some(s)) => Some((t - s) * BPS_PER_PERCENT),
                _ => None,
            })
            .collect();

        merged.push_column(tenor.basis_column(), basis)?;
    }
    Ok(merged)
}

/// Basis column names in tenor order.
pub fn basis_columns() -> Vec<String> {
    Tenor::ALL.iter().map(|t| t.basis_column()).collect()
}

/// Compute the forward-filled basis table from the two raw rate tables.
pub fn basis_from_rates(
    treasury: DateTable,
    sf: DateTable,
    end_date: Option<NaiveDate>,
) -> Result<DateTable, DataError> {
    let mut merged = prepare_data(treasury, sf)?;
    if let Some(end) = end_date {
        merged = merged.truncate_after(end);
    }

    let merged = compute_basis(merged)?;
    let basis = merged.select(&basis_columns());
    Ok(basis.forward_fill())
}

/// Load both rate tables from the store and compute the basis table.
pub fn calculate_treasury_sf_basis(
    end_date: Option<NaiveDate>,
    store: &TableStore,
) -> Result<DateTable, DataError> {
    info!("calculating Treasury-SF basis");

    let treasury = store.load_treasury_yields()?;
    let sf = store.load_sf_rates()?;
    let basis = basis_from_rates(treasury, sf, end_date)?;

    info!(records = basis.height(), tenors = basis.width(), "basis computed");
    Ok(basis)
}

/// Persist the wide basis table as `treasury_sf_basis.parquet`.
pub fn save_treasury_sf_basis(basis: &DateTable, store: &TableStore) -> Result<PathBuf, DataError> {
    let path = store.write_table(BASIS_FILE, basis, BASIS_DATE_COLUMN, DataSource::Derived)?;
    info!("saved {BASIS_FILE}");
    Ok(path)
}

/// Load the persisted wide basis table.
pub fn load_treasury_sf_basis(store: &TableStore) -> Result<DateTable, DataError> {
    store.read_table(BASIS_FILE)
}
