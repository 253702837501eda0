//! Integration tests for the store-backed basis pipeline.
//!
//! Rate tables are written through the `TableStore` exactly as the pull stage
//! writes them, then read back by `calculate_treasury_sf_basis`.

use approx::assert_relative_eq;
use chrono::NaiveDate;
use sfbasis_core::data::store::RAW_DATE_COLUMN;
use sfbasis_core::data::{
    pull_treasury_sf_data, save_pulled, DataError, DataSource, SyntheticProvider, BASIS_FILE,
    LONG_BASIS_FILE, SF_RATES_FILE, TREASURY_YIELDS_FILE,
};
use sfbasis_core::{
    calculate_treasury_sf_basis, from_long, load_treasury_sf_basis, save_long_basis,
    save_treasury_sf_basis, DateTable, TableColumn, TableStore,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_data_dir() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("sfbasis_pipeline_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn raw(dates: &[&str], cols: &[(&str, Vec<Option<f64>>)]) -> DateTable {
    DateTable::from_columns(
        dates.iter().map(|s| d(s)).collect(),
        cols.iter()
            .map(|(n, v)| TableColumn::new(*n, v.clone()))
            .collect(),
    )
    .unwrap()
}

fn write_rates(store: &TableStore, treasury: &DateTable, sf: &DateTable) {
    store
        .write_table(TREASURY_YIELDS_FILE, treasury, RAW_DATE_COLUMN, DataSource::MarketData)
        .unwrap();
    store
        .write_table(SF_RATES_FILE, sf, RAW_DATE_COLUMN, DataSource::MarketData)
        .unwrap();
}

#[test]
fn two_day_scenario_forward_fills_missing_sf() {
    let dir = temp_data_dir();
    let store = TableStore::new(&dir);

    let treasury = raw(
        &["2024-03-01", "2024-03-04"],
        &[("USGG2YR Index_PX_LAST", vec![Some(4.50), Some(4.60)])],
    );
    let sf = raw(
        &["2024-03-01", "2024-03-04"],
        &[("USOSFR2 Curncy_PX_LAST", vec![Some(4.30), None])],
    );
    write_rates(&store, &treasury, &sf);

    let basis = calculate_treasury_sf_basis(None, &store).unwrap();
    assert_eq!(basis.column_names(), vec!["Treasury_SF_2Y"]);
    assert_eq!(basis.height(), 2);
    let values = basis.column("Treasury_SF_2Y").unwrap();
    assert_relative_eq!(values[0].unwrap(), 20.0, epsilon = 1e-9);
    assert_relative_eq!(values[1].unwrap(), 20.0, epsilon = 1e-9);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dates_in_one_source_only_are_dropped() {
    let dir = temp_data_dir();
    let store = TableStore::new(&dir);

    let treasury = raw(
        &["2024-03-01", "2024-03-04", "2024-03-05"],
        &[("USGG10YR Index_PX_LAST", vec![Some(4.2), Some(4.3), Some(4.4)])],
    );
    let sf = raw(
        &["2024-03-01", "2024-03-05", "2024-03-06"],
        &[("USOSFR10 Curncy_PX_LAST", vec![Some(3.9), Some(4.0), Some(4.1)])],
    );
    write_rates(&store, &treasury, &sf);

    let basis = calculate_treasury_sf_basis(None, &store).unwrap();
    assert_eq!(basis.dates(), &[d("2024-03-01"), d("2024-03-05")]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_rate_file_is_fatal() {
    let dir = temp_data_dir();
    let store = TableStore::new(&dir);

    let result = calculate_treasury_sf_basis(None, &store);
    assert!(matches!(result, Err(DataError::FileNotFound { .. })));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn synthetic_pull_through_long_format() {
    let dir = temp_data_dir();
    let store = TableStore::new(&dir);
    let provider = SyntheticProvider::new();

    let pulled = pull_treasury_sf_data(&provider, d("2023-01-01"), d("2023-06-30")).unwrap();
    save_pulled(&pulled, &store, &provider).unwrap();
    assert_eq!(store.get_meta(TREASURY_YIELDS_FILE).unwrap().source, "synthetic");

    let basis = calculate_treasury_sf_basis(Some(d("2023-05-31")), &store).unwrap();
    assert_eq!(basis.width(), 5);
    assert!(basis.last_date().unwrap() <= d("2023-05-31"));

    save_treasury_sf_basis(&basis, &store).unwrap();
    let reloaded = load_treasury_sf_basis(&store).unwrap();
    assert_eq!(reloaded, basis);
    assert!(dir.join(BASIS_FILE).exists());

    save_long_basis(&basis, &store).unwrap();
    let long = store.read_long(LONG_BASIS_FILE).unwrap();
    let pivoted = from_long(&long).unwrap();

    let observed: usize = basis.columns().iter().map(|c| c.valid_count()).sum();
    assert_eq!(long.len(), observed);
    for record in &long {
        let row = basis.dates().binary_search(&record.ds).unwrap();
        assert_eq!(basis.value(&record.unique_id, row), Some(record.y));
    }
    for name in basis.column_names() {
        assert!(pivoted.has_column(name));
    }

    let _ = std::fs::remove_dir_all(&dir);
}
