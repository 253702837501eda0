//! Parquet table store rooted at the data directory.
//!
//! Layout: `{data_dir}/{name}.parquet` with a `{name}.meta.json` sidecar.
//!
//! - Atomic writes (write to `.tmp`, rename into place)
//! - Wide tables: one date column plus one `f64` column per series
//! - Long tables: `unique_id` (string), `ds` (date), `y` (f64)
//! - Date columns may be stored as Date, Datetime or ISO strings on read

use super::provider::{DataError, DataSource};
use crate::long_format::LongRecord;
use crate::table::{DateTable, TableColumn};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TREASURY_YIELDS_FILE: &str = "treasury_yields.parquet";
pub const SF_RATES_FILE: &str = "sf_rates.parquet";
pub const BASIS_FILE: &str = "treasury_sf_basis.parquet";
pub const LONG_BASIS_FILE: &str = "ftsfr_treasury_sf_basis.parquet";

/// Date column name used for pulled rate tables.
pub const RAW_DATE_COLUMN: &str = "index";
/// Date column name used for the wide basis table.
pub const BASIS_DATE_COLUMN: &str = "date";

/// Names recognised as the date axis, in priority order. If none is present the
/// first Date/Datetime column is used.
const DATE_COLUMN_CANDIDATES: [&str; 5] = ["index", "date", "Date", "ds", "__index_level_0__"];

/// Metadata sidecar written next to every table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableMeta {
    pub table: String,
    pub row_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub columns: Vec<String>,
    pub data_hash: String,
    pub source: String,
    pub written_at: chrono::NaiveDateTime,
}

/// Reads and writes the pipeline's parquet tables.
#[derive(Debug, Clone)]
pub struct TableStore {
    data_dir: PathBuf,
}

impl TableStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    fn meta_path(&self, file: &str) -> PathBuf {
        self.path(file).with_extension("meta.json")
    }

    /// Load a wide table.
    pub fn read_table(&self, file: &str) -> Result<DateTable, DataError> {
        let path = self.path(file);
        debug!(path = %path.display(), "reading table");
        let df = read_parquet(&path)?;
        dataframe_to_table(&df)
    }

    /// Write a wide table and its metadata sidecar. Returns the table path.
    pub fn write_table(
        &self,
        file: &str,
        table: &DateTable,
        date_column: &str,
        source: DataSource,
    ) -> Result<PathBuf, DataError> {
        fs::create_dir_all(&self.data_dir)?;
        let mut df = table_to_dataframe(table, date_column)?;
        let path = self.path(file);
        write_parquet_atomic(&mut df, &path)?;

        let meta = TableMeta {
            table: file.to_string(),
            row_count: table.height(),
            start_date: table.first_date(),
            end_date: table.last_date(),
            columns: table.column_names().iter().map(|s| s.to_string()).collect(),
            data_hash: table_hash(table),
            source: source.label().to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        self.write_meta(file, &meta)?;

        debug!(path = %path.display(), rows = table.height(), "wrote table");
        Ok(path)
    }

    /// Load a long-format `(unique_id, ds, y)` table.
    pub fn read_long(&self, file: &str) -> Result<Vec<LongRecord>, DataError> {
        read_long_file(&self.path(file))
    }

    /// Write a long-format table and its metadata sidecar. Returns the table path.
    pub fn write_long(
        &self,
        file: &str,
        records: &[LongRecord],
        source: DataSource,
    ) -> Result<PathBuf, DataError> {
        fs::create_dir_all(&self.data_dir)?;
        let mut df = long_to_dataframe(records)?;
        let path = self.path(file);
        write_parquet_atomic(&mut df, &path)?;

        let mut ids: Vec<String> = records.iter().map(|r| r.unique_id.clone()).collect();
        ids.sort();
        ids.dedup();
        let meta = TableMeta {
            table: file.to_string(),
            row_count: records.len(),
            start_date: records.iter().map(|r| r.ds).min(),
            end_date: records.iter().map(|r| r.ds).max(),
            columns: ids,
            data_hash: long_hash(records),
            source: source.label().to_string(),
            written_at: chrono::Local::now().naive_local(),
        };
        self.write_meta(file, &meta)?;

        debug!(path = %path.display(), rows = records.len(), "wrote long table");
        Ok(path)
    }

    /// Metadata sidecar for a table, if one exists and parses.
    pub fn get_meta(&self, file: &str) -> Option<TableMeta> {
        let content = fs::read_to_string(self.meta_path(file)).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn write_meta(&self, file: &str, meta: &TableMeta) -> Result<(), DataError> {
        let json = serde_json::to_string_pretty(meta)
            .map_err(|e| DataError::Serialization(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(file), json)?;
        Ok(())
    }

    pub fn load_treasury_yields(&self) -> Result<DateTable, DataError> {
        self.read_table(TREASURY_YIELDS_FILE)
    }

    pub fn load_sf_rates(&self) -> Result<DateTable, DataError> {
        self.read_table(SF_RATES_FILE)
    }
}

/// Load a long-format table from an explicit path.
pub fn read_long_file(path: &Path) -> Result<Vec<LongRecord>, DataError> {
    debug!(path = %path.display(), "reading long table");
    let df = read_parquet(path)?;
    dataframe_to_long(&df)
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    // NaiveDate's default is 1970-01-01, the origin of polars' Date type.
    NaiveDate::default()
}

fn read_parquet(path: &Path) -> Result<DataFrame, DataError> {
    let file = fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DataError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DataError::Io(e)
        }
    })?;
    ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read {}: {e}", path.display())))
}

fn write_parquet_atomic(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let tmp_path = path.with_extension("parquet.tmp");
    let file = fs::File::create(&tmp_path)?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::Parquet(format!("write {}: {e}", path.display())))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Io(e)
    })
}

fn find_date_column(df: &DataFrame) -> Option<String> {
    for name in DATE_COLUMN_CANDIDATES {
        if df.column(name).is_ok() {
            return Some(name.to_string());
        }
    }
    df.get_columns()
        .iter()
        .find(|c| matches!(c.dtype(), DataType::Date | DataType::Datetime(_, _)))
        .map(|c| c.name().to_string())
}

fn column_to_dates(column: &Column) -> Result<Vec<Option<NaiveDate>>, DataError> {
    if matches!(column.dtype(), DataType::String) {
        let ca = column
            .str()
            .map_err(|e| DataError::Parquet(format!("date column type: {e}")))?;
        return ca
            .into_iter()
            .map(|v| {
                v.map(|s| {
                    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").map_err(|e| {
                        DataError::Validation(format!("invalid date '{s}': {e}"))
                    })
                })
                .transpose()
            })
            .collect();
    }

    let cast = column
        .cast(&DataType::Date)
        .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?;
    let ca = cast
        .date()
        .map_err(|e| DataError::Parquet(format!("date column type: {e}")))?;
    let origin = epoch();
    Ok((0..ca.len())
        .map(|i| ca.get(i).map(|days| origin + chrono::Duration::days(days as i64)))
        .collect())
}

fn column_to_values(column: &Column) -> Result<Vec<Option<f64>>, DataError> {
    let cast = column
        .cast(&DataType::Float64)
        .map_err(|e| DataError::Parquet(format!("value cast '{}': {e}", column.name())))?;
    let ca = cast
        .f64()
        .map_err(|e| DataError::Parquet(format!("value column type: {e}")))?;
    Ok(ca.into_iter().collect())
}

/// Convert a wide DataFrame into a `DateTable`. Rows without a date are dropped;
/// string columns other than the date axis are skipped.
fn dataframe_to_table(df: &DataFrame) -> Result<DateTable, DataError> {
    let date_name = find_date_column(df)
        .ok_or_else(|| DataError::Validation("no date column found".into()))?;
    let date_col = df
        .column(&date_name)
        .map_err(|e| DataError::Parquet(format!("column read: {e}")))?;
    let raw_dates = column_to_dates(date_col)?;

    let keep: Vec<usize> = raw_dates
        .iter()
        .enumerate()
        .filter_map(|(i, d)| d.map(|_| i))
        .collect();
    if keep.len() < raw_dates.len() {
        warn!(
            dropped = raw_dates.len() - keep.len(),
            "dropping rows with a missing date"
        );
    }
    let dates: Vec<NaiveDate> = raw_dates.into_iter().flatten().collect();

    let mut columns = Vec::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        if name == date_name {
            continue;
        }
        if matches!(column.dtype(), DataType::String) {
            debug!(column = %name, "skipping non-numeric column");
            continue;
        }
        let values = column_to_values(column)?;
        let values = keep.iter().map(|&i| values[i]).collect();
        columns.push(TableColumn::new(name, values));
    }

    DateTable::from_columns(dates, columns)
}

fn table_to_dataframe(table: &DateTable, date_column: &str) -> Result<DataFrame, DataError> {
    let origin = epoch();
    let days: Vec<i32> = table
        .dates()
        .iter()
        .map(|d| (*d - origin).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(
        Column::new(date_column.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
    );
    for column in table.columns() {
        columns.push(Column::new(column.name.as_str().into(), column.values.clone()));
    }

    DataFrame::new(columns).map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))
}

fn long_to_dataframe(records: &[LongRecord]) -> Result<DataFrame, DataError> {
    let origin = epoch();
    let ids: Vec<String> = records.iter().map(|r| r.unique_id.clone()).collect();
    let days: Vec<i32> = records
        .iter()
        .map(|r| (r.ds - origin).num_days() as i32)
        .collect();
    let ys: Vec<f64> = records.iter().map(|r| r.y).collect();

    DataFrame::new(vec![
        Column::new("unique_id".into(), ids),
        Column::new("ds".into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
        Column::new("y".into(), ys),
    ])
    .map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))
}

fn dataframe_to_long(df: &DataFrame) -> Result<Vec<LongRecord>, DataError> {
    let map_err = |e: PolarsError| DataError::Parquet(format!("column read: {e}"));

    let ids = df.column("unique_id").map_err(map_err)?;
    let ids = ids
        .str()
        .map_err(|e| DataError::Parquet(format!("unique_id column type: {e}")))?;
    let dates = column_to_dates(df.column("ds").map_err(map_err)?)?;
    let ys = column_to_values(df.column("y").map_err(map_err)?)?;

    let mut records = Vec::with_capacity(df.height());
    for (i, id) in ids.into_iter().enumerate() {
        // Rows missing any field carry no observation.
        let (Some(id), Some(ds), Some(y)) = (id, dates[i], ys[i]) else {
            continue;
        };
        if y.is_nan() {
            continue;
        }
        records.push(LongRecord {
            unique_id: id.to_string(),
            ds,
            y,
        });
    }
    Ok(records)
}

/// Deterministic BLAKE3 hash over dates, column names and cell values.
fn table_hash(table: &DateTable) -> String {
    let mut hasher = blake3::Hasher::new();
    for date in table.dates() {
        hasher.update(date.to_string().as_bytes());
    }
    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        for value in &column.values {
            match value {
                Some(v) => hasher.update(&v.to_le_bytes()),
                None => hasher.update(b"null"),
            };
        }
    }
    hasher.finalize().to_hex().to_string()
}

fn long_hash(records: &[LongRecord]) -> String {
    let mut hasher = blake3::Hasher::new();
    for record in records {
        hasher.update(record.unique_id.as_bytes());
        hasher.update(record.ds.to_string().as_bytes());
        hasher.update(&record.y.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
