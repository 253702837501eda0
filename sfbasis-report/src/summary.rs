//! Summary report: dataset diagnostics, per-tenor statistics, static charts.

use crate::charts::{render_correlation, render_term_structure, render_time_series};
use crate::error::ReportError;
use crate::output::replace_with;
use crate::plot::load_treasury_sf_data;
use crate::settings::Settings;
use crate::stats::{correlation_matrix, describe, CorrelationMatrix, SeriesStats};
use chrono::NaiveDate;
use sfbasis_core::data::LONG_BASIS_FILE;
use sfbasis_core::DateTable;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TIME_SERIES_FILE: &str = "treasury_sf_basis.svg";
pub const TERM_STRUCTURE_FILE: &str = "treasury_sf_basis_term.svg";
pub const CORRELATION_FILE: &str = "treasury_sf_basis_correlation.svg";
pub const STATS_FILE: &str = "treasury_sf_basis_stats.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    /// Number of dates in the wide table.
    pub rows: usize,
    /// Number of non-missing observations across all series.
    pub observations: usize,
    pub series: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub stats: Vec<SeriesStats>,
    pub correlation: CorrelationMatrix,
}

/// Paths of the written artifacts.
#[derive(Debug, Clone)]
pub struct SummaryArtifacts {
    pub time_series: PathBuf,
    pub term_structure: PathBuf,
    pub term_structure_date: NaiveDate,
    pub correlation: PathBuf,
    pub stats_csv: PathBuf,
}

pub fn build_summary(basis: &DateTable) -> SummaryReport {
    SummaryReport {
        rows: basis.height(),
        observations: basis.columns().iter().map(|c| c.valid_count()).sum(),
        series: basis.column_names().iter().map(|s| s.to_string()).collect(),
        first_date: basis.first_date(),
        last_date: basis.last_date(),
        stats: describe(basis),
        correlation: correlation_matrix(basis),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{v:.2}"))
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: {} dates x {} series", self.rows, self.series.len())?;
        writeln!(f, "Observations: {}", self.observations)?;
        writeln!(f, "Series: {}", self.series.join(", "))?;
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => writeln!(f, "Date range: {first} to {last}")?,
            _ => writeln!(f, "Date range: (empty)")?,
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:<18}{:>8}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
            "series", "count", "mean", "std", "min", "max", "skew", "kurt"
        )?;
        for s in &self.stats {
            writeln!(
                f,
                "{:<18}{:>8}{:>10}{:>10}{:>10}{:>10}{:>10}{:>10}",
                s.series,
                s.count,
                cell(s.mean),
                cell(s.std),
                cell(s.min),
                cell(s.max),
                cell(s.skewness),
                cell(s.kurtosis),
            )?;
        }
        Ok(())
    }
}

/// Write the statistics table as CSV. Undefined values are empty cells.
pub fn write_stats_csv(stats: &[SeriesStats], path: &Path) -> Result<(), ReportError> {
    replace_with(path, |tmp| {
        let mut wtr = csv::Writer::from_path(tmp)?;
        for row in stats {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    })
}

/// Render the three charts and the statistics CSV into `output_dir`.
pub fn render_summary(
    report: &SummaryReport,
    basis: &DateTable,
    output_dir: &Path,
) -> Result<SummaryArtifacts, ReportError> {
    let time_series = output_dir.join(TIME_SERIES_FILE);
    render_time_series(basis, &time_series)?;

    let term_structure = output_dir.join(TERM_STRUCTURE_FILE);
    let term_structure_date = render_term_structure(basis, &term_structure)?;

    let correlation = output_dir.join(CORRELATION_FILE);
    render_correlation(&report.correlation, &correlation)?;

    let stats_csv = output_dir.join(STATS_FILE);
    write_stats_csv(&report.stats, &stats_csv)?;

    info!(dir = %output_dir.display(), "wrote summary artifacts");
    Ok(SummaryArtifacts {
        time_series,
        term_structure,
        term_structure_date,
        correlation,
        stats_csv,
    })
}

/// Load the long-format basis, summarize it and write the artifacts.
pub fn run_summary(settings: &Settings) -> Result<(SummaryReport, SummaryArtifacts), ReportError> {
    let basis = load_treasury_sf_data(&settings.data_dir.join(LONG_BASIS_FILE))?;
    if basis.is_empty() {
        return Err(ReportError::Empty("basis table has no rows".into()));
    }
    let report = build_summary(&basis);
    let artifacts = render_summary(&report, &basis, &settings.output_dir)?;
    Ok((report, artifacts))
}
