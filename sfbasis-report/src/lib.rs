//! Treasury-SF basis reporting — settings, interactive plot, summary statistics and charts.
//!
//! - `settings`: layered configuration (defaults, `settings.toml`, environment)
//! - `plot`: plotly.js HTML figure of the basis over a date window
//! - `stats`: pandas-compatible descriptive statistics and correlations
//! - `charts`: static SVG charts rendered with plotters
//! - `summary`: diagnostics, statistics CSV and chart artifacts

pub mod charts;
pub mod error;
mod output;
pub mod plot;
pub mod settings;
pub mod stats;
pub mod summary;

pub use error::{ReportError, SettingsError};
pub use plot::{load_treasury_sf_data, plot_figure, plot_main, Figure, Trace};
pub use settings::Settings;
pub use summary::{build_summary, run_summary, SummaryArtifacts, SummaryReport};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: report types can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Settings>();
        require_sync::<Settings>();
        require_send::<Figure>();
        require_sync::<Figure>();
        require_send::<SummaryReport>();
        require_send::<ReportError>();
    }
}
