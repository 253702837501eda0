//! Layered pipeline settings.
//!
//! Resolution order, later layers winning:
//! 1. Defaults derived from the project root
//! 2. `settings.toml` at the root, or an explicit `--config` file
//! 3. Environment variables (`DATA_DIR`, `OUTPUT_DIR`, `START_DATE`, ...)
//!
//! Per-command CLI flags are applied by the binary on top of the result.
//! Relative paths always resolve against the project root.

use crate::error::SettingsError;
use chrono::NaiveDate;
use serde::Deserialize;
use sfbasis_core::TableStore;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name that marks the project root and holds file-level settings.
pub const SETTINGS_FILE: &str = "settings.toml";

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// First date requested by the pull stage.
    pub start_date: NaiveDate,
    /// Last date requested by the pull stage; today when unset.
    pub end_date: Option<NaiveDate>,
    pub plot_start_date: NaiveDate,
    /// Last date shown in the interactive plot; latest available when unset.
    pub plot_end_date: Option<NaiveDate>,
    /// Base URL of the market-data bridge. Pulling without it fails.
    pub market_data_url: Option<String>,
}

/// Shape of `settings.toml`. Every key is optional; unknown keys are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    start_date: Option<DateValue>,
    end_date: Option<DateValue>,
    plot_start_date: Option<DateValue>,
    plot_end_date: Option<DateValue>,
    market_data_url: Option<String>,
}

/// Dates may be written as TOML dates (`2020-01-01`) or strings (`"2020-01-01"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateValue {
    Toml(toml::value::Datetime),
    Text(String),
}

impl DateValue {
    fn parse(&self, key: &str) -> Result<NaiveDate, SettingsError> {
        let text = match self {
            DateValue::Toml(dt) => dt.to_string(),
            DateValue::Text(s) => s.clone(),
        };
        parse_date(key, &text)
    }
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, SettingsError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| SettingsError::InvalidDate {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Nearest ancestor of `start` (inclusive) holding `settings.toml` or `.git`.
/// Falls back to `start` itself.
pub fn project_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .find(|dir| dir.join(SETTINGS_FILE).is_file() || dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

impl Settings {
    /// Built-in defaults for a project rooted at `root`.
    pub fn defaults(root: &Path) -> Self {
        Self {
            data_dir: root.join("_data"),
            output_dir: root.join("_output"),
            start_date: sfbasis_core::data::default_pull_start(),
            end_date: None,
            plot_start_date: crate::plot::default_start_date(),
            plot_end_date: None,
            market_data_url: None,
        }
    }

    /// Resolve settings from the working directory and the process environment.
    pub fn load(config: Option<&Path>) -> Result<Self, SettingsError> {
        let cwd = std::env::current_dir().map_err(SettingsError::WorkingDir)?;
        let root = project_root(&cwd);
        Self::resolve(&root, config, |key| std::env::var(key).ok())
    }

    /// Resolve settings for `root` with an explicit environment lookup.
    ///
    /// Without `config`, `<root>/settings.toml` is read when it exists. An
    /// explicit `config` must exist.
    pub fn resolve<F>(root: &Path, config: Option<&Path>, env: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::defaults(root);

        let file = match config {
            Some(path) => Some(path.to_path_buf()),
            None => Some(root.join(SETTINGS_FILE)).filter(|p| p.is_file()),
        };
        if let Some(path) = file {
            let content = std::fs::read_to_string(&path).map_err(|source| SettingsError::Read {
                path: path.clone(),
                source,
            })?;
            settings.apply_toml(root, &path, &content)?;
            debug!(path = %path.display(), "applied settings file");
        }

        settings.apply_env(root, env)?;
        Ok(settings)
    }

    fn apply_toml(&mut self, root: &Path, path: &Path, content: &str) -> Result<(), SettingsError> {
        let file: SettingsFile = toml::from_str(content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(dir) = file.data_dir {
            self.data_dir = resolve_path(root, &dir);
        }
        if let Some(dir) = file.output_dir {
            self.output_dir = resolve_path(root, &dir);
        }
        if let Some(date) = file.start_date {
            self.start_date = date.parse("start_date")?;
        }
        if let Some(date) = file.end_date {
            self.end_date = Some(date.parse("end_date")?);
        }
        if let Some(date) = file.plot_start_date {
            self.plot_start_date = date.parse("plot_start_date")?;
        }
        if let Some(date) = file.plot_end_date {
            self.plot_end_date = Some(date.parse("plot_end_date")?);
        }
        if let Some(url) = file.market_data_url {
            self.market_data_url = Some(url);
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, root: &Path, env: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty variables count as unset.
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = var("DATA_DIR") {
            self.data_dir = resolve_path(root, Path::new(&dir));
        }
        if let Some(dir) = var("OUTPUT_DIR") {
            self.output_dir = resolve_path(root, Path::new(&dir));
        }
        if let Some(date) = var("START_DATE") {
            self.start_date = parse_date("START_DATE", &date)?;
        }
        if let Some(date) = var("END_DATE") {
            self.end_date = Some(parse_date("END_DATE", &date)?);
        }
        if let Some(date) = var("PLOT_START_DATE") {
            self.plot_start_date = parse_date("PLOT_START_DATE", &date)?;
        }
        if let Some(date) = var("PLOT_END_DATE") {
            self.plot_end_date = Some(parse_date("PLOT_END_DATE", &date)?);
        }
        if let Some(url) = var("MARKET_DATA_URL") {
            self.market_data_url = Some(url);
        }
        Ok(())
    }

    /// Table store rooted at the data directory.
    pub fn store(&self) -> TableStore {
        TableStore::new(&self.data_dir)
    }
}
