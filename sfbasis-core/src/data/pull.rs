//! Pull stage: fetch Treasury yields and SOFR OIS rates and persist them.

use super::provider::{DataError, MarketDataProvider};
use super::store::{TableStore, RAW_DATE_COLUMN, SF_RATES_FILE, TREASURY_YIELDS_FILE};
use crate::table::DateTable;
use crate::tenor::{RateSource, PX_LAST};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default first date requested from the provider.
pub fn default_pull_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

/// Both flattened tables from one pull.
#[derive(Debug, Clone)]
pub struct PulledData {
    pub treasury_yields: DateTable,
    pub sf_rates: DateTable,
}

/// Paths written by [`save_pulled`].
#[derive(Debug, Clone)]
pub struct PulledPaths {
    pub treasury_yields: PathBuf,
    pub sf_rates: PathBuf,
}

fn pull_source(
    provider: &dyn MarketDataProvider,
    source: RateSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DateTable, DataError> {
    let tickers = source.request_tickers();
    let frame = provider.historical(&tickers, &[PX_LAST], start, end)?;
    if frame.is_empty() {
        warn!(provider = provider.name(), source = %source, "provider returned no data");
    }
    frame.flatten()
}

/// Fetch the five Treasury and five SF series over `[start, end]`.
///
/// Any provider error aborts the pull.
pub fn pull_treasury_sf_data(
    provider: &dyn MarketDataProvider,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<PulledData, DataError> {
    info!(provider = provider.name(), %start, %end, "pulling Treasury-SF data");

    info!("pulling Treasury yields");
    let treasury_yields = pull_source(provider, RateSource::Treasury, start, end)?;

    info!("pulling secured financing (SOFR OIS) rates");
    let sf_rates = pull_source(provider, RateSource::Sf, start, end)?;

    Ok(PulledData {
        treasury_yields,
        sf_rates,
    })
}

/// Overwrite both rate tables in the store.
pub fn save_pulled(
    data: &PulledData,
    store: &TableStore,
    provider: &dyn MarketDataProvider,
) -> Result<PulledPaths, DataError> {
    let source = provider.source();
    let treasury_yields =
        store.write_table(TREASURY_YIELDS_FILE, &data.treasury_yields, RAW_DATE_COLUMN, source)?;
    info!(rows = data.treasury_yields.height(), "saved {TREASURY_YIELDS_FILE}");

    let sf_rates = store.write_table(SF_RATES_FILE, &data.sf_rates, RAW_DATE_COLUMN, source)?;
    info!(rows = data.sf_rates.height(), "saved {SF_RATES_FILE}");

    Ok(PulledPaths {
        treasury_yields,
        sf_rates,
    })
}
