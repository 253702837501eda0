//! Data retrieval and persistence

pub mod http;
pub mod provider;
pub mod pull;
pub mod store;
pub mod synthetic;

pub use http::HttpProvider;
pub use provider::{DataError, DataSource, HistoricalFrame, MarketDataProvider};
pub use pull::{default_pull_start, pull_treasury_sf_data, save_pulled, PulledData, PulledPaths};
pub use store::{
    read_long_file, TableMeta, TableStore, BASIS_FILE, LONG_BASIS_FILE, SF_RATES_FILE,
    TREASURY_YIELDS_FILE,
};
pub use synthetic::SyntheticProvider;
