//! Treasury-SF basis core — tenors, date tables, market data, and the basis calculator.
//!
//! This crate contains the data side of the pipeline:
//! - Tenor and rate-source domain types with the fixed ticker lookup tables
//! - `DateTable`, the date-indexed table every stage passes around
//! - Market-data providers (HTTP bridge, synthetic) and the pull stage
//! - Parquet table store with atomic writes and metadata sidecars
//! - The basis calculator: normalize, inner join, subtract, forward fill
//! - Wide ↔ long reshaping for the `(unique_id, ds, y)` output

pub mod basis;
pub mod data;
pub mod long_format;
pub mod table;
pub mod tenor;

pub use basis::{
    basis_from_rates, calculate_treasury_sf_basis, compute_basis, load_treasury_sf_basis,
    normalize_columns, prepare_data, save_treasury_sf_basis,
};
pub use data::{DataError, TableStore};
pub use long_format::{from_long, save_long_basis, to_long, LongRecord};
pub use table::{DateTable, TableColumn};
pub use tenor::{RateSource, Tenor};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: the types handed between stages are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<DateTable>();
        require_sync::<DateTable>();
        require_send::<LongRecord>();
        require_sync::<LongRecord>();
        require_send::<TableStore>();
        require_sync::<TableStore>();
        require_send::<data::HttpProvider>();
        require_sync::<data::HttpProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
    }

    #[test]
    fn provider_trait_is_object_safe() {
        fn _check(provider: &dyn data::MarketDataProvider) -> &str {
            provider.name()
        }
        let synthetic = data::SyntheticProvider::new();
        assert_eq!(_check(&synthetic), "synthetic");
    }
}
