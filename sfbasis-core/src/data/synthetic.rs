//! Synthetic rate provider for offline development.
//!
//! Produces a deterministic random walk per ticker, seeded from the ticker
//! name, on weekdays only. About 2% of cells are left missing so downstream
//! gap handling gets exercised. Tables built from it are tagged `synthetic`.

use super::provider::{DataError, DataSource, HistoricalFrame, MarketDataProvider};
use crate::tenor::RateSource;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

/// Starting level (percent) for a request ticker such as `USGG10YR Index`.
fn starting_level(ticker: &str) -> f64 {
    let bare = ticker.split_whitespace().next().unwrap_or(ticker);
    if let Some(tenor) = RateSource::Treasury.tenor_for_ticker(bare) {
        return 2.0 + 0.05 * tenor.years() as f64;
    }
    if let Some(tenor) = RateSource::Sf.tenor_for_ticker(bare) {
        return 2.1 + 0.03 * tenor.years() as f64;
    }
    3.0
}

fn weekdays(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

fn random_walk(ticker: &str, days: usize) -> Vec<Option<f64>> {
    let seed: [u8; 32] = *blake3::hash(ticker.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut level = starting_level(ticker);
    (0..days)
        .map(|_| {
            level = (level + rng.gen_range(-0.04..0.04)).max(0.0);
            if rng.gen_bool(0.02) {
                None
            } else {
                Some((level * 1000.0).round() / 1000.0)
            }
        })
        .collect()
}

impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn historical(
        &self,
        tickers: &[String],
        fields: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalFrame, DataError> {
        let index = weekdays(start, end);

        let mut columns = Vec::new();
        let mut series = Vec::new();
        for ticker in tickers {
            for field in fields {
                columns.push((ticker.clone(), field.to_string()));
                series.push(random_walk(&format!("{ticker}/{field}"), index.len()));
            }
        }

        let rows = (0..index.len())
            .map(|i| series.iter().map(|s| s[i]).collect())
            .collect();

        Ok(HistoricalFrame {
            index,
            columns,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn skips_weekends() {
        // 2024-01-06 and 2024-01-07 are a weekend
        let days = weekdays(d("2024-01-05"), d("2024-01-08"));
        assert_eq!(days, vec![d("2024-01-05"), d("2024-01-08")]);
    }

    #[test]
    fn output_is_deterministic_per_ticker() {
        let provider = SyntheticProvider::new();
        let tickers = vec!["USGG2YR Index".to_string(), "USGG5YR Index".to_string()];
        let a = provider
            .historical(&tickers, &["PX_LAST"], d("2024-01-01"), d("2024-03-31"))
            .unwrap();
        let b = provider
            .historical(&tickers, &["PX_LAST"], d("2024-01-01"), d("2024-03-31"))
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.columns.len(), 2);
        assert_eq!(a.rows.len(), a.index.len());
        let first_2y: Vec<_> = a.rows.iter().map(|r| r[0]).collect();
        let first_5y: Vec<_> = a.rows.iter().map(|r| r[1]).collect();
        assert_ne!(first_2y, first_5y);
    }

    #[test]
    fn levels_stay_non_negative() {
        let values = random_walk("USOSFR30 Curncy/PX_LAST", 2_000);
        assert!(values.iter().flatten().all(|v| *v >= 0.0));
    }
}
