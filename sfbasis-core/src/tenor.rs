//! Tenors, rate sources, and the fixed ticker lookup tables.
//!
//! Column naming:
//! - raw provider column: `"{ticker} {yellow_key}_{field}"`, e.g. `USGG2YR Index_PX_LAST`
//! - canonical rate column: `"{tenor}_{suffix}"`, e.g. `2Y_Treasury`, `2Y_SF`
//! - basis column: `"Treasury_SF_{tenor}"`, e.g. `Treasury_SF_2Y`

use serde::{Deserialize, Serialize};
use std::fmt;

/// The field requested for every ticker.
pub const PX_LAST: &str = "PX_LAST";

/// Prefix shared by every basis column.
pub const BASIS_PREFIX: &str = "Treasury_SF_";

/// Constant-maturity tenor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tenor {
    #[serde(rename = "2Y")]
    Y2,
    #[serde(rename = "5Y")]
    Y5,
    #[serde(rename = "10Y")]
    Y10,
    #[serde(rename = "20Y")]
    Y20,
    #[serde(rename = "30Y")]
    Y30,
}

impl Tenor {
    /// All tenors, shortest maturity first.
    pub const ALL: [Tenor; 5] = [Tenor::Y2, Tenor::Y5, Tenor::Y10, Tenor::Y20, Tenor::Y30];

    pub fn label(self) -> &'static str {
        match self {
            Tenor::Y2 => "2Y",
            Tenor::Y5 => "5Y",
            Tenor::Y10 => "10Y",
            Tenor::Y20 => "20Y",
            Tenor::Y30 => "30Y",
        }
    }

    /// Maturity in years.
    pub fn years(self) -> u32 {
        match self {
            Tenor::Y2 => 2,
            Tenor::Y5 => 5,
            Tenor::Y10 => 10,
            Tenor::Y20 => 20,
            Tenor::Y30 => 30,
        }
    }

    pub fn from_label(label: &str) -> Option<Tenor> {
        Tenor::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Canonical rate column for this tenor and source, e.g. `10Y_SF`.
    pub fn rate_column(self, source: RateSource) -> String {
        format!("{}_{}", self.label(), source.suffix())
    }

    /// Basis column for this tenor, e.g. `Treasury_SF_10Y`.
    pub fn basis_column(self) -> String {
        format!("{BASIS_PREFIX}{}", self.label())
    }

    /// Inverse of [`Tenor::basis_column`].
    pub fn from_basis_column(name: &str) -> Option<Tenor> {
        name.strip_prefix(BASIS_PREFIX).and_then(Tenor::from_label)
    }
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of the basis a rate series belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateSource {
    /// Treasury constant-maturity yields (USGG series).
    Treasury,
    /// SOFR OIS swap rates (USOSFR series).
    Sf,
}

const TREASURY_TICKERS: [(&str, Tenor); 5] = [
    ("USGG2YR", Tenor::Y2),
    ("USGG5YR", Tenor::Y5),
    ("USGG10YR", Tenor::Y10),
    ("USGG20YR", Tenor::Y20),
    ("USGG30YR", Tenor::Y30),
];

const SF_TICKERS: [(&str, Tenor); 5] = [
    ("USOSFR2", Tenor::Y2),
    ("USOSFR5", Tenor::Y5),
    ("USOSFR10", Tenor::Y10),
    ("USOSFR20", Tenor::Y20),
    ("USOSFR30", Tenor::Y30),
];

impl RateSource {
    pub fn suffix(self) -> &'static str {
        match self {
            RateSource::Treasury => "Treasury",
            RateSource::Sf => "SF",
        }
    }

    /// Market sector key appended to the ticker when requesting data.
    pub fn yellow_key(self) -> &'static str {
        match self {
            RateSource::Treasury => "Index",
            RateSource::Sf => "Curncy",
        }
    }

    fn ticker_table(self) -> &'static [(&'static str, Tenor); 5] {
        match self {
            RateSource::Treasury => &TREASURY_TICKERS,
            RateSource::Sf => &SF_TICKERS,
        }
    }

    /// Look up the tenor for a bare ticker (`USGG10YR`). Unknown tickers map to `None`.
    pub fn tenor_for_ticker(self, ticker: &str) -> Option<Tenor> {
        self.ticker_table()
            .iter()
            .find(|(t, _)| *t == ticker)
            .map(|(_, tenor)| *tenor)
    }

    /// Full request tickers in tenor order, e.g. `USOSFR2 Curncy`.
    pub fn request_tickers(self) -> Vec<String> {
        self.ticker_table()
            .iter()
            .map(|(t, _)| format!("{t} {}", self.yellow_key()))
            .collect()
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenors_are_ordered_by_maturity() {
        let years: Vec<u32> = Tenor::ALL.iter().map(|t| t.years()).collect();
        assert_eq!(years, vec![2, 5, 10, 20, 30]);
        assert!(Tenor::Y2 < Tenor::Y30);
    }

    #[test]
    fn column_names() {
        assert_eq!(Tenor::Y10.rate_column(RateSource::Treasury), "10Y_Treasury");
        assert_eq!(Tenor::Y10.rate_column(RateSource::Sf), "10Y_SF");
        assert_eq!(Tenor::Y30.basis_column(), "Treasury_SF_30Y");
        assert_eq!(Tenor::from_basis_column("Treasury_SF_5Y"), Some(Tenor::Y5));
        assert_eq!(Tenor::from_basis_column("Treasury_SF_7Y"), None);
        assert_eq!(Tenor::from_basis_column("5Y"), None);
    }

    #[test]
    fn ticker_lookup_is_source_specific() {
        assert_eq!(RateSource::Treasury.tenor_for_ticker("USGG20YR"), Some(Tenor::Y20));
        assert_eq!(RateSource::Sf.tenor_for_ticker("USOSFR20"), Some(Tenor::Y20));
        assert_eq!(RateSource::Sf.tenor_for_ticker("USGG20YR"), None);
        assert_eq!(RateSource::Treasury.tenor_for_ticker("USGG3YR"), None);
    }

    #[test]
    fn request_tickers_carry_yellow_key() {
        let treasury = RateSource::Treasury.request_tickers();
        assert_eq!(treasury.len(), 5);
        assert_eq!(treasury[0], "USGG2YR Index");
        assert_eq!(RateSource::Sf.request_tickers()[4], "USOSFR30 Curncy");
    }

    #[test]
    fn tenor_serializes_as_label() {
        let json = serde_json::to_string(&Tenor::Y10).unwrap();
        assert_eq!(json, "\"10Y\"");
    }
}
