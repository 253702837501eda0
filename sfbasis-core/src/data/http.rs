//! HTTP market-data bridge provider.
//!
//! Posts a historical-data request to `{base_url}/historical` and parses the
//! "split"-oriented response:
//!
//! ```json
//! {"columns": [["USGG2YR Index", "PX_LAST"]],
//!  "index": ["2024-01-02", "2024-01-03"],
//!  "data": [[4.33], [null]]}
//! ```
//!
//! Index entries may carry a time component (`2024-01-02T00:00:00.000`); only
//! the date is kept. Failures are returned as-is, with no retry.

use super::provider::{DataError, DataSource, HistoricalFrame, MarketDataProvider};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct HistoricalRequest<'a> {
    tickers: &'a [String],
    fields: &'a [&'a str],
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct SplitResponse {
    #[serde(default)]
    columns: Vec<Vec<String>>,
    #[serde(default)]
    index: Vec<String>,
    #[serde(default)]
    data: Vec<Vec<Option<f64>>>,
    #[serde(default)]
    error: Option<String>,
}

/// Provider backed by an HTTP bridge to a historical-data service.
pub struct HttpProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DataError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/historical", self.base_url)
    }

    fn parse_response(resp: SplitResponse) -> Result<HistoricalFrame, DataError> {
        if let Some(err) = resp.error {
            return Err(DataError::ResponseFormat(err));
        }

        let columns = resp
            .columns
            .into_iter()
            .map(|header| match header.as_slice() {
                [ticker, field] => Ok((ticker.clone(), field.clone())),
                other => Err(DataError::ResponseFormat(format!(
                    "expected (ticker, field) header, got {other:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let index = resp
            .index
            .iter()
            .map(|raw| parse_index_date(raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(HistoricalFrame {
            index,
            columns,
            rows: resp.data,
        })
    }
}

fn parse_index_date(raw: &str) -> Result<NaiveDate, DataError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| DataError::ResponseFormat(format!("invalid index date '{raw}': {e}")))
}

impl MarketDataProvider for HttpProvider {
    fn name(&self) -> &str {
        "http_bridge"
    }

    fn source(&self) -> DataSource {
        DataSource::MarketData
    }

    fn historical(
        &self,
        tickers: &[String],
        fields: &[&str],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<HistoricalFrame, DataError> {
        let request = HistoricalRequest {
            tickers,
            fields,
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
        };

        let resp = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DataError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SplitResponse = resp
            .json()
            .map_err(|e| DataError::ResponseFormat(format!("failed to parse response: {e}")))?;

        Self::parse_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<HistoricalFrame, DataError> {
        let resp: SplitResponse = serde_json::from_str(json).unwrap();
        HttpProvider::parse_response(resp)
    }

    #[test]
    fn parses_split_response() {
        let frame = parse(
            r#"{"columns": [["USOSFR2 Curncy", "PX_LAST"], ["USOSFR5 Curncy", "PX_LAST"]],
                "index": ["2024-01-02T00:00:00.000", "2024-01-03"],
                "data": [[4.30, 3.90], [null, 3.95]]}"#,
        )
        .unwrap();

        assert_eq!(frame.index.len(), 2);
        assert_eq!(frame.index[0], NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(frame.columns[1], ("USOSFR5 Curncy".to_string(), "PX_LAST".to_string()));
        assert_eq!(frame.rows[1], vec![None, Some(3.95)]);
    }

    #[test]
    fn empty_body_is_an_empty_frame() {
        let frame = parse("{}").unwrap();
        assert!(frame.is_empty());
    }

    #[test]
    fn single_level_header_is_rejected() {
        let result = parse(r#"{"columns": [["USGG2YR Index"]], "index": [], "data": []}"#);
        assert!(matches!(result, Err(DataError::ResponseFormat(_))));
    }

    #[test]
    fn bridge_error_is_surfaced() {
        let result = parse(r#"{"error": "session not started"}"#);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("session not started"));
    }

    #[test]
    fn bad_index_date_is_rejected() {
        let result = parse(r#"{"columns": [], "index": ["yesterday"], "data": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = HttpProvider::new("http://localhost:8194/").unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:8194/historical");
    }
}
