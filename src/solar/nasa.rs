//! Client for the NASA SSE daily insolation archive.
//!
//! The archive answers a CGI query with a plain-text list of daily
//! insolation totals (kWh/m^2/day), one float per day over the requested
//! date range.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use super::{DateRange, SolarDataError};

pub struct NasaSseClient {
    client: Client,
    base_url: String,
}

impl NasaSseClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SolarDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SolarDataError::Http)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Fetch the daily insolation series for an integer-degree cell.
    pub fn fetch_daily(
        &self,
        lat: i32,
        lon: i32,
        range: &DateRange,
    ) -> Result<Vec<f64>, SolarDataError> {
        let url = format!(
            "{}?ye={}&lat={}&submit=GetDailyDataasplaintext&me={}&daily=swv_dwn&\
             email=skip%40larc.nasa.gov&step=1&p=&ms={}&ys={}&de={}&lon={}&ds={}",
            self.base_url,
            range.end_year,
            lat,
            range.end_month,
            range.start_month,
            range.start_year,
            range.end_day,
            lon,
            range.start_day,
        );
        debug!(lat, lon, %url, "fetching daily insolation");

        let response = self.client.get(&url).send().map_err(SolarDataError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SolarDataError::Status { lat, lon, status });
        }
        let body = response.text().map_err(SolarDataError::Http)?;

        let series = body
            .split_whitespace()
            .map(|token| {
                token.parse::<f64>().map_err(|_| SolarDataError::Parse {
                    lat,
                    lon,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        if series.is_empty() {
            return Err(SolarDataError::EmptyResponse { lat, lon });
        }

        info!(lat, lon, days = series.len(), "fetched daily insolation");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_range() -> DateRange {
        DateRange {
            start_year: 1995,
            end_year: 2005,
            start_month: 1,
            end_month: 12,
            start_day: 1,
            end_day: 31,
        }
    }

    #[test]
    fn unreachable_archive_is_an_http_error() {
        let client = NasaSseClient::new(
            "http://127.0.0.1:1/homer.cgi",
            Duration::from_millis(200),
        )
        .unwrap();
        let err = client.fetch_daily(10, 10, &sample_range()).unwrap_err();
        assert!(matches!(err, SolarDataError::Http(_)));
    }

    #[test]
    #[ignore] // Requires network access to the NASA archive.
    fn fetches_real_daily_series() {
        let client = NasaSseClient::new(
            "https://eosweb.larc.nasa.gov/cgi-bin/sse/homer.cgi",
            Duration::from_secs(30),
        )
        .unwrap();
        let series = client.fetch_daily(10, 10, &sample_range()).unwrap();
        assert!(!series.is_empty());
    }
}
