//! Solar insolation data: archive fetch, caching, and daily-to-hourly
//! disaggregation.

pub mod clearsky;
pub mod nasa;

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{SolarKey, SolarStore, StoreError};

pub use nasa::NasaSseClient;

#[derive(Debug, Error)]
pub enum SolarDataError {
    #[error("insolation fetch failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("archive returned {status} for lat={lat}, lon={lon}")]
    Status {
        lat: i32,
        lon: i32,
        status: reqwest::StatusCode,
    },

    #[error("could not parse {token:?} in archive response for lat={lat}, lon={lon}")]
    Parse { lat: i32, lon: i32, token: String },

    #[error("archive returned no data for lat={lat}, lon={lon}")]
    EmptyResponse { lat: i32, lon: i32 },

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Explicit date range for archive queries. Passed at every call site; the
/// binary reads its default from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start_year: i32,
    pub end_year: i32,
    pub start_month: u32,
    pub end_month: u32,
    pub start_day: u32,
    pub end_day: u32,
}

impl DateRange {
    pub fn start_date(&self) -> Result<NaiveDate, SolarDataError> {
        NaiveDate::from_ymd_opt(self.start_year, self.start_month, self.start_day).ok_or_else(
            || {
                SolarDataError::InvalidRange(format!(
                    "{}-{}-{} is not a date",
                    self.start_year, self.start_month, self.start_day
                ))
            },
        )
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start_year: 1995,
            end_year: 2005,
            start_month: 1,
            end_month: 12,
            start_day: 1,
            end_day: 31,
        }
    }
}

/// Source of hourly insolation series, abstracted so the orchestrator can
/// be exercised without the archive.
pub trait SolarSource {
    fn load_hourly(
        &mut self,
        lat: i32,
        lon: i32,
        range: &DateRange,
    ) -> Result<(Vec<f64>, String), SolarDataError>;
}

/// Fetch-or-cache access to hourly insolation.
///
/// Hourly series are derived from cached daily archive data via the
/// clear-sky disaggregation and persisted alongside it; the archive is
/// only contacted when the daily series is missing from the store.
pub struct SolarDataService {
    client: NasaSseClient,
    store: Box<dyn SolarStore>,
}

impl SolarDataService {
    pub fn new(client: NasaSseClient, store: Box<dyn SolarStore>) -> Self {
        Self { client, store }
    }
}

impl SolarSource for SolarDataService {
    fn load_hourly(
        &mut self,
        lat: i32,
        lon: i32,
        range: &DateRange,
    ) -> Result<(Vec<f64>, String), SolarDataError> {
        let key = SolarKey::new(lat, lon, range.clone());
        let series_id = key.series_id();

        if let Some(hourly) = self.store.get_hourly(&key)? {
            debug!(lat, lon, series_id, "hourly insolation cache hit");
            return Ok((hourly, series_id));
        }

        let daily = match self.store.get_daily(&key)? {
            Some(daily) => daily,
            None => {
                let daily = self.client.fetch_daily(lat, lon, range)?;
                self.store.put_daily(&key, &daily)?;
                daily
            }
        };

        let hourly = disaggregate_daily(lat as f64, range, &daily)?;
        self.store.put_hourly(&key, &hourly)?;
        info!(
            lat,
            lon,
            series_id,
            hours = hourly.len(),
            "disaggregated daily insolation to hourly"
        );
        Ok((hourly, series_id))
    }
}

/// Expand a daily insolation series into hourly values, one clear-sky
/// scaled day at a time.
pub fn disaggregate_daily(
    latitude_deg: f64,
    range: &DateRange,
    daily: &[f64],
) -> Result<Vec<f64>, SolarDataError> {
    let start = range.start_date()?;
    let mut hourly = Vec::with_capacity(daily.len() * 24);
    for (i, &insolation) in daily.iter().enumerate() {
        let date = start + ChronoDuration::days(i as i64);
        hourly.extend(clearsky::hourly_profile(latitude_deg, date, insolation));
    }
    Ok(hourly)
}
