//! Clear-sky irradiance model used to disaggregate daily insolation totals
//! into hourly series.
//!
//! The model integrates extraterrestrial radiation over hour-angle
//! intervals: solar declination and the equation of time locate the sun,
//! sunrise/sunset clip each interval to daylight, and a clearness index
//! scales the clear-sky day so its total insolation matches the observed
//! daily value.

use chrono::{Datelike, NaiveDate};
use std::f64::consts::PI;

/// Extraterrestrial normal radiation at mean sun-earth distance, kW/m^2.
const SOLAR_CONSTANT: f64 = 1.367;

fn sind(deg: f64) -> f64 {
    (deg * PI / 180.0).sin()
}

fn cosd(deg: f64) -> f64 {
    (deg * PI / 180.0).cos()
}

fn tand(deg: f64) -> f64 {
    (deg * PI / 180.0).tan()
}

/// Per-day solar geometry for one latitude.
#[derive(Debug, Clone)]
struct DayGeometry {
    declination_deg: f64,
    /// Extraterrestrial radiation adjusted for orbital eccentricity.
    g_on: f64,
    /// Sunset hour angle in degrees; sunrise is `360 - sunset` on the
    /// wrapped hour-angle circle.
    sunset_deg: f64,
    /// Equation-of-time correction in hours.
    eot_hours: f64,
    latitude_deg: f64,
}

impl DayGeometry {
    fn new(latitude_deg: f64, date: NaiveDate) -> Self {
        let day_of_year = date.ordinal() as f64;
        let declination_deg = 23.45 * sind(360.0 * (284.0 + day_of_year) / 365.0);
        let g_on = SOLAR_CONSTANT * (1.0 + 0.033 * cosd(360.0 * day_of_year / 365.0));

        // Clamp covers polar day/night where the sun never crosses the
        // horizon and acos would leave its domain.
        let cos_sunset = (-tand(latitude_deg) * tand(declination_deg)).clamp(-1.0, 1.0);
        let sunset_deg = cos_sunset.acos() * 180.0 / PI;

        let b = 360.0 * (day_of_year - 1.0) / 365.0;
        let eot_hours = 3.82
            * (0.000075 + 0.001868 * cosd(b) - 0.032077 * sind(b) - 0.014615 * cosd(2.0 * b)
                - 0.04089 * sind(2.0 * b));

        Self {
            declination_deg,
            g_on,
            sunset_deg,
            eot_hours,
            latitude_deg,
        }
    }

    fn sunrise_deg(&self) -> f64 {
        360.0 - self.sunset_deg
    }

    /// Mean clear-sky irradiance over a daylight hour-angle interval,
    /// kW/m^2. The interval must already be clipped to daylight.
    fn mean_irradiance(&self, w1: f64, w2: f64) -> f64 {
        let span = (w2 - w1).rem_euclid(360.0);
        self.g_on
            * (cosd(self.latitude_deg) * cosd(self.declination_deg) * (sind(w2) - sind(w1))
                * 180.0
                / PI
                / span
                + sind(self.latitude_deg) * sind(self.declination_deg))
    }

    /// Cumulative clear-sky insolation over a daylight interval, kWh/m^2.
    fn insolation(&self, w1: f64, w2: f64) -> f64 {
        self.mean_irradiance(w1, w2) * (w2 - w1).rem_euclid(360.0) / 15.0
    }

    fn is_dark(&self, w: f64) -> bool {
        w >= self.sunset_deg && w <= self.sunrise_deg()
    }
}

/// Hourly clear-sky irradiance profile for one day, scaled so the total
/// matches `daily_insolation` (kWh/m^2). Output is aligned to the local
/// solar day: index `k` covers solar hours `[k, k+1)`.
pub fn hourly_profile(latitude_deg: f64, date: NaiveDate, daily_insolation: f64) -> Vec<f64> {
    let geometry = DayGeometry::new(latitude_deg, date);

    // Polar night, or nothing to distribute.
    if geometry.sunset_deg <= 0.0 || daily_insolation <= 0.0 {
        return vec![0.0; 24];
    }
    let clear_sky_day = geometry.insolation(geometry.sunrise_deg(), geometry.sunset_deg);
    if clear_sky_day <= 0.0 {
        return vec![0.0; 24];
    }
    let clearness = daily_insolation / clear_sky_day;

    (0..24)
        .map(|k| {
            let solar_hour = k as f64 + 0.5 + geometry.eot_hours;
            let mut w1 = ((solar_hour - 0.5 - 12.0) * 15.0).rem_euclid(360.0);
            let mut w2 = ((solar_hour + 0.5 - 12.0) * 15.0).rem_euclid(360.0);

            let w1_dark = geometry.is_dark(w1);
            let w2_dark = geometry.is_dark(w2);
            if w1_dark && w2_dark {
                return 0.0;
            }
            if w1_dark {
                w1 = geometry.sunrise_deg();
            }
            if w2_dark {
                w2 = geometry.sunset_deg;
            }

            // Weight by the clipped span so partial daylight hours
            // contribute proportionally.
            let hour_mean = geometry.mean_irradiance(w1, w2) * (w2 - w1).rem_euclid(360.0) / 15.0;
            (hour_mean * clearness).max(0.0)
        })
        .collect()
}
