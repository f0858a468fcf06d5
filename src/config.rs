use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

use crate::frontier::TracerConfig;
use crate::solar::DateRange;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub solar: SolarConfig,
    pub store: StoreConfig,
    pub run: RunConfig,
    #[serde(default)]
    pub tracer: TracerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolarConfig {
    pub base_url: String,
    pub http_timeout_seconds: u64,
    #[serde(default)]
    pub range: DateRange,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// `[lat, lon]` pairs; fractional coordinates are floored to the
    /// archive's integer-degree grid.
    pub locations: Vec<[f64; 2]>,
    pub reliabilities: Vec<f64>,
    pub load_type: String,
    pub output_dir: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SRF__").split("__"));
        Ok(figment.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_file_parses() {
        let cfg: Config = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .extract()
            .unwrap();
        assert!(!cfg.run.locations.is_empty());
        assert!(cfg.run.reliabilities.iter().all(|&r| r > 0.0 && r <= 1.0));
        assert_eq!(cfg.run.load_type, "constant");
        assert!(cfg.solar.http_timeout_seconds > 0);
    }
}
