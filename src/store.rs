//! Keyed persistence for solar series and computed frontiers.
//!
//! A cache miss (`Ok(None)`) is a distinct condition from a corrupt entry
//! (`StoreError::Corrupt`): callers decide whether corruption is fatal or a
//! reason to recompute, instead of both being conflated into one
//! recoverable path.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::frontier::Frontier;
use crate::solar::DateRange;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt cache entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Composite key for cached solar series: one archive fetch per integer
/// degree cell and date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolarKey {
    pub lat: i32,
    pub lon: i32,
    pub range: DateRange,
}

impl SolarKey {
    pub fn new(lat: i32, lon: i32, range: DateRange) -> Self {
        Self { lat, lon, range }
    }

    /// Deterministic identifier for the series this key resolves to.
    /// Duplicate writes under the same key are therefore idempotent.
    pub fn series_id(&self) -> String {
        let canonical = format!(
            "solar:{}:{}:{}-{}-{}:{}-{}-{}",
            self.lat,
            self.lon,
            self.range.start_year,
            self.range.start_month,
            self.range.start_day,
            self.range.end_year,
            self.range.end_month,
            self.range.end_day,
        );
        let digest = Sha256::digest(canonical.as_bytes());
        let mut id = String::with_capacity(16);
        for byte in digest.iter().take(8) {
            id.push_str(&format!("{byte:02x}"));
        }
        id
    }
}

/// Fixed 6-decimal encoding of a reliability target, filesystem-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReliabilityKey(String);

impl ReliabilityKey {
    pub fn new(reliability: f64) -> Self {
        Self(format!("{reliability:.6}").replace('.', "_"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReliabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique composite key for a cached frontier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontierKey {
    pub lat: i32,
    pub lon: i32,
    pub load_type: String,
    pub series_id: String,
    pub reliability: ReliabilityKey,
}

/// Cached daily and hourly insolation series.
pub trait SolarStore {
    fn get_daily(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError>;
    fn put_daily(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError>;
    fn get_hourly(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError>;
    fn put_hourly(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError>;
}

/// Cached frontiers, upsert semantics on write.
pub trait FrontierStore {
    fn get(&self, key: &FrontierKey) -> Result<Option<Frontier>, StoreError>;
    fn upsert(&mut self, key: &FrontierKey, frontier: &Frontier) -> Result<(), StoreError>;
}

/// One JSON file per key under a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(source) => Err(StoreError::Corrupt {
                key: path.display().to_string(),
                source,
            }),
        }
    }

    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        let contents =
            serde_json::to_string(value).expect("serializing store values cannot fail");
        fs::write(path, contents)?;
        Ok(())
    }

    fn solar_name(key: &SolarKey, kind: &str) -> String {
        format!("solar-{}-{kind}.json", key.series_id())
    }

    fn frontier_name(key: &FrontierKey) -> String {
        format!(
            "frontier-{}_{}-{}-{}-{}.json",
            key.lat, key.lon, key.load_type, key.series_id, key.reliability
        )
    }
}

impl SolarStore for JsonFileStore {
    fn get_daily(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError> {
        self.read(&Self::solar_name(key, "daily"))
    }

    fn put_daily(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError> {
        self.write(&Self::solar_name(key, "daily"), &series)
    }

    fn get_hourly(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError> {
        self.read(&Self::solar_name(key, "hourly"))
    }

    fn put_hourly(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError> {
        self.write(&Self::solar_name(key, "hourly"), &series)
    }
}

impl FrontierStore for JsonFileStore {
    fn get(&self, key: &FrontierKey) -> Result<Option<Frontier>, StoreError> {
        self.read(&Self::frontier_name(key))
    }

    fn upsert(&mut self, key: &FrontierKey, frontier: &Frontier) -> Result<(), StoreError> {
        self.write(&Self::frontier_name(key), frontier)
    }
}

/// In-memory stores, mainly for tests and ephemeral runs.
#[derive(Default)]
pub struct MemorySolarStore {
    daily: HashMap<SolarKey, Vec<f64>>,
    hourly: HashMap<SolarKey, Vec<f64>>,
}

impl SolarStore for MemorySolarStore {
    fn get_daily(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError> {
        Ok(self.daily.get(key).cloned())
    }

    fn put_daily(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError> {
        self.daily.insert(key.clone(), series.to_vec());
        Ok(())
    }

    fn get_hourly(&self, key: &SolarKey) -> Result<Option<Vec<f64>>, StoreError> {
        Ok(self.hourly.get(key).cloned())
    }

    fn put_hourly(&mut self, key: &SolarKey, series: &[f64]) -> Result<(), StoreError> {
        self.hourly.insert(key.clone(), series.to_vec());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFrontierStore {
    entries: HashMap<FrontierKey, Frontier>,
    pub gets: usize,
    pub upserts: usize,
}

impl FrontierStore for MemoryFrontierStore {
    fn get(&self, key: &FrontierKey) -> Result<Option<Frontier>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn upsert(&mut self, key: &FrontierKey, frontier: &Frontier) -> Result<(), StoreError> {
        self.upserts += 1;
        self.entries.insert(key.clone(), frontier.clone());
        Ok(())
    }
}
