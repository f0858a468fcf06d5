//! Cache-aware batch driver: per location and reliability target, reuse a
//! stored frontier or trace and persist a new one.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::FrontierError;
use crate::frontier::{Frontier, FrontierTracer, TracerConfig};
use crate::simulation::{build_load, EnergySystem};
use crate::solar::{DateRange, SolarSource};
use crate::store::{FrontierKey, FrontierStore, ReliabilityKey, StoreError};

/// All frontiers computed for one integer-degree cell, keyed by the
/// 6-decimal reliability encoding.
#[derive(Debug, Clone, Serialize)]
pub struct LocationFrontiers {
    pub lat: i32,
    pub lon: i32,
    pub frontiers: BTreeMap<ReliabilityKey, Frontier>,
}

/// Orchestrates solar data access, the frontier tracer, and the frontier
/// store.
///
/// The contract is per-location: [`Self::frontiers_for_location`] returns
/// the mapping for one cell, and [`Self::load_frontiers`] accumulates one
/// entry per requested location. A failure for any location or target
/// aborts the whole batch.
pub struct FrontierService {
    solar: Box<dyn SolarSource>,
    store: Box<dyn FrontierStore>,
    tracer: TracerConfig,
    traces_run: usize,
}

impl FrontierService {
    pub fn new(
        solar: Box<dyn SolarSource>,
        store: Box<dyn FrontierStore>,
        tracer: TracerConfig,
    ) -> Self {
        Self {
            solar,
            store,
            tracer,
            traces_run: 0,
        }
    }

    /// Number of tracer invocations since construction; cache hits do not
    /// count.
    pub fn traces_run(&self) -> usize {
        self.traces_run
    }

    /// Compute or load the frontiers for every reliability target at one
    /// location. Coordinates are floored to integer degrees to match the
    /// spatial resolution of the solar archive.
    pub fn frontiers_for_location(
        &mut self,
        lat: f64,
        lon: f64,
        range: &DateRange,
        targets: &[f64],
        load_type: &str,
    ) -> Result<BTreeMap<ReliabilityKey, Frontier>, FrontierError> {
        for &target in targets {
            if !(target > 0.0 && target <= 1.0) {
                return Err(FrontierError::InvalidReliability(target));
            }
        }

        let cell_lat = lat.floor() as i32;
        let cell_lon = lon.floor() as i32;
        let (insolation, series_id) = self.solar.load_hourly(cell_lat, cell_lon, range)?;

        let mut results = BTreeMap::new();
        let mut pending: Vec<(f64, FrontierKey)> = Vec::new();

        for &target in targets {
            let key = FrontierKey {
                lat: cell_lat,
                lon: cell_lon,
                load_type: load_type.to_string(),
                series_id: series_id.clone(),
                reliability: ReliabilityKey::new(target),
            };
            match self.store.get(&key) {
                Ok(Some(frontier)) => {
                    debug!(cell_lat, cell_lon, %key.reliability, "frontier cache hit");
                    results.insert(key.reliability, frontier);
                }
                Ok(None) => pending.push((target, key)),
                Err(StoreError::Corrupt { key: entry, source }) => {
                    warn!(%entry, %source, "corrupt frontier cache entry, recomputing");
                    pending.push((target, key));
                }
                Err(err) => return Err(err.into()),
            }
        }

        if !pending.is_empty() {
            // The load series is only needed (and the load type only
            // validated against the implemented variants) when something
            // actually has to be computed.
            let load = build_load(load_type, insolation.len())?;
            let system = EnergySystem::new(insolation.clone(), load)?;
            let tracer = FrontierTracer::new(&system, self.tracer.clone());

            for (target, key) in pending {
                info!(cell_lat, cell_lon, target, "tracing frontier");
                let frontier = tracer.trace(target)?;
                self.store.upsert(&key, &frontier)?;
                self.traces_run += 1;
                results.insert(key.reliability, frontier);
            }
        }

        Ok(results)
    }

    /// Batch over locations; returns one [`LocationFrontiers`] per input
    /// location, in order.
    pub fn load_frontiers(
        &mut self,
        locations: &[(f64, f64)],
        range: &DateRange,
        targets: &[f64],
        load_type: &str,
    ) -> Result<Vec<LocationFrontiers>, FrontierError> {
        locations
            .iter()
            .map(|&(lat, lon)| {
                let frontiers =
                    self.frontiers_for_location(lat, lon, range, targets, load_type)?;
                Ok(LocationFrontiers {
                    lat: lat.floor() as i32,
                    lon: lon.floor() as i32,
                    frontiers,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solar::SolarDataError;
    use crate::store::MemoryFrontierStore;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Synthetic solar source: 12 bright hours, 12 dark hours.
    struct FakeSolar;

    impl SolarSource for FakeSolar {
        fn load_hourly(
            &mut self,
            _lat: i32,
            _lon: i32,
            _range: &DateRange,
        ) -> Result<(Vec<f64>, String), SolarDataError> {
            let series = (0..24).map(|h| if h < 12 { 1.0 } else { 0.0 }).collect();
            Ok((series, "series-test".to_string()))
        }
    }

    /// Store spy counting writes through a shared handle.
    struct CountingStore {
        inner: MemoryFrontierStore,
        upserts: Rc<Cell<usize>>,
    }

    impl FrontierStore for CountingStore {
        fn get(&self, key: &FrontierKey) -> Result<Option<Frontier>, StoreError> {
            self.inner.get(key)
        }

        fn upsert(&mut self, key: &FrontierKey, frontier: &Frontier) -> Result<(), StoreError> {
            self.upserts.set(self.upserts.get() + 1);
            self.inner.upsert(key, frontier)
        }
    }

    /// Store whose reads always report corruption.
    struct CorruptStore {
        inner: MemoryFrontierStore,
    }

    impl FrontierStore for CorruptStore {
        fn get(&self, _key: &FrontierKey) -> Result<Option<Frontier>, StoreError> {
            Err(StoreError::Corrupt {
                key: "corrupt-entry".to_string(),
                source: serde_json::from_str::<Frontier>("{").unwrap_err(),
            })
        }

        fn upsert(&mut self, key: &FrontierKey, frontier: &Frontier) -> Result<(), StoreError> {
            self.inner.upsert(key, frontier)
        }
    }

    fn service_with(store: Box<dyn FrontierStore>) -> FrontierService {
        FrontierService::new(Box::new(FakeSolar), store, TracerConfig::default())
    }

    #[test]
    fn computes_once_then_serves_from_cache() {
        let mut service = service_with(Box::new(MemoryFrontierStore::default()));
        let range = DateRange::default();

        let first = service
            .frontiers_for_location(10.0, 10.0, &range, &[0.9], "constant")
            .unwrap();
        assert_eq!(service.traces_run(), 1);
        let frontier = &first[&ReliabilityKey::new(0.9)];
        assert!(!frontier.is_empty());

        // Populated cache: the tracer must not run again.
        let second = service
            .frontiers_for_location(10.0, 10.0, &range, &[0.9], "constant")
            .unwrap();
        assert_eq!(service.traces_run(), 1);
        assert_eq!(second[&ReliabilityKey::new(0.9)], *frontier);
    }

    #[test]
    fn rejects_out_of_range_reliability_before_solving() {
        let upserts = Rc::new(Cell::new(0));
        let store = CountingStore {
            inner: MemoryFrontierStore::default(),
            upserts: Rc::clone(&upserts),
        };
        let mut service = service_with(Box::new(store));
        let range = DateRange::default();

        for bad in [0.0, -0.1, 1.5] {
            let err = service
                .frontiers_for_location(10.0, 10.0, &range, &[bad], "constant")
                .unwrap_err();
            assert!(matches!(err, FrontierError::InvalidReliability(_)));
        }
        assert_eq!(service.traces_run(), 0);
        assert_eq!(upserts.get(), 0);
    }

    #[test]
    fn unsupported_load_type_writes_nothing() {
        let upserts = Rc::new(Cell::new(0));
        let store = CountingStore {
            inner: MemoryFrontierStore::default(),
            upserts: Rc::clone(&upserts),
        };
        let mut service = service_with(Box::new(store));
        let range = DateRange::default();

        let err = service
            .frontiers_for_location(10.0, 10.0, &range, &[0.9], "custom-unimplemented")
            .unwrap_err();
        assert!(matches!(err, FrontierError::UnsupportedLoadType(_)));
        assert_eq!(service.traces_run(), 0);
        assert_eq!(upserts.get(), 0);
    }

    #[test]
    fn corrupt_cache_entries_are_recomputed() {
        let store = CorruptStore {
            inner: MemoryFrontierStore::default(),
        };
        let mut service = service_with(Box::new(store));
        let range = DateRange::default();

        let result = service
            .frontiers_for_location(10.0, 10.0, &range, &[0.9], "constant")
            .unwrap();
        assert_eq!(service.traces_run(), 1);
        assert!(!result[&ReliabilityKey::new(0.9)].is_empty());
    }

    #[test]
    fn batch_returns_one_entry_per_location() {
        let mut service = service_with(Box::new(MemoryFrontierStore::default()));
        let range = DateRange::default();

        let batch = service
            .load_frontiers(
                &[(10.4, 10.6), (11.2, 12.9)],
                &range,
                &[0.9],
                "constant",
            )
            .unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!((batch[0].lat, batch[0].lon), (10, 10));
        assert_eq!((batch[1].lat, batch[1].lon), (11, 12));
        for entry in &batch {
            assert!(!entry.frontiers[&ReliabilityKey::new(0.9)].is_empty());
        }
        assert_eq!(service.traces_run(), 2);
    }
}
