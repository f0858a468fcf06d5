//! End-to-end pipeline test: orchestrator over a file-backed store, with a
//! synthetic solar source standing in for the archive.

use solar_reliability_frontier::frontier::TracerConfig;
use solar_reliability_frontier::orchestrator::FrontierService;
use solar_reliability_frontier::solar::{DateRange, SolarDataError, SolarSource};
use solar_reliability_frontier::store::{JsonFileStore, ReliabilityKey};

/// 12 bright hours at 1.0 kW/m^2, 12 dark hours.
struct HalfDaySun;

impl SolarSource for HalfDaySun {
    fn load_hourly(
        &mut self,
        _lat: i32,
        _lon: i32,
        _range: &DateRange,
    ) -> Result<(Vec<f64>, String), SolarDataError> {
        let series = (0..24).map(|h| if h < 12 { 1.0 } else { 0.0 }).collect();
        Ok((series, "half-day-sun".to_string()))
    }
}

fn service_over(dir: &std::path::Path) -> FrontierService {
    FrontierService::new(
        Box::new(HalfDaySun),
        Box::new(JsonFileStore::new(dir)),
        TracerConfig::default(),
    )
}

#[test]
fn frontiers_persist_across_service_instances() {
    let dir = tempfile::tempdir().unwrap();
    let range = DateRange::default();
    let targets = [0.9, 0.95];

    let mut first = service_over(dir.path());
    let computed = first
        .frontiers_for_location(10.0, 10.0, &range, &targets, "constant")
        .unwrap();
    assert_eq!(first.traces_run(), 2);
    assert_eq!(computed.len(), 2);
    for target in targets {
        let frontier = &computed[&ReliabilityKey::new(target)];
        assert!(!frontier.is_empty());
        assert_eq!(frontier.reliability, target);
    }

    // One JSON file per frontier.
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 2);

    // A fresh service over the same directory serves everything from disk.
    let mut second = service_over(dir.path());
    let reloaded = second
        .frontiers_for_location(10.0, 10.0, &range, &targets, "constant")
        .unwrap();
    assert_eq!(second.traces_run(), 0);
    assert_eq!(reloaded, computed);
}

#[test]
fn higher_reliability_costs_more_storage() {
    let dir = tempfile::tempdir().unwrap();
    let range = DateRange::default();

    let mut service = service_over(dir.path());
    let frontiers = service
        .frontiers_for_location(10.0, 10.0, &range, &[0.9, 0.95], "constant")
        .unwrap();

    let min_storage = |target: f64| {
        frontiers[&ReliabilityKey::new(target)]
            .points
            .iter()
            .map(|p| p.storage_capacity)
            .fold(f64::INFINITY, f64::min)
    };
    assert!(min_storage(0.95) > min_storage(0.9));
}
