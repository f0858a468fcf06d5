use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use solar_reliability_frontier::config::Config;
use solar_reliability_frontier::orchestrator::FrontierService;
use solar_reliability_frontier::solar::{NasaSseClient, SolarDataService};
use solar_reliability_frontier::store::JsonFileStore;
use solar_reliability_frontier::telemetry::init_tracing;

fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    let client = NasaSseClient::new(
        &cfg.solar.base_url,
        Duration::from_secs(cfg.solar.http_timeout_seconds),
    )?;
    let solar = SolarDataService::new(client, Box::new(JsonFileStore::new(&cfg.store.data_dir)));
    let frontier_store = JsonFileStore::new(&cfg.store.data_dir);
    let mut service =
        FrontierService::new(Box::new(solar), Box::new(frontier_store), cfg.tracer.clone());

    let locations: Vec<(f64, f64)> = cfg
        .run
        .locations
        .iter()
        .map(|&[lat, lon]| (lat, lon))
        .collect();
    info!(
        locations = locations.len(),
        targets = cfg.run.reliabilities.len(),
        load_type = %cfg.run.load_type,
        "computing reliability frontiers"
    );

    let results = service.load_frontiers(
        &locations,
        &cfg.solar.range,
        &cfg.run.reliabilities,
        &cfg.run.load_type,
    )?;

    fs::create_dir_all(&cfg.run.output_dir)
        .with_context(|| format!("creating output dir {}", cfg.run.output_dir))?;
    for entry in &results {
        let path = Path::new(&cfg.run.output_dir)
            .join(format!("frontiers-{}_{}.json", entry.lat, entry.lon));
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(
            lat = entry.lat,
            lon = entry.lon,
            frontiers = entry.frontiers.len(),
            path = %path.display(),
            "wrote frontier set"
        );
    }

    info!(traces_run = service.traces_run(), "all frontiers computed");
    Ok(())
}
