//! Adaptive forward/backward sweep that traces a reliability frontier.
//!
//! Starting from a heuristic midpoint, the tracer grows storage capacity
//! geometrically and solves for the matching solar capacity (forward sweep,
//! until the curve flattens past `max_der`), then shrinks storage toward the
//! minimum admissible level (backward sweep, until the curve steepens past
//! `min_der`). Validation filters the derivative band, rejects positive
//! slopes, and retries the whole trace with a tighter solver tolerance on
//! pronounced non-convexity or a halved step size on sparse output, up to a
//! shared attempt budget.

use itertools::Itertools;
use serde::Deserialize;
use tracing::{debug, warn};

use super::capacity::CapacitySolver;
use super::{Frontier, FrontierPoint};
use crate::error::FrontierError;
use crate::simulation::EnergySystem;
use crate::solver::SolverConfig;

/// Small positive storage floor used when the starting solar capacity alone
/// already exceeds the target: zero storage is numerically degenerate for
/// targets that require night-time supply.
const STORAGE_FLOOR: f64 = 0.001;

/// Below this remaining gap the backward sweep snaps directly onto the
/// minimum storage level instead of stepping geometrically.
const BACKWARD_SNAP: f64 = 0.001;

/// Thresholds for the non-convexity check on second differences of the
/// derivative with respect to storage capacity.
const CONVEXITY_RATIO_LIMIT: f64 = -0.1;
const CONVEXITY_DIFF_LIMIT: f64 = -0.05;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Absolute size of the first forward storage step.
    pub step_size: f64,
    /// Divisor applied to `min(step_size, 1 - reliability)` to obtain the
    /// solver tolerance; multiplied by 10 on non-convexity retries.
    pub max_tol_div: f64,
    /// Near-zero negative slope at which the forward sweep stops.
    pub max_der: f64,
    /// Steep negative slope at which the backward sweep stops, reflecting
    /// an assumed ceiling on the storage-to-solar price ratio.
    pub min_der: f64,
    /// Minimum retained point count before a step-size retry.
    pub min_points: usize,
    /// Shared retry budget across both retry reasons.
    pub max_attempts: usize,
    pub solver: SolverConfig,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            max_tol_div: 100.0,
            max_der: -0.05,
            min_der: -2.0,
            min_points: 10,
            max_attempts: 10,
            solver: SolverConfig::default(),
        }
    }
}

enum RetryReason {
    NonConvex,
    Sparse,
}

enum AttemptFailure {
    Retry(RetryReason),
    Fatal(FrontierError),
}

/// Traces the solar-vs-storage frontier for one validated insolation/load
/// system.
pub struct FrontierTracer<'a> {
    system: &'a EnergySystem,
    config: TracerConfig,
}

impl<'a> FrontierTracer<'a> {
    pub fn new(system: &'a EnergySystem, config: TracerConfig) -> Self {
        Self { system, config }
    }

    /// Trace the frontier for `reliability`, retrying with adjusted
    /// parameters until it validates or the attempt budget runs out.
    pub fn trace(&self, reliability: f64) -> Result<Frontier, FrontierError> {
        if !(reliability > 0.0 && reliability <= 1.0) {
            return Err(FrontierError::InvalidReliability(reliability));
        }

        let mut step_size = self.config.step_size;
        let mut tol_div = self.config.max_tol_div;
        let mut attempt = 0;

        loop {
            match self.trace_once(reliability, step_size, tol_div) {
                Ok(points) => {
                    debug!(
                        reliability,
                        points = points.len(),
                        attempt,
                        "frontier trace complete"
                    );
                    return Ok(Frontier {
                        reliability,
                        points,
                    });
                }
                Err(AttemptFailure::Fatal(err)) => return Err(err),
                Err(AttemptFailure::Retry(reason)) => {
                    if attempt >= self.config.max_attempts {
                        return Err(match reason {
                            RetryReason::NonConvex => FrontierError::NonConvexFrontier {
                                attempts: attempt + 1,
                            },
                            RetryReason::Sparse => FrontierError::SparseFrontier {
                                min_points: self.config.min_points,
                                attempts: attempt + 1,
                            },
                        });
                    }
                    match reason {
                        RetryReason::NonConvex => {
                            tol_div *= 10.0;
                            warn!(
                                reliability,
                                attempt, tol_div, "non-convex frontier, retrying with tighter tolerance"
                            );
                        }
                        RetryReason::Sparse => {
                            step_size /= 2.0;
                            warn!(
                                reliability,
                                attempt, step_size, "sparse frontier, retrying with smaller step"
                            );
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn trace_once(
        &self,
        reliability: f64,
        step_size: f64,
        tol_div: f64,
    ) -> Result<Vec<FrontierPoint>, AttemptFailure> {
        // A target of exactly 1 would zero the tolerance, so keep a floor.
        let tol_x = (step_size.min(1.0 - reliability) / tol_div).max(1e-12);
        let caps = CapacitySolver::new(self.system, reliability, tol_x, &self.config.solver);

        // INIT: a mostly arbitrary midpoint; the sweeps extend it both ways.
        let mut start_solar = 2.0 * self.system.mean_load() / self.system.mean_insolation();
        let mut start_storage = caps
            .solve_storage(start_solar, 0.0)
            .map_err(start_failure)?;
        if start_storage <= 0.0 {
            start_storage = STORAGE_FLOOR;
            start_solar = caps
                .solve_solar(start_storage, start_solar)
                .map_err(start_failure)?;
        }

        // Minimum storage still admissible when solar capacity is very
        // large; lower-bounds the backward sweep.
        let min_storage = caps
            .solve_storage(
                100.0 * self.system.mean_load() / self.system.mean_insolation(),
                0.0,
            )
            .map_err(AttemptFailure::Fatal)?
            .max(0.0);

        // Sized so the first forward step equals `step_size`; subsequent
        // steps are geometric.
        let ratio = step_size / start_storage;

        debug!(
            reliability,
            start_solar, start_storage, min_storage, tol_x, "frontier sweep starting"
        );

        // FORWARD: grow storage by (1 + ratio) per step, solving solar with
        // first-order extrapolated guesses, until the curve flattens past
        // max_der. The seed derivative is a sentinel so the loop runs at
        // least once; the seed itself is discarded afterwards.
        let mut forward = vec![FrontierPoint {
            solar_capacity: start_solar,
            storage_capacity: start_storage,
            derivative: self.config.max_der,
        }];
        loop {
            let last = forward.last().expect("forward sweep is never empty").clone();
            if last.derivative > self.config.max_der {
                break;
            }
            let delta = ratio * last.storage_capacity;
            let storage = last.storage_capacity + delta;
            let guess = last.solar_capacity + delta * last.derivative;
            let solar = caps
                .solve_solar(storage, guess)
                .map_err(AttemptFailure::Fatal)?;
            if solar <= 0.0 {
                // The frontier has flattened onto the storage axis;
                // capacities are never negative, so the sweep ends here.
                break;
            }
            forward.push(FrontierPoint {
                solar_capacity: solar,
                storage_capacity: storage,
                derivative: (solar - last.solar_capacity) / delta,
            });
        }
        forward.remove(0);

        // BACKWARD: shrink storage by (1 - ratio) toward min_storage from
        // the first retained forward point, until the curve steepens past
        // min_der or storage bottoms out.
        let mut backward: Vec<FrontierPoint> = Vec::new();
        if let Some(first) = forward.first() {
            let mut cur = first.clone();
            while cur.derivative >= self.config.min_der && cur.storage_capacity > min_storage {
                let storage = if cur.storage_capacity - min_storage > BACKWARD_SNAP {
                    (cur.storage_capacity * (1.0 - ratio)).max(min_storage)
                } else {
                    min_storage
                };
                let delta = cur.storage_capacity - storage;
                let guess = cur.solar_capacity - delta * cur.derivative;
                let solar = caps
                    .solve_solar(storage, guess)
                    .map_err(AttemptFailure::Fatal)?;
                let point = FrontierPoint {
                    solar_capacity: solar,
                    storage_capacity: storage,
                    derivative: (cur.solar_capacity - solar) / delta,
                };
                backward.push(point.clone());
                cur = point;
            }
        }

        // Concatenate into a single storage-ascending sequence.
        backward.reverse();
        backward.extend(forward);
        let mut points = backward;

        // VALIDATE: keep the admissible derivative band, dropping boundary
        // artifacts from the sweep starts.
        points.retain(|p| {
            p.derivative >= self.config.min_der && p.derivative <= self.config.max_der
        });

        if points.iter().any(|p| p.derivative > 0.0) {
            return Err(AttemptFailure::Fatal(FrontierError::NonMonotoneFrontier));
        }

        for (a, b) in points.iter().tuple_windows() {
            let second_diff = b.derivative - a.derivative;
            let storage_step = b.storage_capacity - a.storage_capacity;
            if second_diff / storage_step < CONVEXITY_RATIO_LIMIT
                && second_diff < CONVEXITY_DIFF_LIMIT
            {
                return Err(AttemptFailure::Retry(RetryReason::NonConvex));
            }
        }

        if points.len() < self.config.min_points {
            return Err(AttemptFailure::Retry(RetryReason::Sparse));
        }

        Ok(points)
    }
}

fn start_failure(err: FrontierError) -> AttemptFailure {
    AttemptFailure::Fatal(FrontierError::FrontierStartFailure {
        source: Box::new(err),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_system() -> EnergySystem {
        EnergySystem::new(vec![1.0; 24], vec![1.0 / 24.0; 24]).unwrap()
    }

    fn day_night_system() -> EnergySystem {
        let insolation: Vec<f64> = (0..24).map(|h| if h < 12 { 1.0 } else { 0.0 }).collect();
        let load = vec![1.0 / 24.0; 24];
        EnergySystem::new(insolation, load).unwrap()
    }

    fn assert_frontier_shape(frontier: &Frontier, config: &TracerConfig) {
        assert!(frontier.len() >= config.min_points);
        for (a, b) in frontier.points.iter().tuple_windows() {
            assert!(
                b.storage_capacity > a.storage_capacity,
                "storage must be strictly ascending"
            );
            assert!(
                b.solar_capacity <= a.solar_capacity + 1e-9,
                "solar must be non-increasing"
            );
        }
        for p in &frontier.points {
            assert!(p.derivative < 0.0);
            assert!(p.derivative >= config.min_der && p.derivative <= config.max_der);
            assert!(p.solar_capacity >= 0.0 && p.storage_capacity >= 0.0);
        }
    }

    #[test]
    fn traces_constant_sun_frontier() {
        // Constant insolation keeps the frontier linear with slope -1/24,
        // flatter than the default -0.05 band, so widen max_der.
        let system = constant_system();
        let config = TracerConfig {
            max_der: -0.02,
            ..TracerConfig::default()
        };
        let tracer = FrontierTracer::new(&system, config.clone());

        let frontier = tracer.trace(0.9).unwrap();
        assert_frontier_shape(&frontier, &config);

        // Every retained point must reproduce the target reliability.
        for p in &frontier.points {
            let realized = system.reliability(p.solar_capacity, p.storage_capacity);
            assert!(
                (realized - 0.9).abs() < 1e-3,
                "point ({}, {}) realized {realized}",
                p.solar_capacity,
                p.storage_capacity
            );
        }
    }

    #[test]
    fn traces_day_night_frontier_with_defaults() {
        let system = day_night_system();
        let config = TracerConfig::default();
        let tracer = FrontierTracer::new(&system, config.clone());

        let frontier = tracer.trace(0.9).unwrap();
        assert_frontier_shape(&frontier, &config);

        // Night-time supply requires storage: the backward sweep is
        // bounded away from zero.
        let min_storage = frontier.storage_capacities().next().unwrap();
        assert!(min_storage > 0.3);

        for p in &frontier.points {
            let realized = system.reliability(p.solar_capacity, p.storage_capacity);
            assert!((realized - 0.9).abs() < 1e-3);
        }
    }

    #[test]
    fn rejects_out_of_range_reliability() {
        let system = constant_system();
        let tracer = FrontierTracer::new(&system, TracerConfig::default());
        assert!(matches!(
            tracer.trace(0.0),
            Err(FrontierError::InvalidReliability(_))
        ));
        assert!(matches!(
            tracer.trace(1.5),
            Err(FrontierError::InvalidReliability(_))
        ));
    }

    #[test]
    fn dark_location_fails_at_the_start() {
        // Zero insolation everywhere: no starting point can be established.
        let system = EnergySystem::new(vec![0.0; 24], vec![1.0 / 24.0; 24]).unwrap();
        let tracer = FrontierTracer::new(&system, TracerConfig::default());
        let err = tracer.trace(0.9).unwrap_err();
        assert!(matches!(err, FrontierError::FrontierStartFailure { .. }));
    }

    #[test]
    fn exhausted_retries_report_sparse_frontier() {
        // A tiny attempt budget cannot refine the flat constant-sun curve
        // enough to reach the minimum point count.
        let system = constant_system();
        let config = TracerConfig {
            max_der: -0.02,
            max_attempts: 1,
            ..TracerConfig::default()
        };
        let tracer = FrontierTracer::new(&system, config);
        let err = tracer.trace(0.9).unwrap_err();
        assert!(matches!(
            err,
            FrontierError::SparseFrontier { min_points: 10, attempts: 2 }
        ));
    }
}
