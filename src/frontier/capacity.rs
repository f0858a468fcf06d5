//! Solving one capacity for a reliability target while the other is fixed.

use crate::error::FrontierError;
use crate::simulation::EnergySystem;
use crate::solver::{ScalarRootSolver, SolverConfig};

/// Wraps the scalar root finder around the reliability simulation.
///
/// The residual is `target - reliability(solar, storage)` in the free
/// capacity. A root at or below the physical lower bound 0 is reported as
/// exactly 0; a non-converged solve is a [`FrontierError::SolveDivergence`]
/// that callers must treat as fatal to the current tracing attempt.
pub struct CapacitySolver<'a> {
    system: &'a EnergySystem,
    target: f64,
    solver: ScalarRootSolver,
}

impl<'a> CapacitySolver<'a> {
    pub fn new(
        system: &'a EnergySystem,
        target: f64,
        x_tolerance: f64,
        config: &SolverConfig,
    ) -> Self {
        Self {
            system,
            target,
            solver: ScalarRootSolver::from_config(x_tolerance, config).with_lower_bound(0.0),
        }
    }

    /// Storage capacity achieving the target at fixed solar capacity.
    pub fn solve_storage(&self, solar_capacity: f64, guess: f64) -> Result<f64, FrontierError> {
        self.solve(|storage| self.target - self.system.reliability(solar_capacity, storage), guess)
    }

    /// Solar capacity achieving the target at fixed storage capacity.
    pub fn solve_solar(&self, storage_capacity: f64, guess: f64) -> Result<f64, FrontierError> {
        self.solve(|solar| self.target - self.system.reliability(solar, storage_capacity), guess)
    }

    fn solve<F: Fn(f64) -> f64>(&self, residual: F, guess: f64) -> Result<f64, FrontierError> {
        // Reliability never decreases in either capacity, so a non-positive
        // residual at zero means the root lies at or below the physical
        // boundary.
        if residual(0.0) <= 0.0 {
            return Ok(0.0);
        }

        let report = self.solver.solve(residual, guess);
        if report.converged() {
            Ok(report.root)
        } else {
            Err(FrontierError::SolveDivergence {
                status: report.status,
                message: report.describe(),
            })
        }
    }
}
