//! # Solar Reliability Frontier
//!
//! Computes, for a geographic location and an electrical load profile, the
//! efficient trade-off curve between solar generation capacity and energy
//! storage capacity required to meet a target fraction of demand.
//!
//! ## Components
//!
//! - **Simulation**: discrete-time state-of-charge simulation yielding the
//!   realized reliability and per-period unmet load
//! - **Solver**: scalar nonlinear-equation root finder with bracketing and
//!   Illinois refinement
//! - **Frontier**: capacity solver and the forward/backward sweep tracer with
//!   convexity and density validation
//! - **Solar**: NASA SSE daily insolation fetch plus clear-sky hourly
//!   disaggregation, with fetch-or-cache semantics
//! - **Store**: keyed persistence of solar series and computed frontiers
//! - **Orchestrator**: per-location cache-aware batch driver

pub mod config;
pub mod error;
pub mod frontier;
pub mod orchestrator;
pub mod simulation;
pub mod solar;
pub mod solver;
pub mod store;
pub mod telemetry;

pub use error::FrontierError;
pub use frontier::{Frontier, FrontierPoint, FrontierTracer, TracerConfig};
pub use orchestrator::FrontierService;
pub use simulation::{EnergySystem, SimulationOutcome};
pub use solver::{RootReport, ScalarRootSolver, SolverStatus};
