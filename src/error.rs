use thiserror::Error;

use crate::solver::SolverStatus;

/// Failures raised while tracing or orchestrating reliability frontiers.
///
/// The tracer is the only component with local recovery (bounded retries on
/// `NonConvexFrontier` / `SparseFrontier` conditions before they surface
/// here); everything else propagates unmodified to the caller.
#[derive(Debug, Error)]
pub enum FrontierError {
    /// The root finder did not converge. Fatal to the current tracing
    /// attempt; callers must not substitute a default capacity.
    #[error("root solver did not converge ({status:?}): {message}")]
    SolveDivergence {
        status: SolverStatus,
        message: String,
    },

    /// No starting point for the sweep could be established.
    #[error("could not establish a frontier starting point")]
    FrontierStartFailure {
        #[source]
        source: Box<FrontierError>,
    },

    /// A retained frontier derivative was positive, meaning solar and
    /// storage capacity do not trade off. Signals a modeling error.
    #[error("frontier derivative dSolar/dStorage is positive")]
    NonMonotoneFrontier,

    /// The frontier stayed significantly non-convex after all tolerance
    /// retries were exhausted.
    #[error("frontier is significantly non-convex after {attempts} attempts")]
    NonConvexFrontier { attempts: usize },

    /// Too few points survived validation after all step-size retries.
    #[error("frontier has fewer than {min_points} points after {attempts} attempts")]
    SparseFrontier {
        min_points: usize,
        attempts: usize,
    },

    /// Reliability targets must satisfy `0 < r <= 1`.
    #[error("reliability must satisfy 0 < r <= 1, got {0}")]
    InvalidReliability(f64),

    /// Only the `constant` load type is implemented.
    #[error("unsupported load type {0:?}")]
    UnsupportedLoadType(String),

    #[error(transparent)]
    Simulation(#[from] crate::simulation::SimulationError),

    #[error(transparent)]
    SolarData(#[from] crate::solar::SolarDataError),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}
