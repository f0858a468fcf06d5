//! Frontier tracing: the locus of (solar capacity, storage capacity) pairs
//! that exactly achieve a reliability target.

pub mod capacity;
pub mod tracer;

use serde::{Deserialize, Serialize};

pub use capacity::CapacitySolver;
pub use tracer::{FrontierTracer, TracerConfig};

/// One point on a reliability frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Solar generation capacity (units of power).
    pub solar_capacity: f64,
    /// Storage capacity (units of power x period).
    pub storage_capacity: f64,
    /// Local slope dSolar/dStorage, expected negative on a valid frontier.
    pub derivative: f64,
}

/// An efficient solar-vs-storage boundary for one reliability target,
/// ordered by increasing storage capacity. Immutable once returned by the
/// tracer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frontier {
    pub reliability: f64,
    pub points: Vec<FrontierPoint>,
}

impl Frontier {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn solar_capacities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.solar_capacity)
    }

    pub fn storage_capacities(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.storage_capacity)
    }

    pub fn derivatives(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.derivative)
    }
}
