//! Scalar nonlinear-equation root finding.
//!
//! The frontier code needs `f(x) = 0` solved for residuals built around the
//! reliability simulation, with an absolute tolerance on the independent
//! variable and a convergence status the caller can trust. The solver first
//! brackets the root by geometric expansion around the initial guess, then
//! refines with the Illinois variant of regula falsi.
//!
//! The residuals solved here cross zero once in the search region; the
//! bracketing phase reports `NoBracket` when no sign change can be found
//! within the expansion budget.

use serde::Deserialize;

/// Outcome classification for a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Bracket width shrank below the x tolerance.
    Converged,
    /// No sign change found within the expansion budget.
    NoBracket,
    /// Iteration cap reached before the bracket closed.
    MaxIterations,
}

/// Root estimate plus convergence diagnostics.
#[derive(Debug, Clone)]
pub struct RootReport {
    pub root: f64,
    pub residual: f64,
    pub iterations: usize,
    pub status: SolverStatus,
}

impl RootReport {
    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    /// One-line diagnostic for error messages.
    pub fn describe(&self) -> String {
        format!(
            "status {:?} after {} iterations, x = {:.6e}, residual = {:.3e}",
            self.status, self.iterations, self.root, self.residual
        )
    }
}

/// Iteration and expansion budgets, configurable from the application
/// config. The x tolerance is supplied per solve by the tracer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub max_expansions: usize,
    pub initial_step: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_expansions: 64,
            initial_step: 0.01,
        }
    }
}

/// Bracketing scalar root finder.
#[derive(Debug, Clone)]
pub struct ScalarRootSolver {
    x_tolerance: f64,
    max_iterations: usize,
    max_expansions: usize,
    initial_step: f64,
    lower_bound: f64,
}

impl ScalarRootSolver {
    pub fn new(x_tolerance: f64) -> Self {
        let defaults = SolverConfig::default();
        Self {
            x_tolerance,
            max_iterations: defaults.max_iterations,
            max_expansions: defaults.max_expansions,
            initial_step: defaults.initial_step,
            lower_bound: f64::NEG_INFINITY,
        }
    }

    pub fn from_config(x_tolerance: f64, config: &SolverConfig) -> Self {
        Self {
            x_tolerance,
            max_iterations: config.max_iterations,
            max_expansions: config.max_expansions,
            initial_step: config.initial_step,
            lower_bound: f64::NEG_INFINITY,
        }
    }

    /// Restrict the search domain from below. The bracket never expands
    /// past this bound.
    pub fn with_lower_bound(mut self, lower: f64) -> Self {
        self.lower_bound = lower;
        self
    }

    /// Find a root of `f` near `x0`.
    pub fn solve<F: Fn(f64) -> f64>(&self, f: F, x0: f64) -> RootReport {
        let start = x0.max(self.lower_bound);
        let f_start = f(start);
        if !f_start.is_finite() {
            return RootReport {
                root: start,
                residual: f_start,
                iterations: 0,
                status: SolverStatus::NoBracket,
            };
        }
        if f_start == 0.0 {
            return RootReport {
                root: start,
                residual: 0.0,
                iterations: 0,
                status: SolverStatus::Converged,
            };
        }

        match self.bracket(&f, start, f_start) {
            Some((a, fa, b, fb)) => self.illinois(&f, a, fa, b, fb),
            None => RootReport {
                root: start,
                residual: f_start,
                iterations: 0,
                status: SolverStatus::NoBracket,
            },
        }
    }

    /// Walk outward from the starting point in geometrically growing steps,
    /// upward and (down to the lower bound) downward, until a sign change
    /// appears between adjacent samples.
    fn bracket<F: Fn(f64) -> f64>(
        &self,
        f: &F,
        start: f64,
        f_start: f64,
    ) -> Option<(f64, f64, f64, f64)> {
        let mut step = self.initial_step.max(self.x_tolerance * 4.0);
        let mut up_x = start;
        let mut up_f = f_start;
        let mut down_x = start;
        let mut down_f = f_start;

        for _ in 0..self.max_expansions {
            let next_up = up_x + step;
            let f_up = f(next_up);
            if !f_up.is_finite() {
                return None;
            }
            if f_up.signum() != f_start.signum() || f_up == 0.0 {
                return Some((up_x, up_f, next_up, f_up));
            }
            up_x = next_up;
            up_f = f_up;

            if down_x > self.lower_bound {
                let next_down = (down_x - step).max(self.lower_bound);
                let f_down = f(next_down);
                if !f_down.is_finite() {
                    return None;
                }
                if f_down.signum() != f_start.signum() || f_down == 0.0 {
                    return Some((next_down, f_down, down_x, down_f));
                }
                down_x = next_down;
                down_f = f_down;
            }

            step *= 2.0;
        }
        None
    }

    /// Regula falsi with the Illinois modification: when the same endpoint
    /// is retained twice in a row, its residual is halved so the bracket
    /// cannot stagnate.
    fn illinois<F: Fn(f64) -> f64>(
        &self,
        f: &F,
        mut a: f64,
        mut fa: f64,
        mut b: f64,
        mut fb: f64,
    ) -> RootReport {
        let mut side = 0i8;
        let mut root = 0.5 * (a + b);
        let mut residual = f64::NAN;

        for iteration in 1..=self.max_iterations {
            let denom = fb - fa;
            let mut x = if denom != 0.0 {
                (a * fb - b * fa) / denom
            } else {
                0.5 * (a + b)
            };
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            if !x.is_finite() || x <= lo || x >= hi {
                x = 0.5 * (a + b);
            }

            let fx = f(x);
            root = x;
            residual = fx;

            if fx == 0.0 || (b - a).abs() <= self.x_tolerance {
                return RootReport {
                    root,
                    residual,
                    iterations: iteration,
                    status: SolverStatus::Converged,
                };
            }

            if fx.signum() == fb.signum() {
                b = x;
                fb = fx;
                if side == -1 {
                    fa *= 0.5;
                }
                side = -1;
            } else {
                a = x;
                fa = fx;
                if side == 1 {
                    fb *= 0.5;
                }
                side = 1;
            }
        }

        RootReport {
            root,
            residual,
            iterations: self.max_iterations,
            status: SolverStatus::MaxIterations,
        }
    }
}
