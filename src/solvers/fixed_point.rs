//! Bounded fixed-point iteration.
//!
//! Iterates `x ← g(x)` from a starting point until consecutive iterates agree
//! within an absolute tolerance, an iteration cap is hit, or a wall-clock budget
//! runs out. The iterate type is generic over [`DualNum`] so derivatives can be
//! carried through the iteration; convergence is judged on the real parts.
//!
//! # Algorithm
//!
//! ```text
//! for n in 1..=max_iterations:
//!     x_next = g(x)
//!     if max |x_next - x| < tolerance: converged
//!     if elapsed > timeout: timed out
//!     x = x_next
//! ```

use std::time::{Duration, Instant};

use num_dual::DualNum;

use crate::config::VolumeSolverOptions;

/// Outcome of a bounded iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Convergence {
    /// Tolerance met after the given number of updates
    Converged { iterations: usize },
    /// Iteration cap reached; the last iterate is returned
    IterationLimit { iterations: usize },
    /// Wall-clock budget exceeded; the last iterate is returned
    TimedOut { iterations: usize, elapsed: Duration },
}

impl Convergence {
    /// Returns true if the tolerance was met.
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }

    /// Number of updates performed.
    pub fn iterations(&self) -> usize {
        match *self {
            Convergence::Converged { iterations }
            | Convergence::IterationLimit { iterations }
            | Convergence::TimedOut { iterations, .. } => iterations,
        }
    }
}

/// Final iterate together with its convergence status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPointSolution<D, const N: usize> {
    /// Last iterate
    pub values: [D; N],
    /// How the iteration stopped
    pub status: Convergence,
}

/// Fixed-point iteration with tolerance, iteration cap and timeout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPointIteration {
    /// Absolute tolerance on every component
    pub tolerance: f64,
    /// Maximum number of updates
    pub max_iterations: usize,
    /// Wall-clock budget
    pub timeout: Duration,
}

impl FixedPointIteration {
    /// Creates a new iteration policy.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - Absolute tolerance on consecutive iterates
    /// * `max_iterations` - Maximum number of updates
    /// * `timeout` - Wall-clock budget
    pub fn new(tolerance: f64, max_iterations: usize, timeout: Duration) -> Self {
        FixedPointIteration { tolerance, max_iterations, timeout }
    }

    /// Iteration policy of the atomic volume solver.
    pub fn from_options(options: &VolumeSolverOptions) -> Self {
        Self::new(options.tolerance, options.max_iterations, options.timeout())
    }

    /// Iterates `map` from `start`.
    ///
    /// Never fails: when a limit is reached the last iterate is returned with
    /// a non-converged status for the caller to report.
    pub fn iterate<D, const N: usize, F>(
        &self,
        start: [D; N],
        mut map: F,
    ) -> FixedPointSolution<D, N>
    where
        D: DualNum<f64> + Copy,
        F: FnMut(&[D; N]) -> [D; N],
    {
        let started = Instant::now();
        let mut current = start;

        for iteration in 1..=self.max_iterations {
            let next = map(&current);
            let step = current
                .iter()
                .zip(next.iter())
                .map(|(old, new)| (new.re() - old.re()).abs())
                .fold(0.0, f64::max);
            current = next;

            if step < self.tolerance {
                log::trace!("fixed point converged after {} iterations", iteration);
                return FixedPointSolution {
                    values: current,
                    status: Convergence::Converged { iterations: iteration },
                };
            }

            let elapsed = started.elapsed();
            if elapsed > self.timeout {
                log::debug!(
                    "fixed point iteration did not converge within {:.1} s ({} iterations)",
                    self.timeout.as_secs_f64(),
                    iteration
                );
                return FixedPointSolution {
                    values: current,
                    status: Convergence::TimedOut { iterations: iteration, elapsed },
                };
            }
        }

        log::debug!(
            "fixed point iteration did not converge within {} iterations",
            self.max_iterations
        );
        FixedPointSolution {
            values: current,
            status: Convergence::IterationLimit { iterations: self.max_iterations },
        }
    }
}

impl Default for FixedPointIteration {
    fn default() -> Self {
        Self::from_options(&VolumeSolverOptions::default())
    }
}
