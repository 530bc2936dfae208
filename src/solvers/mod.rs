//! Numerical solvers used by the thermodynamic models.
//!
//! # Submodules
//!
//! - [`fixed_point`]: Bounded fixed-point iteration for the self-consistent
//!   atomic volumes of a binary alloy. Non-convergence is reported as a
//!   [`Convergence`] status, never as an error.
//! - [`quadrature`]: Adaptive Gauss-Kronrod (7/15) integration of excess Gibbs
//!   curves over the composition interval.
//!
//! # Usage Pattern
//!
//! ```
//! use miedema_mix::solvers::{FixedPointIteration, GaussKronrod};
//! use miedema_mix::config::QuadratureOptions;
//! use std::time::Duration;
//!
//! // x = cos(x)
//! let solver = FixedPointIteration::new(1e-10, 500, Duration::from_secs(1));
//! let solution = solver.iterate([1.0f64], |x| [x[0].cos()]);
//! assert!(solution.status.is_converged());
//!
//! let integral = GaussKronrod::new(&QuadratureOptions::default())
//!     .integrate(|x| x * (1.0 - x), 0.0, 1.0)
//!     .unwrap();
//! assert!((integral.value - 1.0 / 6.0).abs() < 1e-12);
//! ```

pub mod fixed_point;
pub mod quadrature;

pub use fixed_point::{Convergence, FixedPointIteration, FixedPointSolution};
pub use quadrature::{GaussKronrod, Integral};

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Errors that can occur in the numerical routines.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// Subdivision budget exhausted before the error target was met
    #[error(
        "Quadrature did not converge after {subdivisions} subdivisions \
         (estimated error {estimated_error:.3e})"
    )]
    QuadratureNonConvergence { subdivisions: usize, estimated_error: f64 },
    /// Integrand returned NaN or infinity
    #[error("Integrand is not finite at x = {x}")]
    NonFiniteIntegrand { x: f64 },
    /// Integration bounds are not finite
    #[error("Invalid integration interval [{0}, {1}]")]
    InvalidInterval(f64, f64),
}
