//! Gradient evaluation using `num-dual`.
//!
//! Scalar thermodynamic functions written generically over
//! `D: DualNum<f64> + Copy` can be differentiated exactly with forward-mode
//! automatic differentiation: one pass per independent variable, each seeding
//! a unit derivative on that variable only.
//!
//! # Example
//!
//! ```
//! use miedema_mix::autodiff::compute_gradient;
//! use num_dual::Dual64;
//!
//! // f(x, y) = x^2 y
//! let f = |v: &[Dual64]| v[0] * v[0] * v[1];
//! let (value, grad) = compute_gradient(f, &[2.0, 3.0]);
//! assert_eq!(value, 12.0);
//! assert!((grad[0] - 12.0).abs() < 1e-12);
//! assert!((grad[1] - 4.0).abs() < 1e-12);
//! ```

use nalgebra::DVector;
use num_dual::*;

/// Computes the value and gradient of a scalar function using forward-mode AD.
///
/// # Arguments
///
/// * `f` - Scalar function of a slice of dual numbers
/// * `x` - Point at which to evaluate the gradient
///
/// # Returns
///
/// `(f(x), ∇f(x))`. For an empty `x` the gradient is empty and the value is
/// obtained from a single evaluation.
pub fn compute_gradient<F>(f: F, x: &[f64]) -> (f64, DVector<f64>)
where
    F: Fn(&[Dual64]) -> Dual64,
{
    let n_vars = x.len();
    if n_vars == 0 {
        let value = f(&[]);
        return (value.re, DVector::zeros(0));
    }

    let mut value = 0.0;
    let mut gradient = DVector::zeros(n_vars);

    for j in 0..n_vars {
        // Seed a unit derivative on variable j only
        let x_dual: Vec<Dual64> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| if i == j { Dual64::new(v, 1.0) } else { Dual64::from(v) })
            .collect();

        let result = f(&x_dual);
        if j == 0 {
            value = result.re;
        }
        gradient[j] = result.eps;
    }

    (value, gradient)
}

/// Central (or one-sided) finite-difference derivative of a scalar function.
///
/// `lower` and `upper` are the abscissae actually evaluated; callers choose
/// them so that both remain inside the function's domain.
pub fn finite_difference<F>(f: F, lower: f64, upper: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    (f(upper) - f(lower)) / (upper - lower)
}
