//! Adaptive Gauss-Kronrod quadrature.
//!
//! Each interval is integrated with the 15-point Kronrod rule; the embedded
//! 7-point Gauss rule supplies the error estimate `|K15 - G7|`. The interval
//! with the largest estimate is bisected until the summed estimate falls below
//! `max(abs_tol, rel_tol·|I|)` or the subdivision budget is spent.

use crate::config::QuadratureOptions;

use super::{SolverError, SolverResult};

/// Kronrod abscissae on [-1, 1] (non-negative half, descending).
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

/// Kronrod weights matching [`XGK`].
const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

/// Gauss weights at `XGK[1]`, `XGK[3]`, `XGK[5]` and the centre.
const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// Result of an integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integral {
    /// Integral estimate
    pub value: f64,
    /// Estimated absolute error
    pub abs_error: f64,
    /// Number of bisections performed
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Adaptive G7/K15 integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussKronrod {
    abs_tol: f64,
    rel_tol: f64,
    max_subdivisions: usize,
}

impl GaussKronrod {
    /// Creates an integrator from quadrature options.
    pub fn new(options: &QuadratureOptions) -> Self {
        GaussKronrod {
            abs_tol: options.abs_tol,
            rel_tol: options.rel_tol,
            max_subdivisions: options.max_subdivisions,
        }
    }

    /// Integrates `f` over `[a, b]`.
    ///
    /// # Errors
    ///
    /// * [`SolverError::InvalidInterval`] if a bound is not finite
    /// * [`SolverError::NonFiniteIntegrand`] if `f` returns NaN or infinity
    /// * [`SolverError::QuadratureNonConvergence`] if the error target is not
    ///   met within the subdivision budget
    pub fn integrate<F>(&self, mut f: F, a: f64, b: f64) -> SolverResult<Integral>
    where
        F: FnMut(f64) -> f64,
    {
        if !a.is_finite() || !b.is_finite() {
            return Err(SolverError::InvalidInterval(a, b));
        }
        if a == b {
            return Ok(Integral { value: 0.0, abs_error: 0.0, subdivisions: 0 });
        }

        let mut segments = vec![kronrod_segment(&mut f, a, b)?];
        let mut subdivisions = 0;

        loop {
            let value: f64 = segments.iter().map(|s| s.value).sum();
            let error: f64 = segments.iter().map(|s| s.error).sum();

            if error <= self.abs_tol.max(self.rel_tol * value.abs()) {
                return Ok(Integral { value, abs_error: error, subdivisions });
            }
            if subdivisions >= self.max_subdivisions {
                return Err(SolverError::QuadratureNonConvergence {
                    subdivisions,
                    estimated_error: error,
                });
            }

            // Bisect the interval with the largest error estimate
            let worst = segments
                .iter()
                .enumerate()
                .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
                .map(|(index, _)| index)
                .unwrap_or(0);
            let segment = segments.swap_remove(worst);
            let mid = 0.5 * (segment.a + segment.b);
            segments.push(kronrod_segment(&mut f, segment.a, mid)?);
            segments.push(kronrod_segment(&mut f, mid, segment.b)?);
            subdivisions += 1;
        }
    }
}

fn finite_value<F: FnMut(f64) -> f64>(f: &mut F, x: f64) -> SolverResult<f64> {
    let value = f(x);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SolverError::NonFiniteIntegrand { x })
    }
}

fn kronrod_segment<F: FnMut(f64) -> f64>(f: &mut F, a: f64, b: f64) -> SolverResult<Segment> {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = finite_value(f, center)?;
    let mut kronrod = fc * WGK[7];
    let mut gauss = fc * WG[3];

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = finite_value(f, center - dx)? + finite_value(f, center + dx)?;
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    Ok(Segment { a, b, value: kronrod * half, error: ((kronrod - gauss) * half).abs() })
}
