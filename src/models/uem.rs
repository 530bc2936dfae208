//! Unified extrapolation models.
//!
//! Both variants measure a property difference `d` between pairs of
//! components and combine them as
//!
//! ```text
//! α(k, i, j) = d_kj / (d_kj + d_ki) · exp(-d_ki)
//! ```
//!
//! UEM1 takes `d` from the infinite-dilution activity coefficients of each
//! binary; UEM2_N takes it from integrated excess Gibbs energies.

use super::{unified_coefficient, ContributionModel, ModelContext, DEGENERATE_DENOMINATOR};
use crate::elements::ElementStore;
use crate::EngineResult;

/// UEM1: property difference from dilute activity coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uem1;

/// UEM2_N: property difference from integrated excess Gibbs energies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uem2N;

/// `|ln γ∞_k - ln γ∞_i|` of the `i-k` binary.
fn dilute_difference<S: ElementStore + ?Sized>(
    ctx: &ModelContext<'_, S>,
    k: &str,
    i: &str,
) -> EngineResult<f64> {
    let binary = ctx.binary(i, k)?;
    let ln_gamma_i = binary.ln_gamma_infinite_a()?;
    let ln_gamma_k = binary.ln_gamma_infinite_b()?;
    Ok((ln_gamma_k - ln_gamma_i).abs())
}

/// `∫₀¹ G^E_ab(x, 1-x) dx`.
fn integrated_gibbs<S: ElementStore + ?Sized>(
    ctx: &ModelContext<'_, S>,
    a: &str,
    b: &str,
) -> EngineResult<f64> {
    let binary = ctx.binary(a, b)?;
    let t = ctx.temperature;
    ctx.integrate_unit(|x| binary.excess_gibbs(x, 1.0 - x, t))
}

/// `|(p - q) / (p + q)|`, zero when `p + q` vanishes.
fn relative_difference(p: f64, q: f64) -> f64 {
    let sum = p + q;
    if sum.abs() < DEGENERATE_DENOMINATOR {
        0.0
    } else {
        ((p - q) / sum).abs()
    }
}

impl ContributionModel for Uem1 {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64> {
        let d_ki = dilute_difference(ctx, k, i)?;
        let d_kj = dilute_difference(ctx, k, j)?;
        Ok(unified_coefficient(d_ki, d_kj))
    }
}

impl ContributionModel for Uem2N {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64> {
        let w_kj = integrated_gibbs(ctx, k, j)?;
        let w_ij = integrated_gibbs(ctx, i, j)?;
        let w_ki = integrated_gibbs(ctx, k, i)?;
        let w_ji = integrated_gibbs(ctx, j, i)?;

        let d_kj = relative_difference(w_ki, w_ji);
        let d_ki = relative_difference(w_kj, w_ij);
        Ok(unified_coefficient(d_ki, d_kj))
    }
}
