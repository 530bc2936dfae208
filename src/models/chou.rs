//! Chou's general solution model (GSM).
//!
//! The similarity of `k` to `i` within the `i-j` binary is measured by the
//! deviation sums
//!
//! ```text
//! β_kj = ∫₀¹ [G^E_ik(x, 1-x) - G^E_ij(x, 1-x)]² dx
//! β_ki = ∫₀¹ [G^E_jk(x, 1-x) - G^E_ji(x, 1-x)]² dx
//! α    = β_kj / (β_ki + β_kj)
//! ```

use super::{ContributionModel, ModelContext, DEGENERATE_DENOMINATOR};
use crate::elements::ElementStore;
use crate::EngineResult;

/// General solution model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gsm;

/// Squared deviation between the `base-k` and `base-other` excess Gibbs curves.
fn deviation_sum<S: ElementStore + ?Sized>(
    ctx: &ModelContext<'_, S>,
    k: &str,
    other: &str,
    base: &str,
) -> EngineResult<f64> {
    let with_k = ctx.binary(base, k)?;
    let with_other = ctx.binary(base, other)?;
    let t = ctx.temperature;
    ctx.integrate_unit(|x| {
        let diff: f64 = with_k.excess_gibbs(x, 1.0 - x, t) - with_other.excess_gibbs(x, 1.0 - x, t);
        diff * diff
    })
}

impl ContributionModel for Gsm {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64> {
        let beta_kj = deviation_sum(ctx, k, j, i)?;
        let beta_ki = deviation_sum(ctx, k, i, j)?;

        let denominator = beta_ki + beta_kj;
        if denominator.abs() < DEGENERATE_DENOMINATOR {
            return Ok(0.5);
        }
        Ok(beta_kj / denominator)
    }
}
