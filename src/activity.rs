//! Activity coefficients from the multicomponent excess Gibbs energy.
//!
//! The partial molar excess Gibbs energy of a solute follows from the
//! composition derivatives of `G^E`. Two strategies are available:
//!
//! - **Exact**: every non-solvent mole fraction is an independent variable
//!   and the solvent takes the remainder. One forward-mode dual-number pass per
//!   variable gives the gradient, and
//!   `Ḡ_s = G^E + ∂G^E/∂x_s - Σ_k x_k ∂G^E/∂x_k`.
//! - **Numerical**: the solute fraction is moved by `±h` while all other
//!   fractions are rescaled to keep the sum at one. The central difference `D`
//!   of the excess part along that direction gives `Ḡ_s = G^E + (1 - x_s) D`.
//!
//! In both cases `ln γ_s = Ḡ_s / (R T)`.

use serde::{Deserialize, Serialize};

use nalgebra::DVector;
use num_dual::Dual64;

use crate::autodiff::{compute_gradient, finite_difference};
use crate::composition::Composition;
use crate::config::ActivityOptions;
use crate::elements::ElementStore;
use crate::models::ExtrapolationModel;
use crate::multicomponent::{ideal_entropy, MulticomponentAggregator, PreparedSystem};
use crate::{
    check_temperature, EngineError, EngineResult, OrderingClass, PhaseState, GAS_CONSTANT_KJ,
};

/// Steps below this are too small for a central difference.
const MIN_CENTRAL_STEP: f64 = 1e-12;

/// Sums of the other fractions below this are treated as empty.
const EMPTY_REMAINDER: f64 = 1e-12;

/// How composition derivatives are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivativeStrategy {
    /// Forward-mode automatic differentiation
    Exact,
    /// Central finite differences
    Numerical,
    /// Exact, falling back to numerical on failure
    #[default]
    Auto,
}

/// Solute activity calculations on top of a [`MulticomponentAggregator`].
#[derive(Debug, Clone)]
pub struct ActivityDerivation<'a, S: ElementStore + ?Sized> {
    aggregator: MulticomponentAggregator<'a, S>,
    options: ActivityOptions,
}

impl<'a, S: ElementStore + ?Sized> ActivityDerivation<'a, S> {
    pub fn new(aggregator: MulticomponentAggregator<'a, S>, options: &ActivityOptions) -> Self {
        ActivityDerivation { aggregator, options: *options }
    }

    /// Overrides the configured derivative strategy.
    pub fn with_strategy(mut self, strategy: DerivativeStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> DerivativeStrategy {
        self.options.strategy
    }

    /// Natural logarithm of the activity coefficient of `solute`.
    ///
    /// # Arguments
    ///
    /// * `composition` - Alloy composition (normalised internally)
    /// * `solute` - Element whose activity coefficient is computed
    /// * `solvent` - Reference element taking up the remainder of the composition
    /// * `temperature` - Temperature in K
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnknownComponent`] if solute or solvent is absent
    /// * [`EngineError::InvalidComposition`] if solute and solvent coincide
    /// * [`EngineError::InvalidTemperature`] for non-positive temperatures
    pub fn activity_coefficient(
        &self,
        composition: &Composition,
        solute: &str,
        solvent: &str,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let temperature = check_temperature(temperature)?;
        if !composition.contains(solute) {
            return Err(EngineError::UnknownComponent(solute.to_string()));
        }
        if !composition.contains(solvent) {
            return Err(EngineError::UnknownComponent(solvent.to_string()));
        }
        if solute == solvent {
            return Err(EngineError::InvalidComposition(format!(
                "solute and solvent must differ, both are {}",
                solute
            )));
        }

        let system = self.aggregator.prepare(composition, temperature, phase, order, model)?;
        let (Some(solute_index), Some(solvent_index)) =
            (system.position(solute), system.position(solvent))
        else {
            return Err(EngineError::UnknownComponent(solute.to_string()));
        };

        let (s, v) = (solute_index, solvent_index);
        let ln_gamma = match self.options.strategy {
            DerivativeStrategy::Exact => self.exact_ln_gamma(&system, s, v)?,
            DerivativeStrategy::Numerical => self.numerical_ln_gamma(&system, s, v)?,
            DerivativeStrategy::Auto => match self.exact_ln_gamma(&system, s, v) {
                Ok(value) => value,
                Err(
                    err @ (EngineError::UnsupportedArity { .. } | EngineError::Differentiation(_)),
                ) => {
                    log::warn!("exact derivative unavailable ({}), using finite differences", err);
                    self.numerical_ln_gamma(&system, s, v)?
                }
                Err(err) => return Err(err),
            },
        };

        log::debug!("ln γ({}) in {} at {} K = {:.6}", solute, composition, temperature, ln_gamma);
        Ok(ln_gamma)
    }

    /// Activity `x_s · exp(ln γ_s)` of `solute`.
    pub fn activity(
        &self,
        composition: &Composition,
        solute: &str,
        solvent: &str,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let ln_gamma = self.activity_coefficient(
            composition,
            solute,
            solvent,
            temperature,
            phase,
            order,
            model,
        )?;
        let x = composition.normalized()?.get(solute).unwrap_or(0.0);
        Ok(x * ln_gamma.exp())
    }

    /// ln γ by forward-mode automatic differentiation.
    ///
    /// # Errors
    ///
    /// * [`EngineError::UnsupportedArity`] if the component count exceeds
    ///   `max_exact_components`
    /// * [`EngineError::Differentiation`] if the result is not finite
    pub(crate) fn exact_ln_gamma(
        &self,
        system: &PreparedSystem<'_>,
        solute: usize,
        solvent: usize,
    ) -> EngineResult<f64> {
        let n = system.symbols().len();
        if let Some(max) = self.options.max_exact_components {
            if n > max {
                return Err(EngineError::UnsupportedArity { components: n, max });
            }
        }

        let x = system.fractions();
        let free: Vec<usize> = (0..n).filter(|&k| k != solvent).collect();
        let point: Vec<f64> = free.iter().map(|&k| x[k]).collect();

        let excess = |v: &[Dual64]| {
            let mut full = vec![Dual64::from(0.0); n];
            let mut remainder = Dual64::from(1.0);
            for (&k, &value) in free.iter().zip(v) {
                full[k] = value;
                remainder = remainder - value;
            }
            full[solvent] = remainder;
            system.excess_gibbs(&full)
        };
        let (g, gradient) = compute_gradient(excess, &point);

        let Some(slot) = free.iter().position(|&k| k == solute) else {
            return Err(EngineError::Differentiation(format!(
                "solute index {} is not free",
                solute
            )));
        };
        let partial = g + gradient[slot] - DVector::from_vec(point).dot(&gradient);
        let ln_gamma = partial / (GAS_CONSTANT_KJ * system.temperature());

        if ln_gamma.is_finite() {
            Ok(ln_gamma)
        } else {
            Err(EngineError::Differentiation(format!(
                "non-finite partial molar excess Gibbs energy of {}",
                system.symbols()[solute]
            )))
        }
    }

    /// ln γ by central finite differences along the composition simplex.
    pub(crate) fn numerical_ln_gamma(
        &self,
        system: &PreparedSystem<'_>,
        solute: usize,
        solvent: usize,
    ) -> EngineResult<f64> {
        let x = system.fractions();
        let t = system.temperature();
        let xs = x[solute];
        let max_step = self.options.max_step;

        let h = max_step.min(0.01 * xs).min(0.01 * (1.0 - xs));
        let (lower, upper) = if h >= MIN_CENTRAL_STEP {
            (xs - h, xs + h)
        } else if 1.0 - xs >= xs {
            (xs, xs + max_step.min(1.0 - xs))
        } else {
            (xs - max_step.min(xs), xs)
        };

        let excess_at = |target: f64| {
            let perturbed = perturb(x, solute, solvent, target);
            // Gibbs energy minus its ideal part
            system.gibbs_energy(&perturbed) + t * ideal_entropy(&perturbed)
        };
        let slope = finite_difference(excess_at, lower, upper);

        let partial = system.excess_gibbs(x) + (1.0 - xs) * slope;
        let ln_gamma = partial / (GAS_CONSTANT_KJ * t);
        if ln_gamma.is_finite() {
            Ok(ln_gamma)
        } else {
            Err(EngineError::Differentiation(format!(
                "non-finite finite-difference estimate for {}",
                system.symbols()[solute]
            )))
        }
    }
}

/// Composition with the solute at `target` and the others rescaled proportionally.
fn perturb(x: &[f64], solute: usize, solvent: usize, target: f64) -> Vec<f64> {
    let remainder = 1.0 - x[solute];
    let mut perturbed: Vec<f64> = if remainder > EMPTY_REMAINDER {
        let scale = (1.0 - target) / remainder;
        x.iter().enumerate().map(|(k, &v)| if k == solute { target } else { v * scale }).collect()
    } else {
        // Nothing to rescale: take the difference from the solvent alone
        let mut p = x.to_vec();
        p[solute] = target;
        p[solvent] = 1.0 - target;
        p
    };

    for v in perturbed.iter_mut() {
        if *v < 0.0 {
            *v = 0.0;
        }
    }
    let total: f64 = perturbed.iter().sum();
    if total > 0.0 {
        perturbed.iter_mut().for_each(|v| *v /= total);
    }
    perturbed
}
