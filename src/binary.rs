//! Miedema model of a binary subsystem.
//!
//! A [`BinarySubsystem`] borrows the parameters of two elements and evaluates
//! their mixing enthalpy, Tanaka excess entropy, excess Gibbs energy and the
//! infinite-dilution activity coefficients. The atomic volumes of both
//! elements in the alloy depend on composition and are found by fixed-point
//! iteration ([`BinarySubsystem::solve_volumes`]).
//!
//! # Model
//!
//! ```text
//! Δf     = 2P (-(Δφ)² + 9.4 (Δn_ws)² - R/P) / (1/n_A + 1/n_B)
//! c_A    = x_A V_A / (x_A V_A + x_B V_B)
//! f(c)   = c_A c_B (1 + λ (c_A c_B)²) (x_A V_A + x_B V_B)
//! ΔH     = f(c) Δf + x_A ΔH_trans,A + x_B ΔH_trans,B
//! S^E    = k (1/T_m,A + 1/T_m,B) ΔH
//! G^E    = ΔH - T S^E
//! ```
//!
//! Composition-dependent routines are generic over [`DualNum`] so the
//! multicomponent layer can differentiate through them.

use num_dual::DualNum;

use crate::config::VolumeSolverOptions;
use crate::elements::{ElementParameters, HybridizationClass};
use crate::solvers::{Convergence, FixedPointIteration};
use crate::{check_temperature, EngineResult, OrderingClass, PhaseState, GAS_CONSTANT};

/// Solutes whose transformation enthalpy enters the liquid dilute limit.
const LIQUID_TRANSFORMATION_SOLUTES: [&str; 4] = ["Si", "Ge", "C", "P"];

/// Atomic volumes of both elements in the alloy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeSolution<D> {
    /// Volume of the first element, V_A^(2/3)
    pub va: D,
    /// Volume of the second element, V_B^(2/3)
    pub vb: D,
    /// Convergence of the self-consistent iteration
    pub status: Convergence,
}

/// Binary alloy of two elements in a given phase and ordering state.
///
/// # Example
///
/// ```
/// use miedema_mix::{ElementStore, ElementTable, BinarySubsystem, OrderingClass, PhaseState};
///
/// let table = ElementTable::builtin();
/// let fe = table.lookup("Fe").unwrap();
/// let ni = table.lookup("Ni").unwrap();
///
/// let binary = BinarySubsystem::new(fe, ni, PhaseState::Solid, OrderingClass::SolidSolution);
/// let dh: f64 = binary.enthalpy_of_mixing(0.5, 0.5);
/// assert!(dh < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BinarySubsystem<'a> {
    a: &'a ElementParameters,
    b: &'a ElementParameters,
    phase: PhaseState,
    order: OrderingClass,
    solver: FixedPointIteration,
    xa: f64,
    xb: f64,
    temperature: Option<f64>,
}

impl<'a> BinarySubsystem<'a> {
    /// Creates an equimolar binary without a temperature.
    pub fn new(
        a: &'a ElementParameters,
        b: &'a ElementParameters,
        phase: PhaseState,
        order: OrderingClass,
    ) -> Self {
        BinarySubsystem {
            a,
            b,
            phase,
            order,
            solver: FixedPointIteration::default(),
            xa: 0.5,
            xb: 0.5,
            temperature: None,
        }
    }

    /// Replaces the stopping policy of the volume iteration.
    pub fn with_volume_options(mut self, options: VolumeSolverOptions) -> Self {
        self.solver = FixedPointIteration::from_options(&options);
        self
    }

    /// Sets the temperature used by the dilute limits.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Stores a composition, normalised to `xa + xb = 1`.
    ///
    /// Read by [`Self::enthalpy`], [`Self::entropy`] and [`Self::gibbs`].
    pub fn set_composition(&mut self, xa: f64, xb: f64) -> EngineResult<()> {
        let total = xa + xb;
        if !(xa >= 0.0 && xb >= 0.0 && total > 0.0 && total.is_finite()) {
            return Err(crate::EngineError::InvalidComposition(format!(
                "binary {}-{} needs non-negative fractions with a positive sum, got ({}, {})",
                self.a.symbol, self.b.symbol, xa, xb
            )));
        }
        self.xa = xa / total;
        self.xb = xb / total;
        Ok(())
    }

    /// Stores a temperature in K.
    pub fn set_temperature(&mut self, temperature: f64) -> EngineResult<()> {
        self.temperature = Some(check_temperature(temperature)?);
        Ok(())
    }

    /// Stored normalised composition `(x_A, x_B)`.
    pub fn composition(&self) -> (f64, f64) {
        (self.xa, self.xb)
    }

    /// Stored temperature, if any.
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Parameters of the first element.
    pub fn first(&self) -> &'a ElementParameters {
        self.a
    }

    /// Parameters of the second element.
    pub fn second(&self) -> &'a ElementParameters {
        self.b
    }

    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    pub fn order(&self) -> OrderingClass {
        self.order
    }

    /// Chemical mismatch term Δf of the Miedema model.
    pub fn chemical_mismatch(&self) -> f64 {
        let (a, b) = (self.a, self.b);

        let r_to_p = match (a.hybridization, b.hybridization) {
            (HybridizationClass::Other, _) | (_, HybridizationClass::Other) => 0.0,
            (ha, hb) if ha != hb => {
                self.phase.alpha() * a.hybridization_value * b.hybridization_value
            }
            _ => 0.0,
        };

        let p = match (a.transition_metal, b.transition_metal) {
            (true, true) => 14.2,
            (true, false) | (false, true) => 12.35,
            (false, false) => 10.7,
        };

        2.0 * p * (-(a.phi - b.phi).powi(2) + 9.4 * (a.n_ws - b.n_ws).powi(2) - r_to_p)
            / (1.0 / a.n_ws + 1.0 / b.n_ws)
    }

    /// Solves for the atomic volumes of both elements at `(xa, xb)`.
    ///
    /// Starts from the pure-element volumes. A non-converged iteration is
    /// reported through [`VolumeSolution::status`] and a `log` warning.
    pub fn solve_volumes<D: DualNum<f64> + Copy>(&self, xa: D, xb: D) -> VolumeSolution<D> {
        let (a, b) = (self.a, self.b);
        let lambda = self.order.lambda();
        let start = [D::from(a.volume), D::from(b.volume)];

        let solution = self.solver.iterate(start, |&[va, vb]| {
            let total = xa * va + xb * vb;
            let pa = xa * va / total;
            let pb = xb * vb / total;
            let ordering = (pa * pb).powi(2) * lambda + 1.0;
            [
                (pb * ordering * (a.u * (a.phi - b.phi)) + 1.0) * a.volume,
                (pa * ordering * (b.u * (b.phi - a.phi)) + 1.0) * b.volume,
            ]
        });

        if !solution.status.is_converged() {
            log::warn!(
                "volume iteration for {}-{} at x = ({:.4}, {:.4}) stopped early: {:?}",
                a.symbol,
                b.symbol,
                xa.re(),
                xb.re(),
                solution.status
            );
        }

        let [va, vb] = solution.values;
        VolumeSolution { va, vb, status: solution.status }
    }

    /// Mixing enthalpy in kJ/mol at the composition `(xa, xb)`.
    ///
    /// The fractions are normalised first; a non-positive total gives zero.
    pub fn enthalpy_of_mixing<D: DualNum<f64> + Copy>(&self, xa: D, xb: D) -> D {
        let total = xa + xb;
        if total.re() <= 0.0 {
            return D::from(0.0);
        }
        let (x1, x2) = (xa / total, xb / total);
        let volumes = self.solve_volumes(x1, x2);
        self.enthalpy_with_volumes(x1, x2, &volumes)
    }

    /// Mixing enthalpy at a normalised composition with solved volumes.
    pub fn enthalpy_with_volumes<D: DualNum<f64> + Copy>(
        &self,
        x1: D,
        x2: D,
        volumes: &VolumeSolution<D>,
    ) -> D {
        let (va, vb) = (volumes.va, volumes.vb);
        let total = x1 * va + x2 * vb;
        let ca = x1 * va / total;
        let cb = x2 * vb / total;

        let interface = ca * cb * ((ca * cb).powi(2) * self.order.lambda() + 1.0) * total;
        let transformation = x1 * self.a.transition_enthalpy + x2 * self.b.transition_enthalpy;

        interface * self.chemical_mismatch() + transformation
    }

    /// Mixing enthalpy at the stored composition.
    pub fn enthalpy(&self) -> f64 {
        self.enthalpy_of_mixing(self.xa, self.xb)
    }

    /// Excess entropy at the stored composition.
    pub fn entropy(&self) -> f64 {
        self.excess_entropy(self.xa, self.xb)
    }

    /// Excess Gibbs energy at the stored composition and temperature.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidTemperature`](crate::EngineError::InvalidTemperature)
    /// if no positive temperature has been set.
    pub fn gibbs(&self) -> EngineResult<f64> {
        let t = check_temperature(self.temperature.unwrap_or(f64::NAN))?;
        Ok(self.excess_gibbs(self.xa, self.xb, t))
    }

    /// Tanaka proportionality factor `k (1/T_m,A + 1/T_m,B)` in 1/K.
    pub fn entropy_factor(&self) -> f64 {
        self.phase.tanaka_factor() * (1.0 / self.a.melting_point + 1.0 / self.b.melting_point)
    }

    /// Excess entropy in kJ/(mol·K).
    pub fn excess_entropy<D: DualNum<f64> + Copy>(&self, xa: D, xb: D) -> D {
        self.enthalpy_of_mixing(xa, xb) * self.entropy_factor()
    }

    /// Excess Gibbs energy in kJ/mol at temperature `t`.
    pub fn excess_gibbs<D: DualNum<f64> + Copy>(&self, xa: D, xb: D, t: f64) -> D {
        let enthalpy = self.enthalpy_of_mixing(xa, xb);
        enthalpy - enthalpy * self.entropy_factor() * t
    }

    /// Excess Gibbs energy at a normalised composition with solved volumes.
    pub fn excess_gibbs_with_volumes<D: DualNum<f64> + Copy>(
        &self,
        x1: D,
        x2: D,
        volumes: &VolumeSolution<D>,
        t: f64,
    ) -> D {
        let enthalpy = self.enthalpy_with_volumes(x1, x2, volumes);
        enthalpy - enthalpy * self.entropy_factor() * t
    }

    /// ln γ of the first element infinitely diluted in the second.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidTemperature`](crate::EngineError::InvalidTemperature)
    /// if no positive temperature has been set.
    pub fn ln_gamma_infinite_a(&self) -> EngineResult<f64> {
        let t = check_temperature(self.temperature.unwrap_or(f64::NAN))?;
        Ok(self.dilute_ln_gamma(self.a, self.b, t))
    }

    /// ln γ of the second element infinitely diluted in the first.
    pub fn ln_gamma_infinite_b(&self) -> EngineResult<f64> {
        let t = check_temperature(self.temperature.unwrap_or(f64::NAN))?;
        Ok(self.dilute_ln_gamma(self.b, self.a, t))
    }

    fn dilute_ln_gamma(
        &self,
        solute: &ElementParameters,
        solvent: &ElementParameters,
        t: f64,
    ) -> f64 {
        let special_solute = LIQUID_TRANSFORMATION_SOLUTES.contains(&solute.symbol.as_str());
        let transformation = match self.phase {
            PhaseState::Solid => solvent.transition_enthalpy,
            PhaseState::Liquid if special_solute => solvent.transition_enthalpy,
            PhaseState::Liquid => 0.0,
        };
        let entropy = self.phase.dilute_entropy_factor()
            * (1.0 / solute.melting_point + 1.0 / solvent.melting_point);

        let rt = GAS_CONSTANT * t;
        let ln_gamma = 1000.0
            * self.chemical_mismatch()
            * solvent.volume
            * (1.0 + solvent.u * (solvent.phi - solute.phi))
            / rt
            + 1000.0 * transformation / rt;

        ln_gamma * (1.0 - entropy)
    }
}
