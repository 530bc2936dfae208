//! # Miedema-Mix: Multicomponent Alloy Thermodynamics from Binary Data
//!
//! Predicts mixing enthalpy, Gibbs energy, activity and activity coefficients
//! of multicomponent metallic alloys using the semi-empirical Miedema model for
//! every binary subsystem and a family of extrapolation models that fold the
//! binaries into an N-component estimate.
//!
//! ## Layers
//!
//! - [`elements`]: Keyed store of Miedema element parameters
//! - [`binary`]: Binary subsystem model with self-consistent atomic volumes
//! - [`models`]: Six contribution coefficient models (Kohler, Muggianu,
//!   Toop-Kohler, GSM/Chou, UEM1, UEM2_N)
//! - [`multicomponent`]: Decomposition of an alloy into weighted binaries
//! - [`activity`]: Partial molar quantities by automatic or finite differences
//! - [`sweep`], [`report`]: Batch evaluation and coefficient reporting
//!
//! ## Example
//!
//! ```
//! use miedema_mix::{Composition, Engine, ExtrapolationModel, OrderingClass, PhaseState};
//!
//! let engine = Engine::with_builtin_elements();
//! let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
//!
//! let (phase, order) = (PhaseState::Solid, OrderingClass::SolidSolution);
//! let dh = engine
//!     .mixing_enthalpy(&alloy, 1200.0, phase, order, ExtrapolationModel::Uem1)
//!     .unwrap();
//! assert!(dh.is_finite());
//! ```
//!
//! ## Optional Features
//!
//! - **`parallel`** (default): Sweep points are evaluated with `rayon`
//!
//! Every engine call is a pure function of its inputs. The only shared state
//! is the read-only element store, so independent calculations may run on
//! separate threads without synchronization.

#![allow(clippy::too_many_arguments)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod activity;
pub mod autodiff;
pub mod binary;
pub mod composition;
pub mod config;
pub mod elements;
pub mod models;
pub mod multicomponent;
pub mod report;
pub mod solvers;
pub mod sweep;

pub use activity::{ActivityDerivation, DerivativeStrategy};
pub use binary::{BinarySubsystem, VolumeSolution};
pub use composition::Composition;
pub use config::EngineConfig;
pub use elements::{ElementParameters, ElementStore, ElementTable, HybridizationClass};
pub use models::{ContributionModel, ExtrapolationModel, ModelContext};
pub use multicomponent::{Evaluation, MulticomponentAggregator, PairTerm};
pub use report::{CoefficientSink, LogSink, TripleCoefficients, VecSink};
pub use solvers::{Convergence, SolverError};

/// Gas constant in J/(mol·K), the value used throughout the Miedema tables.
pub const GAS_CONSTANT: f64 = 8.314;

/// Gas constant in kJ/(mol·K).
pub const GAS_CONSTANT_KJ: f64 = GAS_CONSTANT / 1000.0;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by the engine.
///
/// Volume non-convergence is not an error: it is reported through
/// [`Convergence`] on the returned [`VolumeSolution`] and a `log` warning.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Symbol not present in the element store
    #[error("Unknown element: {0}")]
    UnknownElement(String),
    /// Phase tag other than `S` or `L`
    #[error("Invalid phase state '{0}', expected 'S' or 'L'")]
    InvalidPhase(String),
    /// Ordering tag other than `SS`, `AMP` or `IM`
    #[error("Invalid ordering class '{0}', expected 'SS', 'AMP' or 'IM'")]
    InvalidOrder(String),
    /// Unknown extrapolation model name
    #[error("Unknown extrapolation model: {0}")]
    UnknownModel(String),
    /// Malformed or degenerate composition
    #[error("Invalid composition: {0}")]
    InvalidComposition(String),
    /// Solute or solvent missing from the composition
    #[error("Component {0} is not part of the composition")]
    UnknownComponent(String),
    /// Non-positive or non-finite temperature
    #[error("Invalid temperature: {0} K")]
    InvalidTemperature(f64),
    /// Exact differentiation was capped below the requested component count
    #[error("Exact differentiation supports at most {max} components, got {components}")]
    UnsupportedArity { components: usize, max: usize },
    /// Derivative evaluation produced a non-finite value
    #[error("Differentiation failed: {0}")]
    Differentiation(String),
    /// Element data set could not be parsed
    #[error("Invalid element data: {0}")]
    ElementData(String),
    /// Engine configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(String),
    /// Numerical routine failure (quadrature)
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Aggregate state of the alloy, controlling the hybridization factor α.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseState {
    /// Solid alloy (`S`), α = 1.0
    Solid,
    /// Liquid alloy (`L`), α = 0.73
    Liquid,
}

impl PhaseState {
    /// Hybridization scaling factor α.
    pub fn alpha(self) -> f64 {
        match self {
            PhaseState::Solid => 1.0,
            PhaseState::Liquid => 0.73,
        }
    }

    /// Proportionality constant of the Tanaka excess entropy relation.
    pub fn tanaka_factor(self) -> f64 {
        match self {
            PhaseState::Solid => 1.0 / 15.1,
            PhaseState::Liquid => 1.0 / 14.0,
        }
    }

    /// Entropy correction constant used by the infinite-dilution expressions.
    pub fn dilute_entropy_factor(self) -> f64 {
        match self {
            PhaseState::Solid => 1.0 / 15.2,
            PhaseState::Liquid => 1.0 / 14.0,
        }
    }

    /// Short tag as used in input files (`S` or `L`).
    pub fn tag(self) -> &'static str {
        match self {
            PhaseState::Solid => "S",
            PhaseState::Liquid => "L",
        }
    }
}

impl FromStr for PhaseState {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "S" | "s" | "solid" | "Solid" => Ok(PhaseState::Solid),
            "L" | "l" | "liquid" | "Liquid" => Ok(PhaseState::Liquid),
            other => Err(EngineError::InvalidPhase(other.to_string())),
        }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Structural ordering of the alloy, controlling the interface parameter λ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderingClass {
    /// Random solid solution (`SS`), λ = 0
    SolidSolution,
    /// Amorphous alloy (`AMP`), λ = 5
    Amorphous,
    /// Ordered intermetallic (`IM`), λ = 8
    Intermetallic,
}

impl OrderingClass {
    /// Ordering parameter λ of the interface concentration function.
    pub fn lambda(self) -> f64 {
        match self {
            OrderingClass::SolidSolution => 0.0,
            OrderingClass::Amorphous => 5.0,
            OrderingClass::Intermetallic => 8.0,
        }
    }

    /// Short tag as used in input files.
    pub fn tag(self) -> &'static str {
        match self {
            OrderingClass::SolidSolution => "SS",
            OrderingClass::Amorphous => "AMP",
            OrderingClass::Intermetallic => "IM",
        }
    }
}

impl FromStr for OrderingClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SS" | "ss" => Ok(OrderingClass::SolidSolution),
            "AMP" | "amp" => Ok(OrderingClass::Amorphous),
            "IM" | "im" => Ok(OrderingClass::Intermetallic),
            other => Err(EngineError::InvalidOrder(other.to_string())),
        }
    }
}

impl fmt::Display for OrderingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Checks that a temperature can be divided by.
pub(crate) fn check_temperature(temperature: f64) -> EngineResult<f64> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(temperature)
    } else {
        Err(EngineError::InvalidTemperature(temperature))
    }
}

/// Public entry point shared by every front end.
///
/// Owns an element store and an [`EngineConfig`], and exposes the mixing and
/// activity calculations as plain functions of their inputs.
///
/// # Example
///
/// ```
/// use miedema_mix::{Composition, Engine, ExtrapolationModel, OrderingClass, PhaseState};
///
/// let engine = Engine::with_builtin_elements();
/// let alloy = Composition::from_pairs([("Fe", 0.7), ("Ni", 0.3)]).unwrap();
///
/// let (phase, order) = (PhaseState::Solid, OrderingClass::Intermetallic);
/// let binary = engine.binary("Fe", "Ni", phase, order).unwrap();
/// let direct = binary.enthalpy_of_mixing(0.7, 0.3);
/// let extrapolated = engine
///     .mixing_enthalpy(&alloy, 1000.0, phase, order, ExtrapolationModel::Kohler)
///     .unwrap();
/// assert_eq!(direct, extrapolated);
/// ```
#[derive(Debug, Clone)]
pub struct Engine<S: ElementStore = ElementTable> {
    store: S,
    config: EngineConfig,
}

impl Engine<ElementTable> {
    /// Creates an engine backed by the built-in Miedema parameter table.
    pub fn with_builtin_elements() -> Self {
        Engine::new(ElementTable::builtin())
    }
}

impl<S: ElementStore> Engine<S> {
    /// Creates an engine with default configuration.
    pub fn new(store: S) -> Self {
        Engine { store, config: EngineConfig::default() }
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Engine { store, config }
    }

    /// The backing element store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Multicomponent aggregator bound to this engine's store and options.
    pub fn aggregator(&self) -> MulticomponentAggregator<'_, S> {
        MulticomponentAggregator::new(&self.store, &self.config)
    }

    /// Activity derivation bound to this engine's store and options.
    pub fn derivation(&self) -> ActivityDerivation<'_, S> {
        ActivityDerivation::new(self.aggregator(), &self.config.activity)
    }

    /// Binary subsystem for two elements of the store.
    pub fn binary(
        &self,
        a: &str,
        b: &str,
        phase: PhaseState,
        order: OrderingClass,
    ) -> EngineResult<BinarySubsystem<'_>> {
        let first = self.store.lookup(a)?;
        let second = self.store.lookup(b)?;
        Ok(BinarySubsystem::new(first, second, phase, order)
            .with_volume_options(self.config.volume))
    }

    /// Contribution coefficient of `k` toward `i` in the `i-j` binary.
    pub fn contribution_coefficient(
        &self,
        model: ExtrapolationModel,
        k: &str,
        i: &str,
        j: &str,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
    ) -> EngineResult<f64> {
        let ctx = self.aggregator().context(temperature, phase, order)?;
        model.coefficient(&ctx, k, i, j)
    }

    /// Mixing enthalpy of the alloy in kJ/mol.
    pub fn mixing_enthalpy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        self.aggregator().mixing_enthalpy(composition, temperature, phase, order, model)
    }

    /// Excess Gibbs energy of the alloy in kJ/mol.
    pub fn excess_gibbs(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        self.aggregator().excess_gibbs(composition, temperature, phase, order, model)
    }

    /// Gibbs energy of mixing (excess plus ideal) in kJ/mol.
    pub fn gibbs_energy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        self.aggregator().gibbs_energy(composition, temperature, phase, order, model)
    }

    /// Entropy of mixing in J/(mol·K).
    pub fn mixing_entropy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        self.aggregator().mixing_entropy(composition, temperature, phase, order, model)
    }

    /// Natural logarithm of the solute activity coefficient.
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
        self.derivation()
            .activity_coefficient(composition, solute, solvent, temperature, phase, order, model)
    }

    /// Solute activity `x·exp(ln γ)`.
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
        self.derivation().activity(composition, solute, solvent, temperature, phase, order, model)
    }

    /// Emits the contribution coefficients of every element triple into `sink`.
    ///
    /// Returns the number of rows written.
    pub fn contribution_report(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
        sink: &mut dyn CoefficientSink,
    ) -> EngineResult<usize> {
        let ctx = self.aggregator().context(temperature, phase, order)?;
        report::emit_contribution_report(&ctx, composition, model, sink)
    }
}
