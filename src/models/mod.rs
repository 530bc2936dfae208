//! Contribution coefficient models.
//!
//! An extrapolation model decides how strongly a third component `k` acts
//! like component `i` when the `i-j` binary of a multicomponent alloy is
//! evaluated. Every model is a [`ContributionModel`]; the closed
//! [`ExtrapolationModel`] enum dispatches to them:
//!
//! - **Kohler** (`K`): symmetric, coefficient 0
//! - **Muggianu** (`M`): symmetric, coefficient 0.5
//! - **Toop-Kohler** (`T-K`): asymmetric component chosen from the signs and
//!   magnitudes of the equimolar binary enthalpies; coefficient 0 or 1
//! - **GSM** (`GSM`): Chou's general solution model, similarity from integrated
//!   squared differences of excess Gibbs curves
//! - **UEM1** (`UEM1`): unified extrapolation model, property difference from
//!   infinite-dilution activity coefficients
//! - **UEM2_N** (`UEM2_N`): unified extrapolation model, property difference
//!   from integrated excess Gibbs energies
//!
//! Models never fail on degenerate inputs: a vanishing denominator yields 0.5.
//!
//! ## Example
//!
//! ```
//! use miedema_mix::{ContributionModel, ElementTable, ExtrapolationModel, ModelContext};
//! use miedema_mix::{OrderingClass, PhaseState};
//!
//! let table = ElementTable::builtin();
//! let (phase, order) = (PhaseState::Solid, OrderingClass::SolidSolution);
//! let ctx = ModelContext::new(&table, 1200.0, phase, order).unwrap();
//!
//! let model: ExtrapolationModel = "UEM1".parse().unwrap();
//! let alpha = model.coefficient(&ctx, "Cr", "Fe", "Ni").unwrap();
//! assert!((0.0..=1.0).contains(&alpha));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binary::BinarySubsystem;
use crate::config::{EngineConfig, QuadratureOptions, VolumeSolverOptions};
use crate::elements::ElementStore;
use crate::solvers::GaussKronrod;
use crate::{check_temperature, EngineError, EngineResult, OrderingClass, PhaseState};

mod chou;
mod symmetric;
mod toop;
mod uem;

pub use chou::Gsm;
pub use symmetric::{Kohler, Muggianu};
pub use toop::{asymmetric_component, ToopKohler};
pub use uem::{Uem1, Uem2N};

/// Denominators below this magnitude fall back to the symmetric value 0.5.
pub(crate) const DEGENERATE_DENOMINATOR: f64 = 1e-10;

/// State shared by all coefficient evaluations of one calculation.
#[derive(Debug)]
pub struct ModelContext<'a, S: ElementStore + ?Sized> {
    /// Element parameter source
    pub store: &'a S,
    /// Temperature in K
    pub temperature: f64,
    pub phase: PhaseState,
    pub order: OrderingClass,
    /// Stopping policy of the binary volume iteration
    pub volume: VolumeSolverOptions,
    /// Integration settings for GSM and UEM2_N
    pub quadrature: QuadratureOptions,
}

impl<'a, S: ElementStore + ?Sized> ModelContext<'a, S> {
    /// Creates a context with default solver options.
    pub fn new(
        store: &'a S,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
    ) -> EngineResult<Self> {
        Self::with_config(store, temperature, phase, order, &EngineConfig::default())
    }

    /// Creates a context with the solver options of `config`.
    pub fn with_config(
        store: &'a S,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        config: &EngineConfig,
    ) -> EngineResult<Self> {
        Ok(ModelContext {
            store,
            temperature: check_temperature(temperature)?,
            phase,
            order,
            volume: config.volume,
            quadrature: config.quadrature,
        })
    }

    /// Binary subsystem `a-b` at the context temperature.
    pub fn binary(&self, a: &str, b: &str) -> EngineResult<BinarySubsystem<'a>> {
        let first = self.store.lookup(a)?;
        let second = self.store.lookup(b)?;
        Ok(BinarySubsystem::new(first, second, self.phase, self.order)
            .with_volume_options(self.volume)
            .with_temperature(self.temperature))
    }

    /// Integral of `f` over the composition interval [0, 1].
    pub fn integrate_unit<F>(&self, f: F) -> EngineResult<f64>
    where
        F: FnMut(f64) -> f64,
    {
        Ok(GaussKronrod::new(&self.quadrature).integrate(f, 0.0, 1.0)?.value)
    }
}

/// Contribution coefficient α of component `k` toward `i` in the `i-j` binary.
pub trait ContributionModel {
    /// Evaluates α(k, i, j), a value in [0, 1].
    ///
    /// # Errors
    ///
    /// Unknown elements and quadrature failures propagate; degenerate
    /// thermodynamic inputs do not raise.
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64>;

    /// Returns true if the coefficient is independent of the elements.
    fn is_constant(&self) -> bool {
        false
    }
}

/// Closed set of extrapolation models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtrapolationModel {
    Kohler,
    Muggianu,
    ToopKohler,
    Gsm,
    Uem1,
    Uem2N,
}

impl ExtrapolationModel {
    /// Every model, in the order of the short keys.
    pub const ALL: [ExtrapolationModel; 6] = [
        ExtrapolationModel::Kohler,
        ExtrapolationModel::Muggianu,
        ExtrapolationModel::ToopKohler,
        ExtrapolationModel::Gsm,
        ExtrapolationModel::Uem1,
        ExtrapolationModel::Uem2N,
    ];

    /// Short key (`K`, `M`, `T-K`, `GSM`, `UEM1`, `UEM2_N`).
    pub fn key(self) -> &'static str {
        match self {
            ExtrapolationModel::Kohler => "K",
            ExtrapolationModel::Muggianu => "M",
            ExtrapolationModel::ToopKohler => "T-K",
            ExtrapolationModel::Gsm => "GSM",
            ExtrapolationModel::Uem1 => "UEM1",
            ExtrapolationModel::Uem2N => "UEM2_N",
        }
    }
}

impl ContributionModel for ExtrapolationModel {
    fn coefficient<S: ElementStore + ?Sized>(
        &self,
        ctx: &ModelContext<'_, S>,
        k: &str,
        i: &str,
        j: &str,
    ) -> EngineResult<f64> {
        match self {
            ExtrapolationModel::Kohler => Kohler.coefficient(ctx, k, i, j),
            ExtrapolationModel::Muggianu => Muggianu.coefficient(ctx, k, i, j),
            ExtrapolationModel::ToopKohler => ToopKohler.coefficient(ctx, k, i, j),
            ExtrapolationModel::Gsm => Gsm.coefficient(ctx, k, i, j),
            ExtrapolationModel::Uem1 => Uem1.coefficient(ctx, k, i, j),
            ExtrapolationModel::Uem2N => Uem2N.coefficient(ctx, k, i, j),
        }
    }

    fn is_constant(&self) -> bool {
        matches!(self, ExtrapolationModel::Kohler | ExtrapolationModel::Muggianu)
    }
}

impl FromStr for ExtrapolationModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' ', '/'], "_");
        match normalized.as_str() {
            "K" | "KOHLER" => Ok(ExtrapolationModel::Kohler),
            "M" | "MUGGIANU" => Ok(ExtrapolationModel::Muggianu),
            "T_K" | "TOOP_KOHLER" | "TOOPKOHLER" => Ok(ExtrapolationModel::ToopKohler),
            "GSM" | "CHOU" | "GSM_CHOU" => Ok(ExtrapolationModel::Gsm),
            "UEM1" => Ok(ExtrapolationModel::Uem1),
            "UEM2_N" | "UEM2N" => Ok(ExtrapolationModel::Uem2N),
            _ => Err(EngineError::UnknownModel(s.to_string())),
        }
    }
}

impl fmt::Display for ExtrapolationModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// `d_kj / (d_kj + d_ki) · exp(-d_ki)` with the degenerate fallback.
pub(crate) fn unified_coefficient(d_ki: f64, d_kj: f64) -> f64 {
    let denominator = d_kj + d_ki;
    if denominator.abs() < DEGENERATE_DENOMINATOR {
        return 0.5;
    }
    d_kj / denominator * (-d_ki).exp()
}
