//! Decomposition of a multicomponent alloy into weighted binaries.
//!
//! For every unordered pair (A, B) of an N-component alloy the other
//! components are distributed onto the two sides by the contribution
//! coefficients of the chosen [`ExtrapolationModel`]:
//!
//! ```text
//! δ_A = x_A + Σ_C α(C, A, B) x_C
//! δ_B = x_B + Σ_C α(C, B, A) x_C
//! ```
//!
//! The effective compositions are normalised, the binary property is evaluated
//! there and weighted by `x_A x_B / (δ_A δ_B)`. The sum over all C(N, 2) pairs
//! is the multicomponent property.
//!
//! Coefficients depend only on the elements, temperature, phase and ordering,
//! so [`MulticomponentAggregator::prepare`] computes them once and the
//! resulting [`PreparedSystem`] is evaluated at every composition the crate
//! needs, including dual-number compositions for exact derivatives.

use num_dual::DualNum;

use crate::binary::BinarySubsystem;
use crate::composition::Composition;
use crate::config::EngineConfig;
use crate::elements::ElementStore;
use crate::models::{ContributionModel, ExtrapolationModel, ModelContext};
use crate::solvers::Convergence;
use crate::{check_temperature, EngineResult, OrderingClass, PhaseState, GAS_CONSTANT};

/// Binary property folded into the multicomponent sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryProperty {
    /// Mixing enthalpy (kJ/mol)
    Enthalpy,
    /// Excess Gibbs energy (kJ/mol)
    ExcessGibbs,
}

/// Contribution of one binary subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct PairTerm<D = f64> {
    pub first: String,
    pub second: String,
    /// Normalised effective composition (δ_A, δ_B)
    pub effective: (D, D),
    /// Weight x_A x_B / (δ_A δ_B)
    pub weight: D,
    /// Binary property at the effective composition
    pub value: D,
    /// Volume iteration status, `None` if the pair was skipped
    pub volumes: Option<Convergence>,
}

impl<D: DualNum<f64> + Copy> PairTerm<D> {
    /// Weighted contribution to the total.
    pub fn contribution(&self) -> D {
        self.weight * self.value
    }

    /// Returns true if the pair was skipped for a non-positive effective fraction.
    pub fn is_skipped(&self) -> bool {
        self.volumes.is_none()
    }
}

/// Multicomponent property with its per-pair breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation<D = f64> {
    /// Sum of all weighted pair values
    pub total: D,
    /// Pairs in insertion order of the composition
    pub pairs: Vec<PairTerm<D>>,
}

impl<D> Evaluation<D> {
    /// Returns true if every evaluated pair converged its volume iteration.
    pub fn volumes_converged(&self) -> bool {
        self.pairs.iter().all(|p| p.volumes.map_or(true, |s| s.is_converged()))
    }
}

#[derive(Debug, Clone, Copy)]
struct ThirdComponent {
    index: usize,
    toward_first: f64,
    toward_second: f64,
}

#[derive(Debug, Clone)]
struct PreparedPair<'a> {
    first: usize,
    second: usize,
    binary: BinarySubsystem<'a>,
    others: Vec<ThirdComponent>,
}

/// A composition's element set with all contribution coefficients resolved.
#[derive(Debug, Clone)]
pub struct PreparedSystem<'a> {
    symbols: Vec<String>,
    fractions: Vec<f64>,
    temperature: f64,
    pairs: Vec<PreparedPair<'a>>,
}

impl<'a> PreparedSystem<'a> {
    /// Element symbols in insertion order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Normalised mole fractions of the prepared composition.
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Index of an element in the prepared composition.
    pub fn position(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Evaluates `property` at the mole fractions `x` (ordered as [`Self::symbols`]).
    ///
    /// `x` must sum to one; it is not renormalised.
    pub(crate) fn evaluate<D: DualNum<f64> + Copy>(
        &self,
        x: &[D],
        property: BinaryProperty,
    ) -> Evaluation<D> {
        debug_assert_eq!(x.len(), self.symbols.len());
        let mut total = D::from(0.0);
        let mut pairs = Vec::with_capacity(self.pairs.len());

        for pair in &self.pairs {
            let (xa, xb) = (x[pair.first], x[pair.second]);
            let mut delta_a = xa;
            let mut delta_b = xb;
            for other in &pair.others {
                delta_a = delta_a + x[other.index] * other.toward_first;
                delta_b = delta_b + x[other.index] * other.toward_second;
            }

            let first = self.symbols[pair.first].clone();
            let second = self.symbols[pair.second].clone();

            if delta_a.re() <= 0.0 || delta_b.re() <= 0.0 {
                log::debug!(
                    "{}-{}: non-positive effective composition, pair skipped",
                    first,
                    second
                );
                pairs.push(PairTerm {
                    first,
                    second,
                    effective: (delta_a, delta_b),
                    weight: D::from(0.0),
                    value: D::from(0.0),
                    volumes: None,
                });
                continue;
            }

            let sum = delta_a + delta_b;
            let (da, db) = (delta_a / sum, delta_b / sum);
            let volumes = pair.binary.solve_volumes(da, db);
            let value = match property {
                BinaryProperty::Enthalpy => pair.binary.enthalpy_with_volumes(da, db, &volumes),
                BinaryProperty::ExcessGibbs => {
                    pair.binary.excess_gibbs_with_volumes(da, db, &volumes, self.temperature)
                }
            };
            let weight = xa * xb / (da * db);
            total = total + weight * value;

            log::debug!(
                "{}-{}: effective ({:.6}, {:.6}), weight {:.6}, {:?} {:.6}",
                first,
                second,
                da.re(),
                db.re(),
                weight.re(),
                property,
                value.re()
            );
            pairs.push(PairTerm {
                first,
                second,
                effective: (da, db),
                weight,
                value,
                volumes: Some(volumes.status),
            });
        }

        Evaluation { total, pairs }
    }

    /// Mixing enthalpy at `x` in kJ/mol.
    pub(crate) fn enthalpy<D: DualNum<f64> + Copy>(&self, x: &[D]) -> D {
        self.evaluate(x, BinaryProperty::Enthalpy).total
    }

    /// Excess Gibbs energy at `x` in kJ/mol.
    pub(crate) fn excess_gibbs<D: DualNum<f64> + Copy>(&self, x: &[D]) -> D {
        self.evaluate(x, BinaryProperty::ExcessGibbs).total
    }

    /// Gibbs energy of mixing at `x` in kJ/mol.
    pub(crate) fn gibbs_energy(&self, x: &[f64]) -> f64 {
        self.excess_gibbs(x) - self.temperature * ideal_entropy(x)
    }
}

/// Ideal configurational entropy `-R Σ x ln x` in kJ/(mol·K). Zero fractions are skipped.
pub fn ideal_entropy(x: &[f64]) -> f64 {
    -GAS_CONSTANT * x.iter().filter(|&&xi| xi > 0.0).map(|&xi| xi * xi.ln() / 1000.0).sum::<f64>()
}

/// Folds binary properties into multicomponent ones.
#[derive(Debug, Clone, Copy)]
pub struct MulticomponentAggregator<'a, S: ElementStore + ?Sized> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: ElementStore + ?Sized> MulticomponentAggregator<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        MulticomponentAggregator { store, config }
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    /// Model context at the given conditions.
    pub fn context(
        &self,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
    ) -> EngineResult<ModelContext<'a, S>> {
        ModelContext::with_config(self.store, temperature, phase, order, self.config)
    }

    /// Normalises `composition` and resolves every binary and coefficient.
    ///
    /// # Errors
    ///
    /// Invalid compositions or temperatures, unknown elements and quadrature
    /// failures of the coefficient models.
    pub fn prepare(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<PreparedSystem<'a>> {
        let temperature = check_temperature(temperature)?;
        let normalized = composition.normalized()?;
        let ctx = self.context(temperature, phase, order)?;

        let symbols: Vec<String> = normalized.symbols().map(str::to_string).collect();
        let fractions: Vec<f64> = normalized.fractions().collect();
        for symbol in &symbols {
            self.store.lookup(symbol)?;
        }

        let n = symbols.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for a in 0..n {
            for b in (a + 1)..n {
                let binary = ctx.binary(&symbols[a], &symbols[b])?;
                let mut others = Vec::with_capacity(n - 2);
                for c in (0..n).filter(|&c| c != a && c != b) {
                    let (sa, sb, sc) = (&symbols[a], &symbols[b], &symbols[c]);
                    let toward_first = model.coefficient(&ctx, sc, sa, sb)?;
                    let toward_second = model.coefficient(&ctx, sc, sb, sa)?;
                    log::debug!(
                        "{} α({}, {}, {}) = {:.6}, α({}, {}, {}) = {:.6}",
                        model,
                        sc,
                        sa,
                        sb,
                        toward_first,
                        sc,
                        sb,
                        sa,
                        toward_second
                    );
                    others.push(ThirdComponent { index: c, toward_first, toward_second });
                }
                pairs.push(PreparedPair { first: a, second: b, binary, others });
            }
        }

        Ok(PreparedSystem { symbols, fractions, temperature, pairs })
    }

    /// Mixing enthalpy in kJ/mol.
    pub fn mixing_enthalpy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        Ok(system.enthalpy(system.fractions()))
    }

    /// Excess Gibbs energy in kJ/mol.
    pub fn excess_gibbs(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        Ok(system.excess_gibbs(system.fractions()))
    }

    /// Gibbs energy of mixing `G^E - T S_id` in kJ/mol.
    pub fn gibbs_energy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        Ok(system.gibbs_energy(system.fractions()))
    }

    /// Entropy of mixing `(ΔH - G)·1000 / T` in J/(mol·K).
    pub fn mixing_entropy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<f64> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        let x = system.fractions();
        Ok((system.enthalpy(x) - system.gibbs_energy(x)) * 1000.0 / system.temperature())
    }

    /// Mixing enthalpy with per-pair breakdown.
    pub fn evaluate_enthalpy(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<Evaluation> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        Ok(system.evaluate(system.fractions(), BinaryProperty::Enthalpy))
    }

    /// Excess Gibbs energy with per-pair breakdown.
    pub fn evaluate_excess_gibbs(
        &self,
        composition: &Composition,
        temperature: f64,
        phase: PhaseState,
        order: OrderingClass,
        model: ExtrapolationModel,
    ) -> EngineResult<Evaluation> {
        let system = self.prepare(composition, temperature, phase, order, model)?;
        Ok(system.evaluate(system.fractions(), BinaryProperty::ExcessGibbs))
    }
}
