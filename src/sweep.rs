//! Property sweeps over temperature and composition.
//!
//! Every point of a sweep is an independent engine evaluation. With the
//! `parallel` feature the points are evaluated on the rayon thread pool;
//! results always come back in input order.
//!
//! ```
//! use miedema_mix::sweep::{steps, temperature_sweep};
//! use miedema_mix::{Composition, Engine, ExtrapolationModel, OrderingClass, PhaseState};
//!
//! let engine = Engine::with_builtin_elements();
//! let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
//! let temperatures = steps(1000.0, 1400.0, 100.0);
//!
//! let points = temperature_sweep(
//!     &engine,
//!     &alloy,
//!     &temperatures,
//!     PhaseState::Solid,
//!     OrderingClass::SolidSolution,
//!     ExtrapolationModel::Muggianu,
//! )
//! .unwrap();
//! assert_eq!(points.len(), 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::elements::ElementStore;
use crate::models::ExtrapolationModel;
use crate::{Engine, EngineError, EngineResult, OrderingClass, PhaseState};

/// Smallest solvent fraction kept by [`activity_composition_sweep`].
const MIN_SOLVENT: f64 = 1e-12;

/// Largest grid produced by [`steps`].
pub const MAX_STEPS: usize = 1_000_000;

/// Mixing properties at one sweep point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyPoint {
    /// Temperature in K
    pub temperature: f64,
    /// Normalised composition of the point
    pub composition: Composition,
    /// Mixing enthalpy in kJ/mol
    pub enthalpy: f64,
    /// Excess Gibbs energy in kJ/mol
    pub excess_gibbs: f64,
    /// Gibbs energy of mixing in kJ/mol
    pub gibbs_energy: f64,
    /// Entropy of mixing in J/(mol·K)
    pub entropy: f64,
}

/// Solute activity at one sweep point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    pub temperature: f64,
    pub composition: Composition,
    /// Natural logarithm of the activity coefficient
    pub ln_gamma: f64,
    pub activity: f64,
}

/// Evenly spaced values from `min` to `max` inclusive.
///
/// The last value may overshoot `max` by less than half a step. A
/// non-positive or non-finite step, or `max < min`, gives no values, and so
/// does a grid of more than [`MAX_STEPS`] values.
pub fn steps(min: f64, max: f64, step: f64) -> Vec<f64> {
    if step.is_nan() || step <= 0.0 || !min.is_finite() || !max.is_finite() || max < min {
        return Vec::new();
    }
    let count = ((max - min) / step + 0.5).ceil();
    if count.is_nan() || count > MAX_STEPS as f64 {
        log::warn!(
            "grid from {} to {} by {} has {} points, limit is {}",
            min,
            max,
            step,
            count,
            MAX_STEPS
        );
        return Vec::new();
    }
    (0..count as usize).map(|k| min + k as f64 * step).collect()
}

/// Applies `f` to every item, dropping `None` results.
fn map_points<T, R, F>(items: &[T], f: F) -> EngineResult<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> EngineResult<Option<R>> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let points: Vec<Option<R>> = items.par_iter().map(&f).collect::<EngineResult<_>>()?;
        return Ok(points.into_iter().flatten().collect());
    }

    #[cfg(not(feature = "parallel"))]
    {
        let points: Vec<Option<R>> = items.iter().map(&f).collect::<EngineResult<_>>()?;
        Ok(points.into_iter().flatten().collect())
    }
}

fn property_point<S: ElementStore>(
    engine: &Engine<S>,
    composition: &Composition,
    temperature: f64,
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<PropertyPoint> {
    let system = engine.aggregator().prepare(composition, temperature, phase, order, model)?;
    let x = system.fractions();
    let enthalpy = system.enthalpy(x);
    let gibbs_energy = system.gibbs_energy(x);
    Ok(PropertyPoint {
        temperature,
        composition: composition.normalized()?,
        enthalpy,
        excess_gibbs: system.excess_gibbs(x),
        gibbs_energy,
        entropy: (enthalpy - gibbs_energy) * 1000.0 / temperature,
    })
}

fn activity_point<S: ElementStore>(
    engine: &Engine<S>,
    composition: &Composition,
    solute: &str,
    solvent: &str,
    temperature: f64,
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<ActivityPoint> {
    let composition = composition.normalized()?;
    let ln_gamma = engine.activity_coefficient(
        &composition,
        solute,
        solvent,
        temperature,
        phase,
        order,
        model,
    )?;
    let x = composition.get(solute).unwrap_or(0.0);
    Ok(ActivityPoint { temperature, composition, ln_gamma, activity: x * ln_gamma.exp() })
}

/// Mixing properties of one composition over a range of temperatures.
///
/// # Errors
///
/// The first failing point aborts the sweep, including invalid temperatures.
pub fn temperature_sweep<S: ElementStore>(
    engine: &Engine<S>,
    composition: &Composition,
    temperatures: &[f64],
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<Vec<PropertyPoint>> {
    map_points(temperatures, |&t| {
        property_point(engine, composition, t, phase, order, model).map(Some)
    })
}

/// Mixing properties of `matrix` diluted by increasing amounts of `added`.
///
/// Each point is `matrix·(1 - x) + x·added`. Fractions outside [0, 1] are
/// skipped.
pub fn addition_sweep<S: ElementStore>(
    engine: &Engine<S>,
    matrix: &Composition,
    added: &str,
    fractions: &[f64],
    temperature: f64,
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<Vec<PropertyPoint>> {
    map_points(fractions, |&x| {
        let composition = match matrix.with_addition(added, x) {
            Ok(composition) => composition,
            Err(EngineError::InvalidComposition(reason)) => {
                log::debug!("addition sweep point {} skipped: {}", x, reason);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        property_point(engine, &composition, temperature, phase, order, model).map(Some)
    })
}

/// Solute activity in one composition over a range of temperatures.
pub fn activity_temperature_sweep<S: ElementStore>(
    engine: &Engine<S>,
    composition: &Composition,
    solute: &str,
    solvent: &str,
    temperatures: &[f64],
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<Vec<ActivityPoint>> {
    map_points(temperatures, |&t| {
        activity_point(engine, composition, solute, solvent, t, phase, order, model).map(Some)
    })
}

/// Solute activity while the fraction of `varied` changes.
///
/// The solute is held at `solute_fraction`, `varied` takes each value of
/// `fractions` and the solvent makes up the rest. Points where solute and
/// varied element leave no room for the solvent are skipped.
pub fn activity_composition_sweep<S: ElementStore>(
    engine: &Engine<S>,
    solute: &str,
    solute_fraction: f64,
    varied: &str,
    solvent: &str,
    fractions: &[f64],
    temperature: f64,
    phase: PhaseState,
    order: OrderingClass,
    model: ExtrapolationModel,
) -> EngineResult<Vec<ActivityPoint>> {
    if solute == varied || solute == solvent || varied == solvent {
        return Err(EngineError::InvalidComposition(format!(
            "solute, varied element and solvent must differ: {}, {}, {}",
            solute, varied, solvent
        )));
    }

    map_points(fractions, |&x| {
        let occupied = solute_fraction + x;
        if x < 0.0 || 1.0 - occupied < MIN_SOLVENT {
            log::debug!("activity sweep point {}={} skipped: no solvent left", varied, x);
            return Ok(None);
        }
        let composition = Composition::from_pairs([
            (solute, solute_fraction),
            (varied, x),
            (solvent, 1.0 - occupied),
        ])?;
        activity_point(engine, &composition, solute, solvent, temperature, phase, order, model)
            .map(Some)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SOLID: PhaseState = PhaseState::Solid;
    const SS: OrderingClass = OrderingClass::SolidSolution;

    #[test]
    fn test_steps_include_end() {
        assert_eq!(steps(300.0, 500.0, 100.0), vec![300.0, 400.0, 500.0]);
        let fractions = steps(0.0, 0.3, 0.1);
        assert_eq!(fractions.len(), 4);
        assert_relative_eq!(fractions[3], 0.3, epsilon = 1e-12);
        assert!(steps(1.0, 0.0, 0.1).is_empty());
        assert!(steps(0.0, 1.0, 0.0).is_empty());
        assert!(steps(0.0, 1.0, f64::NAN).is_empty());
    }

    #[test]
    fn test_steps_refuse_oversized_grids() {
        assert!(steps(0.0, 1.0, 1e-300).is_empty());
        assert!(steps(0.0, f64::MAX, 1.0).is_empty());
        assert_eq!(steps(0.0, 1.0, 1e-5).len(), 100_001);
        assert_eq!(steps(1.0, (MAX_STEPS - 1) as f64, 1.0).len(), MAX_STEPS - 1);
    }

    #[test]
    fn test_temperature_sweep_matches_engine() {
        let engine = Engine::with_builtin_elements();
        let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
        let model = ExtrapolationModel::Uem1;
        let temperatures = [900.0, 1200.0, 1500.0];
        let points = temperature_sweep(&engine, &alloy, &temperatures, SOLID, SS, model).unwrap();
        assert_eq!(points.len(), 3);
        for point in &points {
            let t = point.temperature;
            let enthalpy = engine.mixing_enthalpy(&alloy, t, SOLID, SS, model).unwrap();
            assert_eq!(point.enthalpy, enthalpy);
            let gibbs_energy = engine.gibbs_energy(&alloy, t, SOLID, SS, model).unwrap();
            assert_eq!(point.gibbs_energy, gibbs_energy);
            assert_eq!(point.entropy, engine.mixing_entropy(&alloy, t, SOLID, SS, model).unwrap());
        }
        assert_eq!(points[0].temperature, 900.0);
        assert_eq!(points[2].temperature, 1500.0);
    }

    #[test]
    fn test_temperature_sweep_rejects_bad_temperature() {
        let engine = Engine::with_builtin_elements();
        let alloy: Composition = "Fe0.5Ni0.5".parse().unwrap();
        let model = ExtrapolationModel::Kohler;
        let result = temperature_sweep(&engine, &alloy, &[1000.0, -1.0], SOLID, SS, model);
        assert!(matches!(result, Err(EngineError::InvalidTemperature(_))));
    }

    #[test]
    fn test_addition_sweep_skips_invalid_fractions() {
        let engine = Engine::with_builtin_elements();
        let matrix: Composition = "Fe0.6Ni0.4".parse().unwrap();
        let model = ExtrapolationModel::Muggianu;
        let fractions = [-0.1, 0.0, 0.2, 1.5];
        let points =
            addition_sweep(&engine, &matrix, "Cr", &fractions, 1200.0, SOLID, SS, model).unwrap();
        assert_eq!(points.len(), 2);

        assert_eq!(points[0].composition.get("Cr"), Some(0.0));
        let pure_matrix = engine.gibbs_energy(&matrix, 1200.0, SOLID, SS, model).unwrap();
        assert_relative_eq!(points[0].gibbs_energy, pure_matrix, max_relative = 1e-9);

        let diluted = &points[1].composition;
        assert_relative_eq!(diluted.get("Fe").unwrap(), 0.48, epsilon = 1e-12);
        assert_relative_eq!(diluted.get("Cr").unwrap(), 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_activity_temperature_sweep() {
        let engine = Engine::with_builtin_elements();
        let alloy: Composition = "Fe0.7Cr0.3".parse().unwrap();
        let points = activity_temperature_sweep(
            &engine,
            &alloy,
            "Cr",
            "Fe",
            &steps(1000.0, 1600.0, 200.0),
            SOLID,
            SS,
            ExtrapolationModel::Kohler,
        )
        .unwrap();
        assert_eq!(points.len(), 4);
        for point in &points {
            assert!(point.ln_gamma.is_finite());
            assert_relative_eq!(point.activity, 0.3 * point.ln_gamma.exp(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_activity_composition_sweep() {
        let engine = Engine::with_builtin_elements();
        let fractions = steps(0.0, 0.9, 0.3);
        let points = activity_composition_sweep(
            &engine,
            "Cr",
            0.1,
            "Ni",
            "Fe",
            &fractions,
            1200.0,
            SOLID,
            SS,
            ExtrapolationModel::Muggianu,
        )
        .unwrap();
        // 0.1 + 0.9 leaves no solvent
        assert_eq!(points.len(), 3);
        assert_relative_eq!(points[1].composition.get("Ni").unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(points[1].composition.get("Fe").unwrap(), 0.6, epsilon = 1e-12);
        assert!(points.iter().all(|p| p.activity > 0.0));
    }

    #[test]
    fn test_activity_composition_sweep_needs_distinct_elements() {
        let engine = Engine::with_builtin_elements();
        let result = activity_composition_sweep(
            &engine,
            "Cr",
            0.1,
            "Cr",
            "Fe",
            &[0.1],
            1200.0,
            SOLID,
            SS,
            ExtrapolationModel::Kohler,
        );
        assert!(matches!(result, Err(EngineError::InvalidComposition(_))));
    }
}
