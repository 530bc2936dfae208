use std::sync::Arc;

use approx::assert_relative_eq;
use miedema_mix::report::VecSink;
use miedema_mix::sweep::{addition_sweep, steps, temperature_sweep};
use miedema_mix::{
    Composition, Convergence, DerivativeStrategy, ElementTable, Engine, EngineConfig, EngineError,
    ExtrapolationModel, OrderingClass, PhaseState,
};

const SOLID: PhaseState = PhaseState::Solid;
const LIQUID: PhaseState = PhaseState::Liquid;
const SS: OrderingClass = OrderingClass::SolidSolution;
const IM: OrderingClass = OrderingClass::Intermetallic;
const KOHLER: ExtrapolationModel = ExtrapolationModel::Kohler;
const MUGGIANU: ExtrapolationModel = ExtrapolationModel::Muggianu;

fn engine_with_strategy(strategy: DerivativeStrategy) -> Engine {
    let mut config = EngineConfig::default();
    config.activity.strategy = strategy;
    Engine::with_config(ElementTable::builtin(), config)
}

#[test]
fn test_fe_ni_intermetallic_kohler_scenario() {
    let engine = Engine::with_builtin_elements();
    let alloy = Composition::from_pairs([("Fe", 0.7), ("Ni", 0.3)]).unwrap();
    let phase: PhaseState = "S".parse().unwrap();
    let order: OrderingClass = "IM".parse().unwrap();

    let direct = engine.binary("Fe", "Ni", phase, order).unwrap().enthalpy_of_mixing(0.7, 0.3);
    let extrapolated =
        engine.mixing_enthalpy(&alloy, 1000.0, phase, order, ExtrapolationModel::Kohler).unwrap();
    assert_eq!(extrapolated, direct);
}

#[test]
fn test_binary_alloys_ignore_the_model() {
    let engine = Engine::with_builtin_elements();
    for (a, b, xa) in [("Fe", "Cr", 0.25), ("Al", "Ni", 0.5), ("Cu", "Zr", 0.8)] {
        let alloy = Composition::from_pairs([(a, xa), (b, 1.0 - xa)]).unwrap();
        for phase in [SOLID, LIQUID] {
            let direct = engine.binary(a, b, phase, SS).unwrap().enthalpy_of_mixing(xa, 1.0 - xa);
            for model in ExtrapolationModel::ALL {
                let h = engine.mixing_enthalpy(&alloy, 1300.0, phase, SS, model).unwrap();
                assert_eq!(h, direct, "{}-{} {} {}", a, b, phase, model);
            }
        }
    }
}

#[test]
fn test_symmetric_coefficients_are_constant() {
    let engine = Engine::with_builtin_elements();
    for (k, i, j) in [("Cr", "Fe", "Ni"), ("Si", "Al", "Mg"), ("W", "Mo", "Nb")] {
        for t in [500.0, 1500.0] {
            for phase in [SOLID, LIQUID] {
                let kohler = engine.contribution_coefficient(KOHLER, k, i, j, t, phase, SS);
                let muggianu = engine.contribution_coefficient(MUGGIANU, k, i, j, t, phase, SS);
                assert_eq!(kohler.unwrap(), 0.0);
                assert_eq!(muggianu.unwrap(), 0.5);
            }
        }
    }
}

#[test]
fn test_physical_coefficients_in_unit_interval() {
    let engine = Engine::with_builtin_elements();
    let triples = [
        ("Cr", "Fe", "Ni"),
        ("Al", "Fe", "Ni"),
        ("Si", "Fe", "Cr"),
        ("Cu", "Ag", "Au"),
        ("Ti", "Al", "Zr"),
    ];
    for model in [ExtrapolationModel::Gsm, ExtrapolationModel::Uem1, ExtrapolationModel::Uem2N] {
        for (k, i, j) in triples {
            let alpha = engine.contribution_coefficient(model, k, i, j, 1400.0, LIQUID, SS);
            let alpha = alpha.unwrap();
            assert!((0.0..=1.0).contains(&alpha), "{} {}-{}-{}: {}", model, k, i, j, alpha);
        }
    }
}

#[test]
fn test_gibbs_energy_is_continuous_in_temperature() {
    let engine = Engine::with_builtin_elements();
    let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
    for model in [ExtrapolationModel::Muggianu, ExtrapolationModel::Uem1, ExtrapolationModel::Gsm] {
        let g = engine.gibbs_energy(&alloy, 1200.0, SOLID, SS, model).unwrap();
        let mut previous = f64::INFINITY;
        for eps in [1.0, 1e-1, 1e-2, 1e-3] {
            let shifted = engine.gibbs_energy(&alloy, 1200.0 + eps, SOLID, SS, model).unwrap();
            let gap = (shifted - g).abs();
            assert!(gap < previous, "{} at ε = {}: {} >= {}", model, eps, gap, previous);
            previous = gap;
        }
        assert!(previous < 1e-4);
    }
}

#[test]
fn test_exact_and_numerical_activity_agree() {
    let exact = engine_with_strategy(DerivativeStrategy::Exact);
    let numerical = engine_with_strategy(DerivativeStrategy::Numerical);
    let alloys = ["Fe0.5Ni0.3Cr0.2", "Fe0.4Ni0.3Cr0.2Al0.1", "Fe0.3Ni0.2Cr0.2Co0.2Mn0.1"];
    for formula in alloys {
        let alloy: Composition = formula.parse().unwrap();
        for model in ExtrapolationModel::ALL {
            let a = exact.activity(&alloy, "Ni", "Fe", 1200.0, SOLID, SS, model).unwrap();
            let b = numerical.activity(&alloy, "Ni", "Fe", 1200.0, SOLID, SS, model).unwrap();
            assert_relative_eq!(a, b, max_relative = 1e-3);
        }
    }
}

#[test]
fn test_repeated_calls_are_identical() {
    let engine = Engine::with_builtin_elements();
    let alloy: Composition = "Fe0.4Ni0.3Cr0.2Al0.1".parse().unwrap();
    for model in ExtrapolationModel::ALL {
        let first = (
            engine.mixing_enthalpy(&alloy, 1250.0, LIQUID, SS, model).unwrap(),
            engine.gibbs_energy(&alloy, 1250.0, LIQUID, SS, model).unwrap(),
            engine.activity_coefficient(&alloy, "Al", "Fe", 1250.0, LIQUID, SS, model).unwrap(),
        );
        let second = (
            engine.mixing_enthalpy(&alloy, 1250.0, LIQUID, SS, model).unwrap(),
            engine.gibbs_energy(&alloy, 1250.0, LIQUID, SS, model).unwrap(),
            engine.activity_coefficient(&alloy, "Al", "Fe", 1250.0, LIQUID, SS, model).unwrap(),
        );
        assert_eq!(first.0.to_bits(), second.0.to_bits());
        assert_eq!(first.1.to_bits(), second.1.to_bits());
        assert_eq!(first.2.to_bits(), second.2.to_bits());
    }
}

#[test]
fn test_zero_fractions_never_raise() {
    let engine = Engine::with_builtin_elements();
    let alloy =
        Composition::from_pairs([("Fe", 0.6), ("Ni", 0.0), ("Cr", 0.4), ("Al", 0.0)]).unwrap();
    for model in ExtrapolationModel::ALL {
        assert!(engine.mixing_enthalpy(&alloy, 1200.0, SOLID, SS, model).unwrap().is_finite());
        assert!(engine.gibbs_energy(&alloy, 1200.0, SOLID, SS, model).unwrap().is_finite());
        assert!(engine.mixing_entropy(&alloy, 1200.0, SOLID, SS, model).unwrap().is_finite());
        let ln_gamma = engine.activity_coefficient(&alloy, "Cr", "Fe", 1200.0, SOLID, SS, model);
        assert!(ln_gamma.unwrap().is_finite());
    }
}

#[test]
fn test_typed_tags_reject_garbage() {
    assert_eq!("Q".parse::<PhaseState>(), Err(EngineError::InvalidPhase("Q".to_string())));
    assert_eq!("XYZ".parse::<OrderingClass>(), Err(EngineError::InvalidOrder("XYZ".to_string())));
    assert!(matches!("Redlich".parse::<ExtrapolationModel>(), Err(EngineError::UnknownModel(_))));
}

#[test]
fn test_unknown_elements_surface() {
    let engine = Engine::with_builtin_elements();
    let alloy: Composition = "Fe0.5Uu0.5".parse().unwrap();
    assert_eq!(
        engine.gibbs_energy(&alloy, 1000.0, SOLID, SS, ExtrapolationModel::Muggianu),
        Err(EngineError::UnknownElement("Uu".to_string()))
    );
}

#[test]
fn test_custom_store_from_json() {
    let json = r#"[
        { "symbol": "Aa", "phi": 4.5, "n_ws": 1.5, "volume": 4.0, "u": 0.04,
          "hybridization": "alpha", "hybridization_value": 1.0,
          "transition_metal": true, "transition_enthalpy": 0.0, "melting_point": 1500.0 },
        { "symbol": "Bb", "phi": 5.0, "n_ws": 1.6, "volume": 3.8, "u": 0.04,
          "hybridization": "other", "hybridization_value": 0.0,
          "transition_metal": true, "transition_enthalpy": 0.0, "melting_point": 1700.0 }
    ]"#;
    let table = Arc::new(ElementTable::from_json(json).unwrap());
    let engine = Engine::new(Arc::clone(&table));
    let alloy: Composition = "Aa1Bb1".parse().unwrap();
    let h = engine.mixing_enthalpy(&alloy, 1000.0, SOLID, SS, ExtrapolationModel::Kohler).unwrap();
    assert!(h.is_finite());
    assert!(h < 0.0);
}

#[test]
fn test_contribution_report_collects_rows() {
    let engine = Engine::with_builtin_elements();
    let alloy: Composition = "Fe0.4Ni0.3Cr0.2Al0.1".parse().unwrap();
    let mut sink = VecSink::new();
    let rows = engine
        .contribution_report(&alloy, 1200.0, SOLID, SS, ExtrapolationModel::Uem1, &mut sink)
        .unwrap();
    assert_eq!(rows, 4);
    let first = &sink.rows()[0];
    let direct = engine
        .contribution_coefficient(
            ExtrapolationModel::Uem1,
            &first.k,
            &first.i,
            &first.j,
            1200.0,
            SOLID,
            SS,
        )
        .unwrap();
    assert_eq!(first.k_i, direct);
}

#[test]
fn test_sweeps_cover_the_grid() {
    let engine = Engine::with_builtin_elements();
    let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
    let temperatures = steps(800.0, 1600.0, 200.0);
    let model = ExtrapolationModel::Gsm;
    let points = temperature_sweep(&engine, &alloy, &temperatures, SOLID, SS, model).unwrap();
    let swept: Vec<f64> = points.iter().map(|p| p.temperature).collect();
    assert_eq!(swept, temperatures);

    let matrix: Composition = "Fe0.8Ni0.2".parse().unwrap();
    let fractions = steps(0.0, 0.5, 0.1);
    let model = ExtrapolationModel::ToopKohler;
    let diluted =
        addition_sweep(&engine, &matrix, "Al", &fractions, 1200.0, LIQUID, SS, model).unwrap();
    assert_eq!(diluted.len(), fractions.len());
    for (point, &x) in diluted.iter().zip(&fractions) {
        assert_relative_eq!(point.composition.get("Al").unwrap(), x, epsilon = 1e-12);
    }
}

#[test]
fn test_config_from_json_drives_the_engine() {
    let config = EngineConfig::from_json(
        r#"{ "activity": { "strategy": "exact", "max_exact_components": 2 },
             "volume": { "max_iterations": 200 } }"#,
    )
    .unwrap();
    let engine = Engine::with_config(ElementTable::builtin(), config);
    assert_eq!(engine.config().volume.max_iterations, 200);

    let alloy: Composition = "Fe0.5Ni0.3Cr0.2".parse().unwrap();
    assert_eq!(
        engine.activity_coefficient(&alloy, "Cr", "Fe", 1200.0, SOLID, SS, KOHLER),
        Err(EngineError::UnsupportedArity { components: 3, max: 2 })
    );
}

#[test]
fn test_volume_iteration_limit_is_reported() {
    let mut config = EngineConfig::default();
    config.volume.max_iterations = 1;
    let engine = Engine::with_config(ElementTable::builtin(), config);
    let alloy: Composition = "Fe0.5Ni0.3Al0.2".parse().unwrap();
    let evaluation =
        engine.aggregator().evaluate_enthalpy(&alloy, 1200.0, SOLID, IM, MUGGIANU).unwrap();

    assert!(evaluation.total.is_finite());
    assert!(!evaluation.volumes_converged());
    assert_eq!(evaluation.pairs.len(), 3);
    for pair in &evaluation.pairs {
        assert_eq!(pair.volumes, Some(Convergence::IterationLimit { iterations: 1 }));
    }

    let reference = Engine::with_builtin_elements();
    let converged =
        reference.aggregator().evaluate_enthalpy(&alloy, 1200.0, SOLID, IM, MUGGIANU).unwrap();
    assert!(converged.volumes_converged());
    assert!(evaluation.total != converged.total);
}

#[test]
fn test_huge_timeout_does_not_panic() {
    assert!(matches!(
        EngineConfig::from_json(r#"{ "volume": { "timeout_secs": 1e30 } }"#),
        Err(EngineError::Config(_))
    ));

    let mut config = EngineConfig::default();
    config.volume.timeout_secs = 1e30;
    let engine = Engine::with_config(ElementTable::builtin(), config);
    let alloy: Composition = "Fe0.5Ni0.5".parse().unwrap();
    let h = engine.mixing_enthalpy(&alloy, 1200.0, SOLID, SS, ExtrapolationModel::Kohler).unwrap();
    assert!(h.is_finite());
}
