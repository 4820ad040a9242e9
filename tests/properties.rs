//! Property tests: correction factors, fidelity layering and optimizer bounds.

use std::sync::Arc;

use fcsim_rs::correlations::Correlations;
use fcsim_rs::optimizer::{Algorithm, ConstraintSet, ObjectiveSpec, OptimizationConfig, OptimizationEngine, OptimizationRequest};
use fcsim_rs::{FidelityLevel, OperatingParameters, ParameterKind, ParameterSpace, PredictionEngine, SimConfig};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn engine() -> Arc<PredictionEngine> {
    Arc::new(PredictionEngine::new(&SimConfig::default()).unwrap())
}

/// Maps unit-cube coordinates onto every declared parameter of `space`.
fn point_in(space: &ParameterSpace, unit: &[f64]) -> OperatingParameters {
    ParameterKind::ALL
        .iter()
        .filter_map(|k| space.get(*k).map(|def| (*k, def)))
        .zip(unit.iter())
        .fold(space.defaults(), |params, ((kind, def), u)| params.with_value(kind, def.denormalize(*u)))
}

fn arb_unit_point() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..=1.0, ParameterKind::ALL.len())
}

fn arb_algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::GradientDescent),
        Just(Algorithm::GeneticAlgorithm),
        Just(Algorithm::Bayesian),
        Just(Algorithm::ParticleSwarm),
    ]
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_temperature_factor_never_positive(t in -50.0f64..1200.0) {
        let lib = Correlations::standard();
        for name in lib.tables().species_names() {
            let s = lib.tables().species(name).unwrap();
            let f = lib.temperature_factor(t, s.optimal_temperature, s.max_temperature);
            prop_assert!(f <= 0.0);
            prop_assert!(f >= lib.constants().severe_temperature_penalty);
            prop_assert_eq!(lib.temperature_factor(s.optimal_temperature, s.optimal_temperature, s.max_temperature), 0.0);
        }
    }

    #[test]
    fn prop_ph_factor_never_positive(ph in 0.0f64..14.0, optimum in 4.0f64..10.0) {
        let lib = Correlations::standard();
        let f = lib.ph_factor(ph, Some(optimum));
        prop_assert!(f <= 0.0);
        prop_assert!(f >= -lib.constants().max_factor_penalty);
        prop_assert_eq!(lib.ph_factor(optimum, Some(optimum)), 0.0);
        prop_assert_eq!(lib.ph_factor(ph, None), 0.0);
    }
}

// ---------------------------------------------------------------------------
// Fidelity layering
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_higher_fidelity_keeps_basic_fields(unit in arb_unit_point(), use_stack in any::<bool>()) {
        let engine = engine();
        let id = if use_stack { "pem-stack" } else { "mfc-lab" };
        let config = engine.configuration(id).unwrap();
        let params = point_in(&config.parameter_space, &unit);

        let basic = engine.predict(id, &params, FidelityLevel::Basic).unwrap();
        let intermediate = engine.predict(id, &params, FidelityLevel::Intermediate).unwrap();
        let advanced = engine.predict(id, &params, FidelityLevel::Advanced).unwrap();

        prop_assert!(intermediate.same_basic(&basic));
        prop_assert!(advanced.same_basic(&basic));
        prop_assert_eq!(&advanced.thermal, &intermediate.thermal);
        prop_assert_eq!(&advanced.gas, &intermediate.gas);
        prop_assert!(basic.respects(FidelityLevel::Basic));
        prop_assert!(advanced.respects(FidelityLevel::Advanced));
    }
}

// ---------------------------------------------------------------------------
// Optimizer bounds
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_optimization_stays_inside_hard_bounds(
        algorithm in arb_algorithm(),
        t_lo in 15.0f64..30.0,
        t_width in 1.0f64..15.0,
        v_hi in 0.3f64..1.0,
        seed in any::<u64>(),
    ) {
        let engine = engine();
        let optimizer = OptimizationEngine::new(
            engine.clone(),
            OptimizationConfig {
                max_iterations: 3,
                population_size: 6,
                acquisition_samples: 16,
                compute_sensitivity: false,
                seed: Some(seed),
                ..Default::default()
            },
        );
        let start = engine.configuration("mfc-lab").unwrap().parameter_space.defaults();
        let constraints = ConstraintSet::new()
            .with_bound(ParameterKind::Temperature, t_lo, t_lo + t_width)
            .with_bound(ParameterKind::Voltage, 0.1, v_hi);
        let request = OptimizationRequest::new("mfc-lab", start, ObjectiveSpec::MaximizePower, algorithm)
            .with_constraints(constraints.clone());

        let run = optimizer.optimize(&request, None).unwrap();
        prop_assert!(constraints.within_bounds(&run.best.params));
        prop_assert!(constraints.within_bounds(&run.baseline.params));
        prop_assert!(run.best.fitness >= run.baseline.fitness);
        for record in &run.history {
            prop_assert!(constraints.within_bounds(&record.parameters));
        }
    }
}
