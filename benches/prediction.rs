//! Prediction benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fcsim_rs::optimizer::{Algorithm, ObjectiveSpec, OptimizationConfig, OptimizationEngine, OptimizationRequest};
use fcsim_rs::{FidelityLevel, ParameterKind, PredictionEngine, SimConfig};

fn engine() -> PredictionEngine {
    PredictionEngine::new(&SimConfig::default()).unwrap()
}

fn bench_basic_prediction(c: &mut Criterion) {
    let engine = engine();
    let params = engine.configuration("mfc-lab").unwrap().parameter_space.defaults();

    c.bench_function("predict_basic_mfc", |b| {
        b.iter(|| {
            engine.clear_cache();
            engine.predict("mfc-lab", black_box(&params), FidelityLevel::Basic)
        })
    });
}

fn bench_advanced_prediction(c: &mut Criterion) {
    let engine = engine();
    let params = engine.configuration("pem-stack").unwrap().parameter_space.defaults();

    c.bench_function("predict_advanced_pem", |b| {
        b.iter(|| {
            engine.clear_cache();
            engine.predict("pem-stack", black_box(&params), FidelityLevel::Advanced)
        })
    });
}

fn bench_cached_prediction(c: &mut Criterion) {
    let engine = engine();
    let params = engine
        .configuration("sofc-stack")
        .unwrap()
        .parameter_space
        .defaults()
        .with_value(ParameterKind::Temperature, 780.0);
    engine.predict("sofc-stack", &params, FidelityLevel::Advanced).unwrap();

    c.bench_function("predict_cached_sofc", |b| {
        b.iter(|| engine.predict("sofc-stack", black_box(&params), FidelityLevel::Advanced))
    });
}

fn bench_genetic_run(c: &mut Criterion) {
    let engine = std::sync::Arc::new(engine());
    let optimizer = OptimizationEngine::new(
        engine.clone(),
        OptimizationConfig {
            max_iterations: 5,
            population_size: 10,
            compute_sensitivity: false,
            seed: Some(7),
            ..Default::default()
        },
    );
    let start = engine.configuration("mfc-lab").unwrap().parameter_space.defaults();
    let request = OptimizationRequest::new("mfc-lab", start, ObjectiveSpec::MaximizePower, Algorithm::GeneticAlgorithm);

    c.bench_function("optimize_genetic_mfc", |b| {
        b.iter(|| {
            engine.clear_cache();
            optimizer.optimize(black_box(&request), None)
        })
    });
}

criterion_group!(
    benches,
    bench_basic_prediction,
    bench_advanced_prediction,
    bench_cached_prediction,
    bench_genetic_run
);
criterion_main!(benches);
