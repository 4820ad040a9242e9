//! # FCSIM-RS
//!
//! Demo driver: predicts every catalog reactor at each supported fidelity
//! and optimizes the lab MFC for power density with every algorithm.
//!
//! Usage: `fcsim [settings.toml]`, log level via `RUST_LOG`.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fcsim_rs::optimizer::{Algorithm, ObjectiveSpec, OptimizationEngine, OptimizationRequest};
use fcsim_rs::*;

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let settings = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_toml_str(&std::fs::read_to_string(&path)?)?,
        None => SimConfig::default(),
    };

    println!("{}", info());
    println!();

    let engine = Arc::new(PredictionEngine::new(&settings)?);

    println!("{:<12} {:<13} {:>12} {:>10} {:>8} {:>9}", "reactor", "fidelity", "P (W/m²)", "V (V)", "η (%)", "status");
    for id in engine.reactor_ids() {
        let config = engine.configuration(&id)?;
        let params = config.parameter_space.defaults();
        for fidelity in FidelityLevel::ALL {
            if fidelity > config.reactor_type.max_fidelity() {
                continue;
            }
            let result = engine.predict(&id, &params, fidelity)?;
            println!(
                "{:<12} {:<13} {:>12.3} {:>10.3} {:>8.1} {:>9}",
                id,
                result.fidelity.to_string(),
                result.power_density,
                result.stack_voltage,
                result.efficiency,
                result.status.to_string()
            );
        }
    }
    println!();

    let optimizer = OptimizationEngine::new(engine.clone(), settings.optimizer.clone());
    let start = engine.configuration("mfc-lab")?.parameter_space.defaults();
    let mut last = None;
    for algorithm in Algorithm::ALL {
        let request = OptimizationRequest::new("mfc-lab", start.clone(), ObjectiveSpec::MaximizePower, algorithm);
        let run = optimizer.optimize(&request, None)?;
        println!(
            "{:<18} {:>3} iterations {:<15} {:.4} -> {:.4} W/m² ({:+.2}%)",
            run.algorithm.to_string(),
            run.history.len(),
            format!("{:?}", run.outcome),
            run.baseline.score,
            run.best.score,
            run.improvement_percent()
        );
        last = Some(run);
    }
    if let Some(run) = last {
        println!();
        println!("Recommendations ({}):", run.algorithm);
        for rec in &run.recommendations {
            println!("  - {}", rec.rationale);
        }
    }

    let stats = engine.cache_stats();
    println!();
    println!("Cache: {} entries, hit rate {:.1}%", stats.entries, stats.hit_rate() * 100.0);
    Ok(())
}
