//! # NEUROFLAP
//!
//! Neuroevolution of small gated recurrent networks for binary control.
//!
//! ## Features
//!
//! - **Second-order networks**: gated connections, self-connections and
//!   eligibility traces, with optional supervised propagation
//! - **Genetic search**: fitness-ranked selection, elitism, single-point bias
//!   crossover and multiplicative mutation over positional genomes
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: seeded random number generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neuroflap::{Config, Target, Trainer};
//!
//! let mut trainer = Trainer::new(&Config::default()).unwrap();
//! trainer.create_population();
//!
//! // every tick, for every live agent
//! let flap = trainer.decide(0, 320.0, &Target::new(180.0, 400.0)).unwrap();
//!
//! // at the end of the round
//! trainer.set_fitness(0, 512.0, 2.0).unwrap();
//! trainer.evolve_population().unwrap();
//! # let _ = flap;
//! ```
//!
//! ## Networks
//!
//! ```rust
//! use neuroflap::neural::{Network, Topology};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(7);
//! let mut net = Network::perceptron(&Topology::new(2, 3, 1), &mut rng);
//! let output = net.activate(&[0.5, -0.5]).unwrap();
//! assert_eq!(output.len(), 1);
//!
//! let copy = Network::from_genome(&net.to_genome()).unwrap();
//! assert_eq!(copy.neuron_count(), net.neuron_count());
//! ```

pub mod config;
pub mod error;
pub mod evolution;
pub mod genetics;
pub mod neural;
pub mod stats;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use evolution::{Agent, Target, Trainer, TrainerState, Unit};
pub use neural::{Genome, Network, Topology};
pub use stats::{BestRecord, GenerationStats, StatsHistory};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Observations scored per unit and generation in [`benchmark`]
const BENCHMARK_TICKS: usize = 64;

/// Run a quick benchmark.
///
/// Each unit sees random observations and earns one fitness point per tick
/// on which it flaps exactly when the agent is below the gap.
pub fn benchmark(generations: u64, population: usize) -> Result<BenchmarkResult> {
    use std::time::Instant;

    let config = Config::with_units(population, (population / 4).max(2));
    let mut trainer = Trainer::with_seed(&config, 42)?;
    trainer.create_population();
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let start = Instant::now();
    let mut decisions = 0u64;
    for _ in 0..generations {
        for index in 0..trainer.max_units() {
            let mut fitness = 0.0;
            for _ in 0..BENCHMARK_TICKS {
                let agent_y: f64 = rng.gen_range(0.0..800.0);
                let target = Target::new(rng.gen_range(0.0..700.0), rng.gen_range(150.0..650.0));
                let flap = trainer.decide(index, agent_y, &target)?;
                if flap == (agent_y > target.y) {
                    fitness += 1.0;
                }
                decisions += 1;
            }
            trainer.set_fitness(index, fitness, fitness)?;
        }
        trainer.evolve_population()?;
    }
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        generations,
        population: trainer.max_units(),
        decisions,
        elapsed_secs: elapsed.as_secs_f64(),
        generations_per_second: generations as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        best_fitness: trainer.best().map_or(0.0, |b| b.fitness),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: u64,
    pub population: usize,
    pub decisions: u64,
    pub elapsed_secs: f64,
    pub generations_per_second: f64,
    pub best_fitness: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Decisions: {}", self.decisions)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} generations/s", self.generations_per_second)?;
        writeln!(f, "Best fitness: {:.0} / {}", self.best_fitness, BENCHMARK_TICKS)?;
        Ok(())
    }
}
