//! NEUROFLAP - CLI Entry Point
//!
//! Evolves flapping agents through a built-in obstacle course.

use clap::{Parser, Subcommand};
use neuroflap::{benchmark, Agent, Config, Target, Trainer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "neuroflap")]
#[command(version)]
#[command(about = "Neuroevolution of gated recurrent networks for a flapping-agent course")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population on the obstacle course
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations to evolve
        #[arg(short, long, default_value = "50")]
        generations: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Write the best genome to this JSON file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write per-generation statistics to this JSON file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of generations
        #[arg(short, long, default_value = "100")]
        generations: u64,

        /// Population size
        #[arg(short, long, default_value = "50")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            generations,
            seed,
            export,
            history,
            quiet,
        } => run_course(config, generations, seed, export, history, quiet),

        Commands::Benchmark {
            generations,
            population,
        } => {
            init_logging("info");
            run_benchmark(generations, population)
        }

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

const HEIGHT: f64 = 800.0;
const GRAVITY: f64 = 0.3;
const FLAP_VELOCITY: f64 = -6.0;
const SPEED: f64 = 3.0;
const FIRST_BARRIER: f64 = 400.0;
const BARRIER_SPACING: f64 = 250.0;
const BARRIER_WIDTH: f64 = 50.0;
const GAP_HEIGHT: f64 = 160.0;
const MAX_TICKS: u64 = 20_000;

/// One flapping agent, driven by the unit with the same index
struct Bird {
    index: usize,
    y: f64,
    velocity: f64,
    alive: bool,
}

impl Agent for Bird {
    fn index(&self) -> usize {
        self.index
    }

    fn y(&self) -> f64 {
        self.y
    }

    fn act(&mut self) {
        self.velocity = FLAP_VELOCITY;
    }
}

/// Endless row of barriers, each with a gap centred at `gaps[i]`
struct Course {
    gaps: Vec<f64>,
}

impl Course {
    fn new() -> Self {
        Self { gaps: Vec::new() }
    }

    fn barrier_x(i: usize) -> f64 {
        FIRST_BARRIER + i as f64 * BARRIER_SPACING
    }

    /// Index of the first barrier the agent has not fully passed
    fn next_barrier<R: Rng>(&mut self, distance: f64, rng: &mut R) -> usize {
        let i = ((distance - FIRST_BARRIER - BARRIER_WIDTH) / BARRIER_SPACING)
            .ceil()
            .max(0.0) as usize;
        while self.gaps.len() <= i {
            self.gaps.push(rng.gen_range(150.0..650.0));
        }
        i
    }

    fn target<R: Rng>(&mut self, distance: f64, rng: &mut R) -> (usize, Target) {
        let i = self.next_barrier(distance, rng);
        (i, Target::new(Self::barrier_x(i) - distance, self.gaps[i]))
    }

    fn collides(&self, i: usize, distance: f64, y: f64) -> bool {
        let x = Self::barrier_x(i);
        let inside = distance >= x && distance <= x + BARRIER_WIDTH;
        inside && (y - self.gaps[i]).abs() > GAP_HEIGHT / 2.0
    }
}

/// Play one round with the current population and write back fitness and
/// score for every unit
fn play_round<R: Rng>(trainer: &mut Trainer, rng: &mut R) -> neuroflap::Result<(f64, u64)> {
    let mut course = Course::new();
    let mut birds: Vec<Bird> = (0..trainer.max_units())
        .map(|index| Bird {
            index,
            y: HEIGHT / 2.0,
            velocity: 0.0,
            alive: true,
        })
        .collect();

    let mut distance = 0.0;
    let mut ticks = 0;
    while birds.iter().any(|b| b.alive) && ticks < MAX_TICKS {
        let (barrier, target) = course.target(distance, rng);

        for bird in birds.iter_mut().filter(|b| b.alive) {
            trainer.activate_brain(bird, &target)?;

            bird.velocity += GRAVITY;
            bird.y += bird.velocity;

            let crashed = bird.y < 0.0 || bird.y > HEIGHT || course.collides(barrier, distance, bird.y);
            if crashed {
                bird.alive = false;
                trainer.set_fitness(bird.index, distance - target.x, barrier as f64)?;
            }
        }

        distance += SPEED;
        ticks += 1;
    }

    let (barrier, target) = course.target(distance, rng);
    for bird in birds.iter().filter(|b| b.alive) {
        trainer.set_fitness(bird.index, distance - target.x, barrier as f64)?;
    }

    Ok((distance, ticks))
}

fn run_course(
    config_path: PathBuf,
    generations: u64,
    seed: Option<u64>,
    export: Option<PathBuf>,
    history: Option<PathBuf>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        Config::default()
    };
    init_logging(&config.logging.log_level);

    if config_path.exists() {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }

    let (mut trainer, mut rng) = match seed {
        Some(s) => {
            println!("Using seed: {}", s);
            (Trainer::with_seed(&config, s)?, ChaCha8Rng::seed_from_u64(s.wrapping_add(1)))
        }
        None => (Trainer::new(&config)?, ChaCha8Rng::from_entropy()),
    };
    trainer.create_population();

    println!("Starting evolution");
    println!("  Units: {} (top {})", trainer.max_units(), trainer.top_units());
    println!(
        "  Network: {}-{}-{}",
        config.network.n_inputs, config.network.n_hidden, config.network.n_outputs
    );
    println!("  Generations: {}", generations);
    println!();

    let start = Instant::now();
    for _ in 0..generations {
        let (distance, ticks) = play_round(&mut trainer, &mut rng)?;
        log::debug!("Round over after {} ticks, {:.0} px", ticks, distance);

        trainer.evolve_population()?;

        if !quiet {
            if let Some(stats) = trainer.history().latest() {
                println!("{}", stats.summary());
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("=== Evolution Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Generations: {}", trainer.generation() - 1);
    println!("Restarts: {}", trainer.history().restarts());

    if let Some(best) = trainer.best() {
        println!(
            "Best: generation {} fitness {:.1} score {:.0}",
            best.generation, best.fitness, best.score
        );
        if let Some(path) = export {
            std::fs::write(&path, best.genome.to_json()?)?;
            println!("Best genome: {:?}", path);
        }
    }

    if let Some(path) = history {
        trainer.history().save_json(&path)?;
        println!("Stats history: {:?}", path);
    }

    Ok(())
}

fn run_benchmark(generations: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== NEUROFLAP Benchmark ===");
    println!("Generations: {}", generations);
    println!("Population: {}", population);
    println!();

    let result = benchmark(generations, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
