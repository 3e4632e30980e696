//! Evolutionary trainer: population management, selection and reproduction.

use crate::config::{Config, EvolutionConfig, InputConfig};
use crate::error::{Error, Result};
use crate::genetics::CrossoverSystem;
use crate::neural::{Genome, Network, Topology};
use crate::stats::{BestRecord, GenerationStats, StatsHistory};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Position of the next obstacle gap as seen by an agent
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Target {
    /// Horizontal distance from the agent
    pub x: f64,
    /// Vertical position of the gap centre
    pub y: f64,
}

impl Target {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An agent driven by one unit of the population
pub trait Agent {
    /// Index of the unit controlling this agent
    fn index(&self) -> usize;
    /// Current vertical position
    fn y(&self) -> f64;
    /// Perform the agent's action (e.g. flap)
    fn act(&mut self);
}

/// Lifecycle of a [`Trainer`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainerState {
    Uninitialized,
    PopulationReady,
    Evolving,
}

/// One member of the population
#[derive(Clone, Debug)]
pub struct Unit {
    pub network: Network,
    /// Stable handle, survives generational replacement
    pub index: usize,
    pub fitness: f64,
    pub score: f64,
    pub is_winner: bool,
}

impl Unit {
    pub fn new(index: usize, network: Network) -> Self {
        Self {
            network,
            index,
            fitness: 0.0,
            score: 0.0,
            is_winner: false,
        }
    }

    pub fn genome(&self) -> Genome {
        self.network.to_genome()
    }

    fn replace(&mut self, network: Network) {
        self.network = network;
        self.fitness = 0.0;
        self.score = 0.0;
        self.is_winner = false;
    }
}

/// Generational genetic search over a fixed-size population of networks
pub struct Trainer {
    max_units: usize,
    top_units: usize,
    topology: Topology,
    evolution: EvolutionConfig,
    inputs: InputConfig,
    population: Vec<Unit>,
    state: TrainerState,
    generation: u64,
    mutation_rate: f64,
    /// Set once a generation has been bred instead of restarted
    settled: bool,
    best: Option<BestRecord>,
    history: StatsHistory,
    crossover: CrossoverSystem,
    rng: ChaCha8Rng,
}

impl Trainer {
    /// Create a trainer seeded from system entropy
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::from_entropy())
    }

    /// Create a trainer with a reproducible random stream
    pub fn with_seed(config: &Config, seed: u64) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: &Config, rng: ChaCha8Rng) -> Result<Self> {
        let max_units = config.population.max_units;
        let mut top_units = config.population.top_units;
        if top_units > max_units {
            log::debug!("top_units {} clamped to max_units {}", top_units, max_units);
            top_units = max_units;
        }
        config.validate()?;

        Ok(Self {
            max_units,
            top_units,
            topology: config.network.clone(),
            evolution: config.evolution.clone(),
            inputs: config.inputs.clone(),
            population: Vec::new(),
            state: TrainerState::Uninitialized,
            generation: 1,
            mutation_rate: config.evolution.initial_mutation_rate,
            settled: false,
            best: None,
            history: StatsHistory::new(config.logging.stats_interval),
            crossover: CrossoverSystem::new(),
            rng,
        })
    }

    /// Back to generation 1 with the initial mutation rate and no best
    /// record. The population itself is kept.
    pub fn reset(&mut self) {
        self.generation = 1;
        self.mutation_rate = self.evolution.initial_mutation_rate;
        self.settled = false;
        self.best = None;
        self.history.clear();
    }

    /// Replace the population with `max_units` fresh networks
    pub fn create_population(&mut self) {
        let mut population = Vec::with_capacity(self.max_units);
        for index in 0..self.max_units {
            population.push(Unit::new(index, Network::perceptron(&self.topology, &mut self.rng)));
        }
        self.population = population;
        self.state = TrainerState::PopulationReady;

        log::debug!(
            "Population created: {} units, {} neurons each",
            self.max_units,
            self.topology.neuron_count()
        );
    }

    /// Normalize an observation into the two network inputs
    pub fn normalize(&self, agent_y: f64, target: &Target) -> [f64; 2] {
        let InputConfig {
            scale_factor,
            max_dx,
            max_dy,
            ..
        } = self.inputs;
        let dx = target.x.clamp(-max_dx, max_dx) / max_dx * scale_factor;
        let dy = (agent_y - target.y).clamp(-max_dy, max_dy) / max_dy * scale_factor;
        [dx, dy]
    }

    /// Forward one observation through a unit's network and report whether
    /// the agent should act
    pub fn decide(&mut self, index: usize, agent_y: f64, target: &Target) -> Result<bool> {
        let inputs = self.normalize(agent_y, target);
        let threshold = self.inputs.action_threshold;

        let unit = self.unit_mut(index)?;
        let outputs = unit.network.activate(&inputs)?;
        let fire = outputs.first().is_some_and(|&out| out > threshold);

        log::trace!(
            "unit {} inputs [{:.2}, {:.2}] output {:?} fire {}",
            index,
            inputs[0],
            inputs[1],
            outputs.first(),
            fire
        );
        Ok(fire)
    }

    /// Decide for `agent` and make it act on a positive decision
    pub fn activate_brain<A: Agent + ?Sized>(&mut self, agent: &mut A, target: &Target) -> Result<bool> {
        let fire = self.decide(agent.index(), agent.y(), target)?;
        if fire {
            agent.act();
        }
        Ok(fire)
    }

    /// Record the environment's verdict for one unit
    pub fn set_fitness(&mut self, index: usize, fitness: f64, score: f64) -> Result<()> {
        let unit = self.unit_mut(index)?;
        unit.fitness = fitness;
        unit.score = score;
        Ok(())
    }

    /// Sort the population by fitness (best first, stable on ties) and mark
    /// the first `top_units` as winners. Returns the winners.
    pub fn selection(&mut self) -> &[Unit] {
        self.population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let top = self.top_units.min(self.population.len());
        for (rank, unit) in self.population.iter_mut().enumerate() {
            unit.is_winner = rank < top;
        }

        log::debug!(
            "Selection: winners {:?}",
            self.population[..top]
                .iter()
                .map(|u| (u.index, u.fitness))
                .collect::<Vec<_>>()
        );
        &self.population[..top]
    }

    /// Advance one generation from the fitnesses the environment assigned.
    ///
    /// While no generation has been bred yet, a population whose best unit
    /// scored negative is replaced wholesale. Otherwise the winners are kept
    /// and the remaining slots are refilled with mutated offspring. If
    /// breeding fails the population, mutation rate, best record and history
    /// are left as they were, with units back in index order.
    pub fn evolve_population(&mut self) -> Result<()> {
        if self.state == TrainerState::Uninitialized {
            return Err(Error::NoPopulation);
        }
        self.state = TrainerState::Evolving;

        self.selection();
        let (best_fitness, best_score) = (self.population[0].fitness, self.population[0].score);
        let restart = !self.settled && best_fitness < 0.0;

        let offspring = if restart {
            Vec::new()
        } else {
            match self.breed(self.evolution.mutation_rate) {
                Ok(offspring) => offspring,
                Err(err) => {
                    self.population.sort_by_key(|u| u.index);
                    self.state = TrainerState::PopulationReady;
                    return Err(err);
                }
            }
        };

        if !restart {
            self.settled = true;
            self.mutation_rate = self.evolution.mutation_rate;
        }

        let stats =
            GenerationStats::from_units(self.generation, &self.population, self.mutation_rate, restart);
        self.track_best(best_fitness, best_score);

        if restart {
            log::warn!(
                "Generation {}: best fitness {:.2} is negative, restarting population",
                self.generation,
                best_fitness
            );
            self.create_population();
        } else {
            let top = self.top_units;
            for (unit, network) in self.population[top..].iter_mut().zip(offspring) {
                unit.replace(network);
            }
            self.population.sort_by_key(|u| u.index);
        }

        log::info!("{}", stats.summary());
        self.history.record(stats);
        self.generation += 1;
        self.state = TrainerState::PopulationReady;
        Ok(())
    }

    /// Breed offspring for slots `top_units..max_units` of the
    /// fitness-sorted population, in slot order
    fn breed(&mut self, rate: f64) -> Result<Vec<Network>> {
        let top = self.top_units;
        let max = self.population.len();
        let winners: Vec<Genome> = self.population[..top].iter().map(Unit::genome).collect();

        let mut offspring = Vec::with_capacity(max - top);
        for slot in top..max {
            let mut genome = if slot == top {
                self.crossover.crossover(&winners[0], &winners[1], &mut self.rng)?
            } else if slot < max.saturating_sub(2) {
                let a = self.rng.gen_range(0..top);
                let b = self.rng.gen_range(0..top);
                self.crossover.crossover(&winners[a], &winners[b], &mut self.rng)?
            } else {
                winners[self.rng.gen_range(0..top)].clone()
            };

            let mutated = genome.mutate(rate, &mut self.rng);
            log::debug!(
                "Slot {} (unit {}): {} genes mutated",
                slot,
                self.population[slot].index,
                mutated
            );
            offspring.push(Network::from_genome(&genome)?);
        }

        Ok(offspring)
    }

    /// Record the generation's best unit if it beats every earlier one.
    /// The record starts at fitness 0, so negative generations never count.
    fn track_best(&mut self, fitness: f64, score: f64) {
        let record = self.best.as_ref().map_or(0.0, |best| best.fitness);
        if fitness > record {
            log::info!(
                "New best: generation {} fitness {:.2} score {:.0}",
                self.generation,
                fitness,
                score
            );
            self.best = Some(BestRecord {
                generation: self.generation,
                fitness,
                score,
                genome: self.population[0].genome(),
            });
        }
    }

    /// Units, in index order between generations
    pub fn population(&self) -> &[Unit] {
        &self.population
    }

    pub fn unit(&self, index: usize) -> Result<&Unit> {
        let position = self.position(index)?;
        Ok(&self.population[position])
    }

    pub fn unit_mut(&mut self, index: usize) -> Result<&mut Unit> {
        let position = self.position(index)?;
        Ok(&mut self.population[position])
    }

    fn position(&self, index: usize) -> Result<usize> {
        if self.state == TrainerState::Uninitialized {
            return Err(Error::NoPopulation);
        }
        // population is kept in index order between generations
        if self.population.get(index).is_some_and(|u| u.index == index) {
            return Ok(index);
        }
        self.population
            .iter()
            .position(|u| u.index == index)
            .ok_or_else(|| Error::InvalidReference(format!("no unit with index {index}")))
    }

    /// Current generation, starting at 1
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn best(&self) -> Option<&BestRecord> {
        self.best.as_ref()
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    pub fn max_units(&self) -> usize {
        self.max_units
    }

    pub fn top_units(&self) -> usize {
        self.top_units
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn crossover_stats(&self) -> &CrossoverSystem {
        &self.crossover
    }
}
