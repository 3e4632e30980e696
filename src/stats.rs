//! Statistics tracking for the evolutionary search.

use crate::error::Result;
use crate::evolution::Unit;
use crate::neural::Genome;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Statistics snapshot for one generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation the fitnesses were scored in
    pub generation: u64,
    /// Best fitness in the population
    pub fitness_max: f64,
    /// Mean fitness across the population
    pub fitness_mean: f64,
    /// Worst fitness in the population
    pub fitness_min: f64,
    /// Best score in the population
    pub score_max: f64,
    /// Whether the population was thrown away instead of bred
    pub restarted: bool,
    /// Mutation rate applied to the offspring
    pub mutation_rate: f64,
}

impl GenerationStats {
    /// Summarize the scored population before it is replaced
    pub fn from_units(generation: u64, units: &[Unit], mutation_rate: f64, restarted: bool) -> Self {
        let mut stats = Self {
            generation,
            restarted,
            mutation_rate,
            ..Default::default()
        };

        if units.is_empty() {
            return stats;
        }

        stats.fitness_max = units.iter().map(|u| u.fitness).fold(f64::NEG_INFINITY, f64::max);
        stats.fitness_min = units.iter().map(|u| u.fitness).fold(f64::INFINITY, f64::min);
        stats.fitness_mean = units.iter().map(|u| u.fitness).sum::<f64>() / units.len() as f64;
        stats.score_max = units.iter().map(|u| u.score).fold(f64::NEG_INFINITY, f64::max);

        stats
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Gen:{:4} | Fit max:{:9.2} mean:{:9.2} min:{:9.2} | Score:{:5.0} | Mut:{:.2}",
            self.generation,
            self.fitness_max,
            self.fitness_mean,
            self.fitness_min,
            self.score_max,
            self.mutation_rate,
        );
        if self.restarted {
            line.push_str(" | restart");
        }
        line
    }
}

/// Best unit seen across all generations
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestRecord {
    pub generation: u64,
    pub fitness: f64,
    pub score: f64,
    /// Genome of the unit that scored it
    pub genome: Genome,
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsHistory {
    /// Recorded snapshots, oldest first
    pub snapshots: Vec<GenerationStats>,
    /// Keep one snapshot every `interval` generations
    pub interval: u64,
}

impl StatsHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Record a snapshot if its generation falls on the interval
    pub fn record(&mut self, stats: GenerationStats) {
        let interval = self.interval.max(1);
        if stats.generation % interval == 0 {
            self.snapshots.push(stats);
        }
    }

    pub fn latest(&self) -> Option<&GenerationStats> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Best fitness over time
    pub fn fitness_series(&self) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.fitness_max))
            .collect()
    }

    /// Best score over time
    pub fn score_series(&self) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.score_max))
            .collect()
    }

    /// Number of recorded generations that ended in a restart
    pub fn restarts(&self) -> usize {
        self.snapshots.iter().filter(|s| s.restarted).count()
    }

    /// Save history to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load history from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
