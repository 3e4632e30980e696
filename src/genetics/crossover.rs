//! Single-point crossover over bias genes.

use crate::error::{Error, Result};
use crate::neural::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Crossover operator with running tallies
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CrossoverSystem {
    /// Total crossovers performed
    pub total_crossovers: u64,
    /// Offspring that kept the first parent's weights
    pub first_parent_kept: u64,
    /// Offspring that kept the second parent's weights
    pub second_parent_kept: u64,
}

impl CrossoverSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross two genomes of the same shape.
    ///
    /// A cut point is drawn uniformly over the neuron positions and every
    /// bias gene from the cut onwards is swapped between the two copies.
    /// One of the two offspring is returned at random; connection weights are
    /// never mixed, so the result carries exactly one parent's weights.
    pub fn crossover<R: Rng + ?Sized>(
        &mut self,
        first: &Genome,
        second: &Genome,
        rng: &mut R,
    ) -> Result<Genome> {
        if first.neuron_count() != second.neuron_count() {
            return Err(Error::ShapeMismatch {
                expected: first.neuron_count(),
                found: second.neuron_count(),
            });
        }
        if first.connection_count() != second.connection_count() {
            return Err(Error::ShapeMismatch {
                expected: first.connection_count(),
                found: second.connection_count(),
            });
        }

        let mut a = first.clone();
        let mut b = second.clone();
        if a.neuron_count() > 0 {
            let cut = rng.gen_range(0..a.neuron_count());
            swap_biases_from(&mut a, &mut b, cut);
        }

        self.total_crossovers += 1;
        if rng.gen_bool(0.5) {
            self.first_parent_kept += 1;
            Ok(a)
        } else {
            self.second_parent_kept += 1;
            Ok(b)
        }
    }
}

/// Swap the bias genes at positions `cut..` between two genomes
pub fn swap_biases_from(a: &mut Genome, b: &mut Genome, cut: usize) {
    for (x, y) in a.neurons.iter_mut().zip(b.neurons.iter_mut()).skip(cut) {
        std::mem::swap(&mut x.bias, &mut y.bias);
    }
}
