//! Multiplicative gene mutation.

use crate::neural::Genome;
use rand::Rng;

/// Draw a multiplier `1 + ((u1 - 0.5) * 3 + (u2 - 0.5))`, with `u1`, `u2`
/// uniform in `[0, 1)`. The mean is 1 and the result lies in `[-1, 3)`.
#[inline]
pub fn mutation_factor<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen();
    let u2: f64 = rng.gen();
    1.0 + ((u1 - 0.5) * 3.0 + (u2 - 0.5))
}

/// Mutate a single gene with probability `rate`.
/// Returns `true` if the gene was changed.
#[inline]
pub fn mutate_gene<R: Rng + ?Sized>(gene: &mut f64, rate: f64, rng: &mut R) -> bool {
    if rng.gen::<f64>() < rate {
        *gene *= mutation_factor(rng);
        true
    } else {
        false
    }
}

impl Genome {
    /// Mutate every bias gene, then every weight gene, each independently
    /// with probability `rate`. Returns the number of genes touched.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rate: f64, rng: &mut R) -> usize {
        let mut touched = 0;
        for neuron in &mut self.neurons {
            touched += mutate_gene(&mut neuron.bias, rate, rng) as usize;
        }
        for connection in &mut self.connections {
            touched += mutate_gene(&mut connection.weight, rate, rng) as usize;
        }
        touched
    }
}
