//! Genetics module - genome recombination and mutation.

pub mod crossover;
pub mod mutation;

pub use crossover::CrossoverSystem;
pub use mutation::{mutate_gene, mutation_factor};
