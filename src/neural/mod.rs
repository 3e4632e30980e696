//! Neural computation engine.
//!
//! Gated second-order recurrent neurons with eligibility traces:
//! - Arena-owned neurons and connections addressed by per-network ids
//! - Forward activation with gain-modulated (gated) connections
//! - Local credit assignment and optional supervised propagation
//! - Positional genomes for crossover and mutation

mod connection;
mod genome;
mod network;
mod neuron;
mod squash;
mod topology;

pub use connection::{random_weight, Connection, ConnectionId, IdAllocator, NeuronId, INITIAL_WEIGHT_RANGE};
pub use genome::{ConnectionGene, Genome, NeuronGene};
pub use network::{Network, Topology};
pub use neuron::{ErrorTerms, Neuron, Role, Trace, DEFAULT_LEARNING_RATE};
pub use squash::Squash;
pub use topology::Relation;
