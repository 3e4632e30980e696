//! Weighted, gain-modulated edges and the per-network id allocator.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Range of freshly drawn weights and biases
pub const INITIAL_WEIGHT_RANGE: f64 = 0.1;

/// Handle of a neuron inside its owning network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeuronId(pub u64);

/// Handle of a connection inside its owning network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl NeuronId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ConnectionId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Monotonic id source, one per network
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    next_neuron: u64,
    next_connection: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_neuron(&mut self) -> NeuronId {
        let id = NeuronId(self.next_neuron);
        self.next_neuron += 1;
        id
    }

    pub fn next_connection(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// Number of neuron ids handed out so far
    pub fn neurons_allocated(&self) -> u64 {
        self.next_neuron
    }

    /// Number of connection ids handed out so far
    pub fn connections_allocated(&self) -> u64 {
        self.next_connection
    }
}

/// Directed edge between two neurons.
///
/// The effective weight seen by `to` is `weight * gain`; `gain` is rewritten
/// by the gating neuron on every activation of that neuron.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub from: NeuronId,
    pub to: NeuronId,
    pub weight: f64,
    pub gain: f64,
    /// Neuron controlling `gain`, if any
    pub gater: Option<NeuronId>,
}

impl Connection {
    pub(crate) fn new(id: ConnectionId, from: NeuronId, to: NeuronId, weight: f64) -> Self {
        Self {
            id,
            from,
            to,
            weight,
            gain: 1.0,
            gater: None,
        }
    }

    /// Whether this edge loops back onto its source
    pub fn is_self_connection(&self) -> bool {
        self.from == self.to
    }
}

/// Draw a weight or bias uniformly from `[-0.1, 0.1)`
#[inline]
pub fn random_weight<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-INITIAL_WEIGHT_RANGE..INITIAL_WEIGHT_RANGE)
}
