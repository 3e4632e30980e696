//! Positional genome: the serializable form of a network's parameters.
//!
//! Neurons are listed in construction order. Connections are listed neuron
//! by neuron: each neuron's outgoing connections in creation order, followed
//! by its self-connection when that one is active or gated. Two networks
//! built from the same [`Topology`](super::Topology) therefore produce genomes
//! whose genes line up position by position.

use super::connection::{ConnectionId, NeuronId};
use super::network::Network;
use super::neuron::Role;
use super::squash::Squash;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeuronGene {
    pub bias: f64,
    pub squash: Squash,
    #[serde(default)]
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    /// Position of the source neuron
    pub from: usize,
    /// Position of the destination neuron
    pub to: usize,
    pub weight: f64,
    /// Position of the gating neuron
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gater: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub neurons: Vec<NeuronGene>,
    pub connections: Vec<ConnectionGene>,
}

impl Genome {
    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Bias genes in neuron order
    pub fn biases(&self) -> Vec<f64> {
        self.neurons.iter().map(|n| n.bias).collect()
    }

    /// Weight genes in connection order
    pub fn weights(&self) -> Vec<f64> {
        self.connections.iter().map(|c| c.weight).collect()
    }

    /// Whether both genomes have the same neuron and connection counts
    pub fn same_shape(&self, other: &Genome) -> bool {
        self.neurons.len() == other.neurons.len()
            && self.connections.len() == other.connections.len()
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Network {
    /// Serialize the network's parameters and wiring
    pub fn to_genome(&self) -> Genome {
        let neurons = self
            .neurons
            .iter()
            .map(|n| NeuronGene {
                bias: n.bias,
                squash: n.squash,
                role: n.role,
            })
            .collect();

        let gene = |c: ConnectionId| {
            let conn = &self.connections[c.index()];
            ConnectionGene {
                from: conn.from.index(),
                to: conn.to.index(),
                weight: conn.weight,
                gater: conn.gater.map(NeuronId::index),
            }
        };

        let mut connections = Vec::new();
        for neuron in &self.neurons {
            connections.extend(neuron.projected.iter().map(|&c| gene(c)));

            let own = &self.connections[neuron.self_connection.index()];
            if own.weight != 0.0 || own.gater.is_some() {
                connections.push(gene(neuron.self_connection));
            }
        }

        Genome {
            neurons,
            connections,
        }
    }

    /// Rebuild a network from a genome.
    ///
    /// Gates are applied once every connection exists, so a gene may name a
    /// gater that appears later in the list.
    pub fn from_genome(genome: &Genome) -> Result<Self> {
        let mut net = Network::new();
        for gene in &genome.neurons {
            net.add_neuron_with_bias(gene.role, gene.squash, gene.bias);
        }

        let position = |p: usize| -> Result<NeuronId> {
            if p < genome.neurons.len() {
                Ok(NeuronId(p as u64))
            } else {
                Err(Error::InvalidReference(format!(
                    "genome refers to neuron {p} of {}",
                    genome.neurons.len()
                )))
            }
        };

        let mut gates = Vec::new();
        for gene in &genome.connections {
            let c = net.connect(position(gene.from)?, position(gene.to)?, gene.weight)?;
            if let Some(gater) = gene.gater {
                gates.push((position(gater)?, c));
            }
        }

        for (gater, c) in gates {
            net.gate(gater, c)?;
        }

        Ok(net)
    }
}
