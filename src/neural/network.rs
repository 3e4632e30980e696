//! Network arena and the layered perceptron builder.

use super::connection::{random_weight, Connection, ConnectionId, IdAllocator, NeuronId};
use super::neuron::{Neuron, Role};
use super::squash::Squash;
use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Layer sizes and squash functions of a perceptron
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Number of input neurons
    pub n_inputs: usize,
    /// Number of hidden neurons
    pub n_hidden: usize,
    /// Number of output neurons
    pub n_outputs: usize,
    #[serde(default)]
    pub hidden_squash: Squash,
    #[serde(default)]
    pub output_squash: Squash,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            n_inputs: 2,
            n_hidden: 6,
            n_outputs: 1,
            hidden_squash: Squash::Logistic,
            output_squash: Squash::Logistic,
        }
    }
}

impl Topology {
    pub fn new(n_inputs: usize, n_hidden: usize, n_outputs: usize) -> Self {
        Self {
            n_inputs,
            n_hidden,
            n_outputs,
            ..Default::default()
        }
    }

    /// Total neurons across all layers
    pub fn neuron_count(&self) -> usize {
        self.n_inputs + self.n_hidden + self.n_outputs
    }

    /// Layer-to-layer connections (self-connections excluded)
    pub fn connection_count(&self) -> usize {
        if self.n_hidden == 0 {
            self.n_inputs * self.n_outputs
        } else {
            self.n_inputs * self.n_hidden + self.n_hidden * self.n_outputs
        }
    }
}

/// A set of neurons and connections owned as one unit.
///
/// Neurons and connections are stored in creation order and addressed by
/// their ids, which are allocated per network starting at zero.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Network {
    pub(crate) neurons: Vec<Neuron>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) ids: IdAllocator,
    inputs: Vec<NeuronId>,
    outputs: Vec<NeuronId>,
}

impl Network {
    /// Create an empty network
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fully connected input → hidden → output perceptron.
    ///
    /// Input neurons are identity pass-throughs with zero bias; hidden and
    /// output neurons get random biases. Without hidden neurons the inputs
    /// project straight to the outputs.
    pub fn perceptron<R: Rng + ?Sized>(topology: &Topology, rng: &mut R) -> Self {
        let mut net = Self::new();

        let inputs: Vec<NeuronId> = (0..topology.n_inputs)
            .map(|_| net.add_neuron_with_bias(Role::Input, Squash::Identity, 0.0))
            .collect();
        let hidden: Vec<NeuronId> = (0..topology.n_hidden)
            .map(|_| net.add_neuron(Role::Hidden, topology.hidden_squash, rng))
            .collect();
        let outputs: Vec<NeuronId> = (0..topology.n_outputs)
            .map(|_| net.add_neuron(Role::Output, topology.output_squash, rng))
            .collect();

        let layers: Vec<&[NeuronId]> = [&inputs[..], &hidden[..], &outputs[..]]
            .into_iter()
            .filter(|layer| !layer.is_empty())
            .collect();

        for pair in layers.windows(2) {
            for &from in pair[0] {
                for &to in pair[1] {
                    let weight = random_weight(rng);
                    net.link(from, to, weight);
                }
            }
        }

        net
    }

    /// Add a neuron with a random bias (zero for inputs)
    pub fn add_neuron<R: Rng + ?Sized>(&mut self, role: Role, squash: Squash, rng: &mut R) -> NeuronId {
        let bias = match role {
            Role::Input => 0.0,
            _ => random_weight(rng),
        };
        self.add_neuron_with_bias(role, squash, bias)
    }

    /// Add a neuron with an explicit bias
    pub fn add_neuron_with_bias(&mut self, role: Role, squash: Squash, bias: f64) -> NeuronId {
        let id = self.ids.next_neuron();
        let self_connection = self.ids.next_connection();

        self.connections
            .push(Connection::new(self_connection, id, id, 0.0));
        self.neurons
            .push(Neuron::new(id, role, squash, bias, self_connection));

        match role {
            Role::Input => self.inputs.push(id),
            Role::Output => self.outputs.push(id),
            Role::Hidden => {}
        }

        id
    }

    /// Forward pass: feed `inputs` to the input neurons and activate every
    /// other neuron in creation order. Returns the output activations.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        if inputs.len() != self.inputs.len() {
            return Err(Error::ShapeMismatch {
                expected: self.inputs.len(),
                found: inputs.len(),
            });
        }

        let mut values = inputs.iter().copied();
        for idx in 0..self.neurons.len() {
            let (id, role) = (self.neurons[idx].id, self.neurons[idx].role);
            let input = match role {
                Role::Input => values.next(),
                _ => None,
            };
            self.activate_neuron(id, input)?;
        }

        Ok(self.output_activations())
    }

    /// Supervised backward pass after [`Network::activate`].
    ///
    /// Outputs are trained towards `targets` (last output first), then every
    /// hidden neuron is propagated in reverse creation order.
    pub fn propagate(&mut self, rate: f64, targets: &[f64]) -> Result<()> {
        if targets.len() != self.outputs.len() {
            return Err(Error::ShapeMismatch {
                expected: self.outputs.len(),
                found: targets.len(),
            });
        }

        let outputs = self.outputs.clone();
        for (&id, &target) in outputs.iter().zip(targets).rev() {
            self.propagate_neuron(id, Some(rate), Some(target))?;
        }

        let hidden: Vec<NeuronId> = self
            .neurons
            .iter()
            .rev()
            .filter(|n| n.role == Role::Hidden)
            .map(|n| n.id)
            .collect();
        for id in hidden {
            self.propagate_neuron(id, Some(rate), None)?;
        }

        Ok(())
    }

    /// Clear traces and error terms of every neuron
    pub fn clear(&mut self) {
        for idx in 0..self.neurons.len() {
            self.clear_at(idx);
        }
    }

    /// Reset every neuron to fresh random parameters
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for idx in 0..self.neurons.len() {
            self.reset_at(idx, rng);
        }
    }

    /// Current activations of the output neurons
    pub fn output_activations(&self) -> Vec<f64> {
        self.outputs
            .iter()
            .map(|id| self.neurons[id.index()].activation)
            .collect()
    }

    pub fn neuron(&self, id: NeuronId) -> Result<&Neuron> {
        let idx = self.neuron_index(id)?;
        Ok(&self.neurons[idx])
    }

    pub fn neuron_mut(&mut self, id: NeuronId) -> Result<&mut Neuron> {
        let idx = self.neuron_index(id)?;
        Ok(&mut self.neurons[idx])
    }

    pub fn connection(&self, id: ConnectionId) -> Result<&Connection> {
        let idx = self.connection_index(id)?;
        Ok(&self.connections[idx])
    }

    /// All neurons in creation order
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// All connections in creation order, self-connections included
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn input_ids(&self) -> &[NeuronId] {
        &self.inputs
    }

    pub fn output_ids(&self) -> &[NeuronId] {
        &self.outputs
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    /// Number of connections between distinct neurons
    pub fn connection_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| !c.is_self_connection())
            .count()
    }

    /// Check that no bias or weight is NaN or infinite
    pub fn is_valid(&self) -> bool {
        self.neurons.iter().all(|n| n.bias.is_finite())
            && self.connections.iter().all(|c| c.weight.is_finite())
    }

    /// Neuron id at a creation position
    pub fn id_at(&self, position: usize) -> Result<NeuronId> {
        self.neurons
            .get(position)
            .map(|n| n.id)
            .ok_or_else(|| Error::InvalidReference(format!("no neuron at position {position}")))
    }

    pub(crate) fn neuron_index(&self, id: NeuronId) -> Result<usize> {
        let idx = id.index();
        if idx < self.neurons.len() {
            Ok(idx)
        } else {
            Err(Error::InvalidReference(format!("neuron {id} does not exist")))
        }
    }

    pub(crate) fn connection_index(&self, id: ConnectionId) -> Result<usize> {
        let idx = id.index();
        if idx < self.connections.len() {
            Ok(idx)
        } else {
            Err(Error::InvalidReference(format!("connection {id} does not exist")))
        }
    }
}
