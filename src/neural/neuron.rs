//! Neuron state and the per-neuron forward and backward passes.
//!
//! Neurons live inside a [`Network`] arena and refer to each other through
//! [`NeuronId`] / [`ConnectionId`] handles, so the update rules are written as
//! `Network` methods that read the neighbours they need.
//!
//! Forward pass (non-input neuron `j`):
//!
//! ```text
//! s_j  = g_jj * w_jj * s_j + b_j + Σ_i y_i * w_ji * g_ji
//! y_j  = f(s_j)
//! ε_ji = g_jj * w_jj * ε_ji + g_ji * y_i
//! ε_ji^k = g_kk * w_kk * ε_ji^k + f'(s_j) * ε_ji * influence_k
//! ```
//!
//! where `k` ranges over the neurons that receive a connection gated by `j`.

use super::connection::{ConnectionId, NeuronId};
use super::network::Network;
use super::squash::Squash;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Learning rate used when `propagate_neuron` is called without one
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Layer a neuron belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Input,
    #[default]
    Hidden,
    Output,
}

/// Eligibility bookkeeping for local credit assignment
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    /// One entry per incoming connection
    pub eligibility: BTreeMap<ConnectionId, f64>,
    /// Per gated neuron, one entry per incoming connection of this neuron
    pub extended: BTreeMap<NeuronId, BTreeMap<ConnectionId, f64>>,
    /// Per gated neuron, the connections into it that this neuron gates
    pub influences: BTreeMap<NeuronId, Vec<ConnectionId>>,
}

/// Error responsibilities from the last backward pass
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ErrorTerms {
    pub responsibility: f64,
    pub projected: f64,
    pub gated: f64,
}

/// A single computational node
#[derive(Clone, Debug, PartialEq)]
pub struct Neuron {
    pub id: NeuronId,
    pub role: Role,
    pub bias: f64,
    pub squash: Squash,
    pub state: f64,
    pub old_state: f64,
    pub activation: f64,
    pub derivative: f64,
    /// Always present; weight 0 means no recurrence
    pub self_connection: ConnectionId,
    pub(crate) inputs: BTreeSet<ConnectionId>,
    pub(crate) projected: BTreeSet<ConnectionId>,
    pub(crate) gated: BTreeSet<ConnectionId>,
    pub(crate) trace: Trace,
    pub error: ErrorTerms,
}

impl Neuron {
    pub(crate) fn new(
        id: NeuronId,
        role: Role,
        squash: Squash,
        bias: f64,
        self_connection: ConnectionId,
    ) -> Self {
        Self {
            id,
            role,
            bias,
            squash,
            state: 0.0,
            old_state: 0.0,
            activation: 0.0,
            derivative: 0.0,
            self_connection,
            inputs: BTreeSet::new(),
            projected: BTreeSet::new(),
            gated: BTreeSet::new(),
            trace: Trace::default(),
            error: ErrorTerms::default(),
        }
    }

    /// Incoming connections, in creation order
    pub fn inputs(&self) -> &BTreeSet<ConnectionId> {
        &self.inputs
    }

    /// Outgoing connections, in creation order
    pub fn projected(&self) -> &BTreeSet<ConnectionId> {
        &self.projected
    }

    /// Connections whose gain this neuron controls
    pub fn gated(&self) -> &BTreeSet<ConnectionId> {
        &self.gated
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Neurons that receive at least one connection gated by this one
    pub fn gated_neurons(&self) -> impl Iterator<Item = NeuronId> + '_ {
        self.trace.extended.keys().copied()
    }
}

impl Network {
    /// Activate one neuron.
    ///
    /// With `Some(value)` the neuron acts as an environment input: its
    /// activation becomes `value` directly and bias and derivative are zeroed.
    /// Otherwise the state, activation, traces and gated gains are updated.
    pub fn activate_neuron(&mut self, id: NeuronId, input: Option<f64>) -> Result<f64> {
        let idx = self.neuron_index(id)?;

        if let Some(value) = input {
            let neuron = &mut self.neurons[idx];
            neuron.activation = value;
            neuron.derivative = 0.0;
            neuron.bias = 0.0;
            return Ok(value);
        }

        let neuron = &self.neurons[idx];
        let mut state = self.self_decay(neuron) * neuron.state + neuron.bias;
        for c in &neuron.inputs {
            let conn = &self.connections[c.index()];
            state += self.neurons[conn.from.index()].activation * conn.weight * conn.gain;
        }

        let neuron = &mut self.neurons[idx];
        neuron.old_state = neuron.state;
        neuron.state = state;
        neuron.activation = neuron.squash.apply(state);
        neuron.derivative = neuron.squash.derivative(state);
        let activation = neuron.activation;
        let derivative = neuron.derivative;

        // (gated neuron, influence, its self-connection decay)
        let gated_targets: Vec<(NeuronId, f64, f64)> = self.neurons[idx]
            .trace
            .extended
            .keys()
            .map(|&k| {
                (
                    k,
                    self.influence(id, k),
                    self.self_decay(&self.neurons[k.index()]),
                )
            })
            .collect();

        let presynaptic: Vec<(ConnectionId, f64)> = self.neurons[idx]
            .inputs
            .iter()
            .map(|&c| {
                let conn = &self.connections[c.index()];
                (c, conn.gain * self.neurons[conn.from.index()].activation)
            })
            .collect();

        let decay = self.self_decay(&self.neurons[idx]);
        let trace = &mut self.neurons[idx].trace;
        for (c, input) in presynaptic {
            let slot = trace.eligibility.entry(c).or_insert(0.0);
            *slot = decay * *slot + input;
            let eligibility = *slot;

            for &(k, influence, gated_decay) in &gated_targets {
                if let Some(xtrace) = trace.extended.get_mut(&k) {
                    let x = xtrace.entry(c).or_insert(0.0);
                    *x = gated_decay * *x + derivative * eligibility * influence;
                }
            }
        }

        let gated: Vec<ConnectionId> = self.neurons[idx].gated.iter().copied().collect();
        for c in gated {
            self.connections[c.index()].gain = activation;
        }

        Ok(activation)
    }

    /// Back-propagate error through one neuron and adjust its incoming
    /// weights and bias.
    ///
    /// Output neurons pass their `target`; everything else derives its
    /// responsibility from the neurons it projects to and the neurons it gates.
    pub fn propagate_neuron(
        &mut self,
        id: NeuronId,
        rate: Option<f64>,
        target: Option<f64>,
    ) -> Result<()> {
        let idx = self.neuron_index(id)?;

        match target {
            Some(target) => {
                let neuron = &mut self.neurons[idx];
                let error = target - neuron.activation;
                neuron.error.responsibility = error;
                neuron.error.projected = error;
            }
            None => {
                let neuron = &self.neurons[idx];

                let mut error = 0.0;
                for c in &neuron.projected {
                    let conn = &self.connections[c.index()];
                    error += self.neurons[conn.to.index()].error.responsibility
                        * conn.gain
                        * conn.weight;
                }
                let projected = neuron.derivative * error;

                let mut error = 0.0;
                for &k in neuron.trace.extended.keys() {
                    error += self.neurons[k.index()].error.responsibility * self.influence(id, k);
                }
                let gated = neuron.derivative * error;

                self.neurons[idx].error = ErrorTerms {
                    responsibility: projected + gated,
                    projected,
                    gated,
                };
            }
        }

        let rate = rate.unwrap_or(DEFAULT_LEARNING_RATE);

        let neuron = &self.neurons[idx];
        let gradients: Vec<(ConnectionId, f64)> = neuron
            .inputs
            .iter()
            .map(|&c| {
                let eligibility = neuron.trace.eligibility.get(&c).copied().unwrap_or(0.0);
                let mut gradient = neuron.error.projected * eligibility;
                for (k, xtrace) in &neuron.trace.extended {
                    gradient += self.neurons[k.index()].error.responsibility
                        * xtrace.get(&c).copied().unwrap_or(0.0);
                }
                (c, gradient)
            })
            .collect();

        for (c, gradient) in gradients {
            self.connections[c.index()].weight += rate * gradient;
        }

        let neuron = &mut self.neurons[idx];
        neuron.bias += rate * neuron.error.responsibility;

        Ok(())
    }

    /// Effect of `gater` on the state of `gated`: the gated neuron's previous
    /// state if its self-connection is gated by `gater`, plus the weighted
    /// input of every connection into `gated` that `gater` controls.
    pub(crate) fn influence(&self, gater: NeuronId, gated: NeuronId) -> f64 {
        let target = &self.neurons[gated.index()];
        let mut influence = if self.connections[target.self_connection.index()].gater == Some(gater)
        {
            target.old_state
        } else {
            0.0
        };

        if let Some(list) = self.neurons[gater.index()].trace.influences.get(&gated) {
            for c in list {
                let conn = &self.connections[c.index()];
                influence += conn.weight * self.neurons[conn.from.index()].activation;
            }
        }

        influence
    }

    /// `gain * weight` of a neuron's self-connection
    #[inline]
    pub(crate) fn self_decay(&self, neuron: &Neuron) -> f64 {
        let c = &self.connections[neuron.self_connection.index()];
        c.gain * c.weight
    }
}
