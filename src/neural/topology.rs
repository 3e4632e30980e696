//! Wiring operations: projecting, gating, relation lookup, clear and reset.

use super::connection::{random_weight, Connection, ConnectionId, NeuronId};
use super::network::Network;
use super::neuron::ErrorTerms;
use crate::error::{Error, Result};
use rand::Rng;

/// How two neurons are linked, seen from the first one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    SelfConnection,
    Input,
    Projected,
    Gated,
}

impl Network {
    /// Project a connection from `from` to `to`.
    ///
    /// Projecting onto itself turns the self-connection on (weight 1). An
    /// existing projection is reused, with its weight updated when one is
    /// given. New connections get a uniform weight in `[-0.1, 0.1)` unless
    /// `weight` is provided.
    pub fn project<R: Rng + ?Sized>(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        weight: Option<f64>,
        rng: &mut R,
    ) -> Result<ConnectionId> {
        if let Some(existing) = self.existing_projection(from, to, weight)? {
            return Ok(existing);
        }
        let weight = weight.unwrap_or_else(|| random_weight(rng));
        Ok(self.link(from, to, weight))
    }

    /// Like [`Network::project`] with an explicit weight. A self-connection
    /// takes `weight` as given.
    pub fn connect(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> Result<ConnectionId> {
        if from == to {
            let idx = self.neuron_index(from)?;
            let c = self.neurons[idx].self_connection;
            self.connections[c.index()].weight = weight;
            return Ok(c);
        }
        if let Some(existing) = self.existing_projection(from, to, Some(weight))? {
            return Ok(existing);
        }
        Ok(self.link(from, to, weight))
    }

    /// Let `gater` control the gain of `connection`.
    pub fn gate(&mut self, gater: NeuronId, connection: ConnectionId) -> Result<()> {
        let gi = self.neuron_index(gater)?;
        let ci = self.connection_index(connection)?;

        match self.connections[ci].gater {
            Some(existing) if existing == gater => return Ok(()),
            Some(existing) => {
                return Err(Error::AlreadyGated {
                    connection: connection.0,
                    gater: existing.0,
                })
            }
            None => {}
        }

        let target = self.connections[ci].to;
        let neuron = &mut self.neurons[gi];
        neuron.gated.insert(connection);

        if !neuron.trace.extended.contains_key(&target) {
            let xtrace = neuron.inputs.iter().map(|&c| (c, 0.0)).collect();
            neuron.trace.extended.insert(target, xtrace);
        }
        neuron
            .trace
            .influences
            .entry(target)
            .or_default()
            .push(connection);

        self.connections[ci].gater = Some(gater);
        Ok(())
    }

    /// Find the relation linking `a` to `b`, checking the self-connection,
    /// then inputs, projections and gated connections of `a`.
    pub fn connected(&self, a: NeuronId, b: NeuronId) -> Result<Option<(Relation, ConnectionId)>> {
        let ia = self.neuron_index(a)?;
        self.neuron_index(b)?;
        let neuron = &self.neurons[ia];

        if a == b {
            let c = neuron.self_connection;
            return Ok((self.connections[c.index()].weight != 0.0)
                .then_some((Relation::SelfConnection, c)));
        }

        let groups = [
            (Relation::Input, &neuron.inputs),
            (Relation::Projected, &neuron.projected),
            (Relation::Gated, &neuron.gated),
        ];
        for (relation, set) in groups {
            for &c in set {
                let conn = &self.connections[c.index()];
                if conn.to == b || conn.from == b {
                    return Ok(Some((relation, c)));
                }
            }
        }

        Ok(None)
    }

    /// Whether the neuron's self-connection carries a non-zero weight
    pub fn is_self_connected(&self, id: NeuronId) -> Result<bool> {
        let neuron = self.neuron(id)?;
        Ok(self.connections[neuron.self_connection.index()].weight != 0.0)
    }

    /// Forget traces and error terms; weights and wiring are kept.
    pub fn clear_neuron(&mut self, id: NeuronId) -> Result<()> {
        let idx = self.neuron_index(id)?;
        self.clear_at(idx);
        Ok(())
    }

    /// Clear the neuron, then draw fresh weights for all of its input,
    /// projected and gated connections and a fresh bias, and zero its state.
    pub fn reset_neuron<R: Rng + ?Sized>(&mut self, id: NeuronId, rng: &mut R) -> Result<()> {
        let idx = self.neuron_index(id)?;
        self.reset_at(idx, rng);
        Ok(())
    }

    pub(crate) fn clear_at(&mut self, idx: usize) {
        let neuron = &mut self.neurons[idx];

        for value in neuron.trace.eligibility.values_mut() {
            *value = 0.0;
        }
        for xtrace in neuron.trace.extended.values_mut() {
            for value in xtrace.values_mut() {
                *value = 0.0;
            }
        }
        neuron.error = ErrorTerms::default();
    }

    pub(crate) fn reset_at<R: Rng + ?Sized>(&mut self, idx: usize, rng: &mut R) {
        self.clear_at(idx);

        let neuron = &self.neurons[idx];
        let owned: Vec<ConnectionId> = neuron
            .inputs
            .iter()
            .chain(neuron.projected.iter())
            .chain(neuron.gated.iter())
            .copied()
            .collect();
        for c in owned {
            self.connections[c.index()].weight = random_weight(rng);
        }

        let neuron = &mut self.neurons[idx];
        neuron.bias = random_weight(rng);
        neuron.old_state = 0.0;
        neuron.state = 0.0;
        neuron.activation = 0.0;
    }

    /// Resolve the projection shortcuts shared by `project` and `connect`:
    /// self-projection and already existing projections.
    fn existing_projection(
        &mut self,
        from: NeuronId,
        to: NeuronId,
        weight: Option<f64>,
    ) -> Result<Option<ConnectionId>> {
        let ifrom = self.neuron_index(from)?;
        self.neuron_index(to)?;

        if from == to {
            let c = self.neurons[ifrom].self_connection;
            self.connections[c.index()].weight = 1.0;
            return Ok(Some(c));
        }

        let existing = self.neurons[ifrom]
            .projected
            .iter()
            .copied()
            .find(|c| self.connections[c.index()].to == to);
        if let (Some(c), Some(weight)) = (existing, weight) {
            self.connections[c.index()].weight = weight;
        }

        Ok(existing)
    }

    /// Create and register a new connection between two valid neurons
    pub(crate) fn link(&mut self, from: NeuronId, to: NeuronId, weight: f64) -> ConnectionId {
        let id = self.ids.next_connection();
        self.connections.push(Connection::new(id, from, to, weight));

        self.neurons[from.index()].projected.insert(id);

        let target = &mut self.neurons[to.index()];
        target.inputs.insert(id);
        target.trace.eligibility.insert(id, 0.0);
        for xtrace in target.trace.extended.values_mut() {
            xtrace.insert(id, 0.0);
        }

        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{Role, Squash};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn three() -> (Network, NeuronId, NeuronId, NeuronId) {
        let mut net = Network::new();
        let a = net.add_neuron_with_bias(Role::Input, Squash::Identity, 0.0);
        let b = net.add_neuron_with_bias(Role::Hidden, Squash::Logistic, 0.0);
        let c = net.add_neuron_with_bias(Role::Output, Squash::Logistic, 0.0);
        (net, a, b, c)
    }

    #[test]
    fn test_project_registers_both_ends() {
        let (mut net, a, b, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let c = net.project(a, b, None, &mut rng).unwrap();

        assert!(net.neuron(a).unwrap().projected().contains(&c));
        assert!(net.neuron(b).unwrap().inputs().contains(&c));
        assert_eq!(net.neuron(b).unwrap().trace().eligibility.get(&c), Some(&0.0));
        let w = net.connection(c).unwrap().weight;
        assert!((-0.1..0.1).contains(&w));
    }

    #[test]
    fn test_project_is_idempotent() {
        let (mut net, a, b, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let first = net.project(a, b, Some(0.3), &mut rng).unwrap();
        let untouched = net.project(a, b, None, &mut rng).unwrap();
        assert_eq!(first, untouched);
        assert_eq!(net.connection(first).unwrap().weight, 0.3);

        let second = net.project(a, b, Some(0.9), &mut rng).unwrap();
        assert_eq!(first, second);
        assert_eq!(net.connection(first).unwrap().weight, 0.9);
        assert_eq!(net.connection_count(), 1);
    }

    #[test]
    fn test_self_projection() {
        let (mut net, _, b, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(!net.is_self_connected(b).unwrap());
        assert_eq!(net.connected(b, b).unwrap(), None);

        let c = net.project(b, b, Some(0.4), &mut rng).unwrap();

        assert_eq!(c, net.neuron(b).unwrap().self_connection);
        assert_eq!(net.connection(c).unwrap().weight, 1.0);
        assert_eq!(net.connected(b, b).unwrap(), Some((Relation::SelfConnection, c)));
        assert_eq!(net.connection_count(), 0);
    }

    #[test]
    fn test_connected_relations() {
        let (mut net, a, b, c) = three();
        let ab = net.connect(a, b, 0.1).unwrap();
        let bc = net.connect(b, c, 0.1).unwrap();

        assert_eq!(net.connected(a, b).unwrap(), Some((Relation::Projected, ab)));
        assert_eq!(net.connected(b, a).unwrap(), Some((Relation::Input, ab)));
        assert_eq!(net.connected(b, c).unwrap(), Some((Relation::Projected, bc)));
        assert_eq!(net.connected(a, c).unwrap(), None);
    }

    #[test]
    fn test_reverse_projection_creates_new_edge() {
        let (mut net, a, b, _) = three();
        let ab = net.connect(a, b, 0.1).unwrap();
        let ba = net.connect(b, a, 0.2).unwrap();
        assert_ne!(ab, ba);
        assert_eq!(net.connection_count(), 2);
    }

    #[test]
    fn test_reprojection_beside_reverse_edge() {
        let (mut net, a, b, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let ab = net.project(a, b, Some(0.3), &mut rng).unwrap();
        let ba = net.project(b, a, Some(0.2), &mut rng).unwrap();
        let again = net.project(a, b, Some(0.9), &mut rng).unwrap();
        let reverse = net.connect(b, a, 0.4).unwrap();

        assert_eq!(ab, again);
        assert_eq!(ba, reverse);
        assert_eq!(net.connection_count(), 2);
        assert_eq!(net.neuron(b).unwrap().inputs().len(), 1);
        assert_eq!(net.connection(ab).unwrap().weight, 0.9);
        assert_eq!(net.connection(ba).unwrap().weight, 0.4);
    }

    #[test]
    fn test_invalid_reference() {
        let (mut net, a, _, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let missing = NeuronId(42);

        assert!(matches!(
            net.project(a, missing, None, &mut rng),
            Err(Error::InvalidReference(_))
        ));
        assert!(matches!(
            net.connect(missing, a, 0.5),
            Err(Error::InvalidReference(_))
        ));
        assert!(matches!(
            net.gate(a, ConnectionId(99)),
            Err(Error::InvalidReference(_))
        ));
    }

    #[test]
    fn test_gate_seeds_extended_trace() {
        let (mut net, a, b, c) = three();
        let into_gater = net.connect(a, b, 0.1).unwrap();
        let ac = net.connect(a, c, 0.1).unwrap();

        net.gate(b, ac).unwrap();

        let gater = net.neuron(b).unwrap();
        assert!(gater.gated().contains(&ac));
        assert_eq!(gater.trace().extended[&c].get(&into_gater), Some(&0.0));
        assert_eq!(gater.trace().influences[&c], vec![ac]);
        assert_eq!(net.connection(ac).unwrap().gater, Some(b));
        assert_eq!(gater.gated_neurons().collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn test_new_input_extends_extended_traces() {
        let (mut net, a, b, c) = three();
        let ac = net.connect(a, c, 0.1).unwrap();
        net.gate(b, ac).unwrap();

        let late = net.connect(a, b, 0.1).unwrap();

        let gater = net.neuron(b).unwrap();
        assert_eq!(gater.trace().extended[&c].get(&late), Some(&0.0));
    }

    #[test]
    fn test_connection_gated_once() {
        let (mut net, a, b, c) = three();
        let ac = net.connect(a, c, 0.1).unwrap();
        net.gate(b, ac).unwrap();
        net.gate(b, ac).unwrap();
        assert_eq!(net.neuron(b).unwrap().trace().influences[&c].len(), 1);

        let err = net.gate(a, ac).unwrap_err();
        assert_eq!(err, Error::AlreadyGated { connection: ac.0, gater: b.0 });
    }

    #[test]
    fn test_clear_keeps_weights() {
        let (mut net, a, b, _) = three();
        let ab = net.connect(a, b, 0.7).unwrap();
        net.activate_neuron(a, Some(1.0)).unwrap();
        net.activate_neuron(b, None).unwrap();
        net.propagate_neuron(b, None, Some(1.0)).unwrap();
        let weight = net.connection(ab).unwrap().weight;

        net.clear_neuron(b).unwrap();

        let neuron = net.neuron(b).unwrap();
        assert_eq!(neuron.trace().eligibility[&ab], 0.0);
        assert_eq!(neuron.error, ErrorTerms::default());
        assert_eq!(net.connection(ab).unwrap().weight, weight);
    }

    #[test]
    fn test_reset_redraws_parameters() {
        let (mut net, a, b, _) = three();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let ab = net.connect(a, b, 5.0).unwrap();
        net.neuron_mut(b).unwrap().bias = 5.0;
        net.activate_neuron(a, Some(1.0)).unwrap();
        net.activate_neuron(b, None).unwrap();

        net.reset_neuron(b, &mut rng).unwrap();

        let neuron = net.neuron(b).unwrap();
        assert!((-0.1..0.1).contains(&neuron.bias));
        assert_eq!(neuron.state, 0.0);
        assert_eq!(neuron.old_state, 0.0);
        assert_eq!(neuron.activation, 0.0);
        assert!((-0.1..0.1).contains(&net.connection(ab).unwrap().weight));
    }
}
