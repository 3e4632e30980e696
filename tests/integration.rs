//! Integration tests for NEUROFLAP

use neuroflap::neural::{Network, Role, Squash, Topology};
use neuroflap::{Config, Error, Genome, Target, Trainer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn genomes(trainer: &Trainer) -> Vec<Genome> {
    trainer.population().iter().map(|u| u.genome()).collect()
}

/// Score every unit with a fitness drawn from `rng`
fn score<R: Rng>(trainer: &mut Trainer, rng: &mut R) {
    for index in 0..trainer.max_units() {
        let fitness: f64 = rng.gen_range(-10.0..100.0);
        trainer.set_fitness(index, fitness, fitness.max(0.0)).unwrap();
    }
}

#[test]
fn test_seeded_runs_are_identical() {
    let config = Config::with_units(10, 4);
    let mut a = Trainer::with_seed(&config, 2024).unwrap();
    let mut b = Trainer::with_seed(&config, 2024).unwrap();
    a.create_population();
    b.create_population();
    assert_eq!(genomes(&a), genomes(&b));

    let mut fitness_a = ChaCha8Rng::seed_from_u64(1);
    let mut fitness_b = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..8 {
        score(&mut a, &mut fitness_a);
        score(&mut b, &mut fitness_b);
        a.evolve_population().unwrap();
        b.evolve_population().unwrap();
    }

    assert_eq!(genomes(&a), genomes(&b));
    assert_eq!(a.history(), b.history());
}

#[test]
fn test_population_size_is_constant() {
    let config = Config::with_units(12, 5);
    let mut trainer = Trainer::with_seed(&config, 5).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    trainer.create_population();
    assert_eq!(trainer.population().len(), 12);
    for _ in 0..10 {
        score(&mut trainer, &mut rng);
        trainer.evolve_population().unwrap();
        assert_eq!(trainer.population().len(), 12);
        let indices: Vec<usize> = trainer.population().iter().map(|u| u.index).collect();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());
    }
}

#[test]
fn test_winners_survive_unchanged() {
    let config = Config::with_units(10, 3);
    let mut trainer = Trainer::with_seed(&config, 77).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    trainer.create_population();

    for _ in 0..5 {
        score(&mut trainer, &mut rng);
        let mut ranked: Vec<(usize, f64)> = trainer
            .population()
            .iter()
            .map(|u| (u.index, u.fitness))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        let elite: Vec<(usize, Genome)> = ranked[..3]
            .iter()
            .map(|&(i, _)| (i, trainer.unit(i).unwrap().genome()))
            .collect();
        let restart = ranked[0].1 < 0.0 && trainer.mutation_rate() == 1.0;

        trainer.evolve_population().unwrap();

        if !restart {
            for (i, genome) in &elite {
                assert_eq!(&trainer.unit(*i).unwrap().genome(), genome);
            }
        }
    }
}

#[test]
fn test_offspring_carry_one_parents_weights() {
    // no mutation after the first generation, so offspring trace back to a winner
    let mut config = Config::with_units(10, 4);
    config.evolution.mutation_rate = 0.0;
    let mut trainer = Trainer::with_seed(&config, 9).unwrap();
    trainer.create_population();

    for (index, fitness) in [8.0, 1.0, 6.0, 2.0, 9.0, 0.5, 3.0, 7.0, 4.0, 5.0].iter().enumerate() {
        trainer.set_fitness(index, *fitness, 0.0).unwrap();
    }
    let winners: Vec<Vec<f64>> = [4usize, 0, 7, 2]
        .iter()
        .map(|&i| trainer.unit(i).unwrap().genome().weights())
        .collect();

    trainer.evolve_population().unwrap();

    for unit in trainer.population() {
        let weights = unit.genome().weights();
        assert!(winners.contains(&weights), "unit {} mixes parent weights", unit.index);
    }
}

#[test]
fn test_mutation_rate_transition() {
    let config = Config::with_units(8, 2);
    let mut trainer = Trainer::with_seed(&config, 31).unwrap();
    trainer.create_population();
    assert_eq!(trainer.mutation_rate(), 1.0);

    // two failed generations keep the initial rate
    for _ in 0..2 {
        for index in 0..8 {
            trainer.set_fitness(index, -5.0, 0.0).unwrap();
        }
        trainer.evolve_population().unwrap();
        assert_eq!(trainer.mutation_rate(), 1.0);
    }

    for index in 0..8 {
        trainer.set_fitness(index, index as f64 - 3.0, 0.0).unwrap();
    }
    trainer.evolve_population().unwrap();
    assert_eq!(trainer.mutation_rate(), 0.2);

    for _ in 0..3 {
        for index in 0..8 {
            trainer.set_fitness(index, -5.0, 0.0).unwrap();
        }
        trainer.evolve_population().unwrap();
        assert_eq!(trainer.mutation_rate(), 0.2);
    }

    assert_eq!(trainer.generation(), 7);
    assert_eq!(trainer.history().restarts(), 2);
}

#[test]
fn test_restart_yields_fresh_population() {
    let config = Config::with_units(6, 2);
    let mut trainer = Trainer::with_seed(&config, 4).unwrap();
    trainer.create_population();
    let before = genomes(&trainer);

    for index in 0..6 {
        trainer.set_fitness(index, -(index as f64) - 1.0, 3.0).unwrap();
    }
    trainer.evolve_population().unwrap();

    assert_eq!(trainer.mutation_rate(), 1.0);
    let after = genomes(&trainer);
    assert_eq!(after.len(), 6);
    for genome in &after {
        assert!(!before.contains(genome));
        // fresh networks: every weight still in the initial range
        assert!(genome.weights().iter().all(|w| (-0.1..0.1).contains(w)));
    }
    for unit in trainer.population() {
        assert_eq!((unit.fitness, unit.score, unit.is_winner), (0.0, 0.0, false));
    }
}

#[test]
fn test_genome_round_trip_outputs() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let mut source = Network::perceptron(&Topology::new(2, 5, 2), &mut rng);
    let genome = source.to_genome();
    let parsed = Genome::from_json(&genome.to_json().unwrap()).unwrap();
    assert_eq!(parsed, genome);

    let mut restored = Network::from_genome(&parsed).unwrap();
    assert_eq!(restored.to_genome(), genome);

    for _ in 0..20 {
        let input: [f64; 2] = [rng.gen_range(-200.0..200.0), rng.gen_range(-200.0..200.0)];
        assert_eq!(source.activate(&input).unwrap(), restored.activate(&input).unwrap());
    }
}

#[test]
fn test_selection_scenario() {
    let mut trainer = Trainer::with_seed(&Config::with_units(10, 2), 1).unwrap();
    trainer.create_population();
    let fitnesses = [5.0, -3.0, 1.0, 0.0, 2.0, -1.0, 4.0, 3.0, -2.0, 0.0];
    for (index, &fitness) in fitnesses.iter().enumerate() {
        trainer.set_fitness(index, fitness, 0.0).unwrap();
    }

    let winners: Vec<(usize, f64)> = trainer
        .selection()
        .iter()
        .map(|u| (u.index, u.fitness))
        .collect();

    assert_eq!(winners, vec![(0, 5.0), (6, 4.0)]);
    let flagged: Vec<usize> = trainer
        .population()
        .iter()
        .filter(|u| u.is_winner)
        .map(|u| u.index)
        .collect();
    assert_eq!(flagged.len(), 2);
    assert!(flagged.contains(&0) && flagged.contains(&6));
}

#[test]
fn test_hand_built_gated_network() {
    let mut net = Network::new();
    let x = net.add_neuron_with_bias(Role::Input, Squash::Identity, 0.0);
    let gate = net.add_neuron_with_bias(Role::Hidden, Squash::Logistic, 0.0);
    let out = net.add_neuron_with_bias(Role::Output, Squash::Identity, 0.0);
    net.connect(x, gate, 1.0).unwrap();
    let main = net.connect(x, out, 1.0).unwrap();
    net.gate(gate, main).unwrap();

    // output = x * sigmoid(x)
    for input in [-2.0f64, 0.0, 3.0] {
        let y = net.activate(&[input]).unwrap()[0];
        let expected = input / (1.0 + (-input).exp());
        assert!((y - expected).abs() < 1e-12);
    }

    assert!(matches!(
        net.gate(out, main),
        Err(Error::AlreadyGated { .. })
    ));
    assert!(matches!(
        net.activate(&[1.0, 2.0]),
        Err(Error::ShapeMismatch { expected: 1, found: 2 })
    ));
}

#[test]
fn test_decisions_follow_network_output() {
    let mut trainer = Trainer::with_seed(&Config::default(), 8).unwrap();
    trainer.create_population();
    let target = Target::new(300.0, 420.0);

    for index in 0..trainer.max_units() {
        let inputs = trainer.normalize(250.0, &target);
        let expected = {
            let mut net = trainer.unit(index).unwrap().network.clone();
            net.activate(&inputs).unwrap()[0] > 0.5
        };
        assert_eq!(trainer.decide(index, 250.0, &target).unwrap(), expected);
    }
}
