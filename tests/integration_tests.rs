//! Integration tests for the wire-fitted Q-learner

use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use wire_fit_qlearn::{
    FunctionApproximator, Interpolator, Learner, NeuralNetwork, Wire, WireFitConfig,
    WireFitError, WireFitInterpolator, WireFitQLearn,
};

fn scenario_config() -> WireFitConfig {
    WireFitConfig::new(1, vec![0.0], vec![1.0], 2).with_number_of_wires(4)
}

/// Reward equal to the action: the learner should settle on the upper bound
#[test]
fn test_learns_to_maximize_action() {
    let mut learner = WireFitQLearn::with_network(scenario_config(), 1, 8, 7).unwrap();
    let mut rng = StdRng::seed_from_u64(11);
    let state = [0.5];

    for _ in 0..300 {
        let action = learner
            .choose_boltzman_action_with_rng(&state, 0.3, &mut rng)
            .unwrap();
        learner
            .apply_reinforcement_to_last_action(action[0], &state)
            .unwrap();
    }

    let action = learner.choose_best_action(&state).unwrap();
    assert_abs_diff_eq!(action[0], 1.0, epsilon = 0.1);

    let wires = learner.get_wires(&state).unwrap();
    assert!(wires.iter().any(|w| w.action == action));
}

/// Full select/reinforce cycle enforces the two-phase session
#[test]
fn test_session_lifecycle() {
    let mut learner = WireFitQLearn::with_network(scenario_config(), 2, 6, 3).unwrap();

    assert_eq!(
        learner.apply_reinforcement_to_last_action(0.0, &[0.1]),
        Err(WireFitError::InvalidSequence)
    );

    learner.choose_best_action(&[0.1]).unwrap();
    assert!(learner.is_awaiting_reinforcement());
    learner.apply_reinforcement_to_last_action(1.0, &[0.2]).unwrap();
    assert!(!learner.is_awaiting_reinforcement());

    assert_eq!(
        learner.apply_reinforcement_to_last_action(1.0, &[0.2]),
        Err(WireFitError::InvalidSequence)
    );
}

/// Reset brings the value estimate back to that of a fresh learner
#[test]
fn test_reset_matches_fresh_learner() {
    let fresh = WireFitQLearn::with_network(scenario_config(), 1, 8, 21).unwrap();
    let mut trained = WireFitQLearn::with_network(scenario_config(), 1, 8, 21).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    for step in 0..50 {
        let state = [step as f64 / 50.0];
        let action = trained
            .choose_boltzman_action_with_rng(&state, 0.5, &mut rng)
            .unwrap();
        trained
            .apply_reinforcement_to_last_action(action[0] * 2.0, &state)
            .unwrap();
    }
    assert!(
        (trained.highest_reward(&[0.3]).unwrap() - fresh.highest_reward(&[0.3]).unwrap()).abs()
            > 1e-6
    );

    trained.choose_best_action(&[0.3]).unwrap();
    trained.reset();

    assert!(!trained.is_awaiting_reinforcement());
    for state in [[0.0], [0.3], [0.77], [1.0]] {
        assert_abs_diff_eq!(
            trained.highest_reward(&state).unwrap(),
            fresh.highest_reward(&state).unwrap(),
            epsilon = 1e-12
        );
    }
}

/// Untrained network predicts the initial wire layout for any state
#[test]
fn test_untrained_wires_span_action_space() {
    let learner = WireFitQLearn::with_network(scenario_config(), 1, 4, 1).unwrap();
    let expected = learner.initial_wires().unwrap();

    for state in [[-2.0], [0.0], [3.5]] {
        let wires = learner.get_wires(&state).unwrap();
        assert_eq!(wires.len(), 4);
        for (wire, initial) in wires.iter().zip(&expected) {
            assert_abs_diff_eq!(wire.action[0], initial.action[0], epsilon = 1e-12);
            assert_abs_diff_eq!(wire.reward, 0.0, epsilon = 1e-12);
        }
    }
}

/// A wire layout too large to allocate is reported, not attempted
#[test]
fn test_oversized_layout_is_an_error() {
    let config = WireFitConfig::new(1, vec![0.0; 4], vec![1.0; 4], 1 << 20);
    assert!(matches!(
        WireFitQLearn::with_network(config, 1, 4, 0),
        Err(WireFitError::InvalidArgument(_))
    ));
}

/// A lent approximator and a shared interpolator can back a learner
#[test]
fn test_borrowed_approximator_and_shared_interpolator() {
    let config = WireFitConfig::new(2, vec![-1.0, -1.0], vec![1.0, 1.0], 2);
    let mut network = NeuralNetwork::new(&[2, 5, config.raw_output_size()], 9).unwrap();
    let interpolator = Arc::new(WireFitInterpolator::default());

    {
        let mut learner =
            WireFitQLearn::new(config.clone(), &mut network, Arc::clone(&interpolator)).unwrap();
        let action = learner.choose_best_action(&[0.2, -0.4]).unwrap();
        assert_eq!(action.len(), 2);
        assert!(action.iter().all(|a| (-1.0..=1.0).contains(a)));
        learner
            .apply_reinforcement_to_last_action(1.0, &[0.3, -0.4])
            .unwrap();
        assert_eq!(learner.name(), "Wire-Fit Q-Learning");
    }

    assert_eq!(network.predict(&[0.2, -0.4]).unwrap().len(), 12);
    assert_eq!(interpolator.name(), "wirefit");
}

/// Grid wires follow the interpolated surface of the live wires
#[test]
fn test_set_of_wires_is_bounded_by_live_wires() {
    let config = WireFitConfig::new(1, vec![0.0, 0.0], vec![1.0, 1.0], 3);
    let network = NeuralNetwork::new(&[1, 6, config.raw_output_size()], 4).unwrap();
    let learner = WireFitQLearn::new(config, network, WireFitInterpolator::default()).unwrap();

    let live = learner.get_wires(&[0.5]).unwrap();
    let lo = live.iter().map(|w| w.reward).fold(f64::INFINITY, f64::min);
    let hi = live.iter().map(|w| w.reward).fold(f64::NEG_INFINITY, f64::max);

    let grid = learner.get_set_of_wires(&[0.5], 4).unwrap();
    assert_eq!(grid.len(), 16);
    for wire in &grid {
        assert!(wire.reward >= lo - 1e-12 && wire.reward <= hi + 1e-12);
    }
}

/// Encoded wires round the approximator boundary in canonical order
#[test]
fn test_wire_buffer_layout() {
    let wires = vec![Wire::new(vec![0.1, 0.2], 1.0), Wire::new(vec![0.3, 0.4], 2.0)];
    assert_eq!(Wire::encode_all(&wires), vec![0.1, 0.2, 1.0, 0.3, 0.4, 2.0]);
}
