//! Wire-fitted Q-learning agent for continuous states and actions (Gaskett et al.).

use crate::agent::Learner;
use crate::approximator::{FunctionApproximator, NeuralNetwork};
use crate::error::{Result, WireFitError};
use crate::interpolator::{best_wire_index, Interpolator, Wire, WireFitInterpolator};
use crate::utils::WireFitConfig;
use rand::Rng;
use tracing::{debug, info, trace};

/// Q-learning over continuous actions.
///
/// The approximator maps a state to `number_of_wires` wires (action, reward);
/// the interpolator turns them into a continuous reward surface. Every
/// reinforcement fits the wire rewards to the new Q-value target and trains
/// the approximator toward the fitted wires.
#[derive(Debug)]
pub struct WireFitQLearn<F, I = WireFitInterpolator> {
    config: WireFitConfig,
    approximator: F,
    interpolator: I,
    last_state: Option<Vec<f64>>,
    last_action: Option<Vec<f64>>,
}

impl WireFitQLearn<NeuralNetwork, WireFitInterpolator> {
    /// Create a learner backed by a freshly initialized neural network.
    ///
    /// The network starts out predicting [`WireFitQLearn::initial_wires`] for
    /// every state, so the untrained learner already spans the action space.
    pub fn with_network(
        config: WireFitConfig,
        num_hidden_layers: usize,
        neurons_per_hidden_layer: usize,
        seed: u64,
    ) -> Result<Self> {
        config.validate()?;

        let initial = Wire::encode_all(&initial_wires(&config)?);
        let network = NeuralNetwork::with_hidden_layers(
            config.state_dimensions,
            config.raw_output_size(),
            num_hidden_layers,
            neurons_per_hidden_layer,
            seed,
        )?
        .with_output_bias(&initial)?;

        Self::new(config, network, WireFitInterpolator::default())
    }
}

impl<F: FunctionApproximator, I: Interpolator> WireFitQLearn<F, I> {
    /// Create a learner from a configuration, an approximator and an interpolator
    pub fn new(config: WireFitConfig, approximator: F, interpolator: I) -> Result<Self> {
        config.validate()?;
        WireFitError::check_len(
            "approximator input",
            config.state_dimensions,
            approximator.input_size(),
        )?;
        WireFitError::check_len(
            "approximator output",
            config.raw_output_size(),
            approximator.output_size(),
        )?;

        Ok(Self {
            config,
            approximator,
            interpolator,
            last_state: None,
            last_action: None,
        })
    }

    pub fn config(&self) -> &WireFitConfig {
        &self.config
    }

    pub fn approximator(&self) -> &F {
        &self.approximator
    }

    pub fn interpolator(&self) -> &I {
        &self.interpolator
    }

    /// State recorded by the last action selection, if not yet reinforced
    pub fn last_state(&self) -> Option<&[f64]> {
        self.last_state.as_deref()
    }

    /// Action recorded by the last action selection, if not yet reinforced
    pub fn last_action(&self) -> Option<&[f64]> {
        self.last_action.as_deref()
    }

    /// Whether an action has been chosen and not yet reinforced
    pub fn is_awaiting_reinforcement(&self) -> bool {
        self.last_state.is_some() && self.last_action.is_some()
    }

    /// Untrained wire layout: zero rewards, actions spread over the action bounds
    pub fn initial_wires(&self) -> Result<Vec<Wire>> {
        initial_wires(&self.config)
    }

    /// Feed `state` through the approximator and decode its output into wires.
    ///
    /// Action components are clamped into the configured bounds.
    pub fn get_wires(&self, state: &[f64]) -> Result<Vec<Wire>> {
        WireFitError::check_len("state", self.config.state_dimensions, state.len())?;

        let raw = self.approximator.predict(state)?;
        WireFitError::check_len("approximator output", self.config.raw_output_size(), raw.len())?;

        let mut wires = Wire::decode_all(&raw, self.config.action_dimensions)?;
        for wire in &mut wires {
            self.clamp_action(&mut wire.action);
        }
        Ok(wires)
    }

    /// Wires on a uniform grid of `base_of_dimensions ^ action_dimensions` actions
    /// between the action bounds, each labelled with the interpolated reward for `state`
    pub fn get_set_of_wires(&self, state: &[f64], base_of_dimensions: usize) -> Result<Vec<Wire>> {
        if base_of_dimensions == 0 {
            return Err(WireFitError::invalid_argument(
                "base of dimensions must be positive",
            ));
        }

        let control_wires = self.get_wires(state)?;
        action_grid(&self.config, base_of_dimensions)?
            .into_iter()
            .map(|action| {
                let reward = self.interpolator.reward(&control_wires, &action)?;
                Ok(Wire::new(action, reward))
            })
            .collect()
    }

    /// Action of the highest-reward wire for `state`; ties go to the first wire
    pub fn best_action(&self, state: &[f64]) -> Result<Vec<f64>> {
        let wires = self.get_wires(state)?;
        Ok(Self::best_wire(&wires)?.action.clone())
    }

    /// Value estimate of `state`: the interpolated reward at its best action
    pub fn highest_reward(&self, state: &[f64]) -> Result<f64> {
        let wires = self.get_wires(state)?;
        let action = &Self::best_wire(&wires)?.action;
        self.interpolator.reward(&wires, action)
    }

    /// Bellman target for taking `action` in `old_state` and landing in `new_state`.
    ///
    /// `control_wires` are the wires of `old_state`; they only feed the logged TD error.
    pub fn get_q_value(
        &self,
        reward: f64,
        old_state: &[f64],
        new_state: &[f64],
        action: &[f64],
        control_wires: &[Wire],
    ) -> Result<f64> {
        let target = reward + self.config.devaluation_factor * self.highest_reward(new_state)?;
        let estimate = self.interpolator.reward(control_wires, action)?;

        debug!(
            ?old_state,
            ?action,
            estimate,
            target,
            td_error = target - estimate,
            "computed Q-value"
        );
        Ok(target)
    }

    /// Fit the wire rewards so the interpolated reward at `correct_wire.action`
    /// matches `correct_wire.reward`.
    ///
    /// Gradient descent on the squared error, moving rewards only; wire actions
    /// are left untouched. Stops at the configured error target or iteration
    /// cap and returns the lowest-error wire set seen.
    pub fn new_control_wires(&self, correct_wire: &Wire, control_wires: &[Wire]) -> Result<Vec<Wire>> {
        let gd = &self.config.control_points_gd;
        let action = &correct_wire.action;
        let target = correct_wire.reward;

        let mut wires = control_wires.to_vec();
        let mut value = self.interpolator.reward(&wires, action)?;
        let mut error = (value - target).powi(2);
        let initial_error = error;

        let mut best_error = error;
        let mut best_wires = wires.clone();
        let mut iterations = 0;

        while error >= gd.error_target && iterations < gd.max_iterations {
            let derivatives = (0..wires.len())
                .map(|k| self.interpolator.reward_derivative_at(action, k, &wires))
                .collect::<Result<Vec<f64>>>()?;

            let step = gd.learning_rate * 2.0 * (value - target);
            wires = wires
                .iter()
                .zip(&derivatives)
                .map(|(wire, derivative)| wire.with_reward(wire.reward - step * derivative))
                .collect();

            value = self.interpolator.reward(&wires, action)?;
            error = (value - target).powi(2);
            iterations += 1;

            if error < best_error {
                best_error = error;
                best_wires = wires.clone();
            }
        }

        debug!(
            iterations,
            initial_error,
            final_error = best_error,
            converged = best_error < gd.error_target,
            "fitted control wires"
        );
        Ok(best_wires)
    }

    /// Boltzmann action selection with an explicit random source
    pub fn choose_boltzman_action_with_rng<R: Rng + ?Sized>(
        &mut self,
        state: &[f64],
        exploration_constant: f64,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        if !(exploration_constant > 0.0 && exploration_constant.is_finite()) {
            return Err(WireFitError::invalid_argument(format!(
                "exploration constant must be a finite positive number, got {}",
                exploration_constant
            )));
        }

        let wires = self.get_wires(state)?;
        let max_reward = Self::best_wire(&wires)?.reward;

        let weights: Vec<f64> = wires
            .iter()
            .map(|wire| ((wire.reward - max_reward) / exploration_constant).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        let mut threshold = rng.gen::<f64>() * total;
        let mut chosen = wires.len() - 1;
        for (i, weight) in weights.iter().enumerate() {
            if threshold < *weight {
                chosen = i;
                break;
            }
            threshold -= weight;
        }

        let action = wires[chosen].action.clone();
        trace!(chosen, ?action, exploration_constant, "boltzmann action");
        self.record(state, &action);
        Ok(action)
    }

    fn best_wire(wires: &[Wire]) -> Result<&Wire> {
        best_wire_index(wires)
            .map(|i| &wires[i])
            .ok_or_else(|| WireFitError::invalid_argument("control wire set is empty"))
    }

    fn clamp_action(&self, action: &mut [f64]) {
        for ((value, lo), hi) in action
            .iter_mut()
            .zip(&self.config.min_action)
            .zip(&self.config.max_action)
        {
            *value = value.clamp(*lo, *hi);
        }
    }

    fn record(&mut self, state: &[f64], action: &[f64]) {
        self.last_state = Some(state.to_vec());
        self.last_action = Some(action.to_vec());
    }
}

impl<F: FunctionApproximator, I: Interpolator> Learner for WireFitQLearn<F, I> {
    fn choose_best_action(&mut self, state: &[f64]) -> Result<Vec<f64>> {
        let action = self.best_action(state)?;
        trace!(?action, "greedy action");
        self.record(state, &action);
        Ok(action)
    }

    fn choose_boltzman_action(&mut self, state: &[f64], exploration_constant: f64) -> Result<Vec<f64>> {
        self.choose_boltzman_action_with_rng(state, exploration_constant, &mut rand::thread_rng())
    }

    fn apply_reinforcement_to_last_action(&mut self, reward: f64, new_state: &[f64]) -> Result<()> {
        WireFitError::check_len("new state", self.config.state_dimensions, new_state.len())?;

        let (last_state, last_action) = match (&self.last_state, &self.last_action) {
            (Some(state), Some(action)) => (state.clone(), action.clone()),
            _ => return Err(WireFitError::InvalidSequence),
        };

        let control_wires = self.get_wires(&last_state)?;
        let q_value = self.get_q_value(reward, &last_state, new_state, &last_action, &control_wires)?;
        let correct_wire = Wire::new(last_action, q_value);
        let updated = self.new_control_wires(&correct_wire, &control_wires)?;

        self.approximator.train(
            &last_state,
            &Wire::encode_all(&updated),
            self.config.learning_rate,
        )?;

        // The pending action is only spent once training went through
        self.last_state = None;
        self.last_action = None;
        Ok(())
    }

    fn reset(&mut self) {
        self.approximator.reset();
        self.last_state = None;
        self.last_action = None;
        info!("wire-fit learner reset");
    }

    fn name(&self) -> &str {
        "Wire-Fit Q-Learning"
    }
}

/// Uniform grid of `base ^ action_dimensions` actions spanning the action bounds.
///
/// The last action dimension varies fastest. A base of one yields `min_action`.
/// Grids too large to hold in memory are rejected.
fn action_grid(config: &WireFitConfig, base: usize) -> Result<Vec<Vec<f64>>> {
    let dims = config.action_dimensions;
    let count = grid_size(base, dims).ok_or_else(|| {
        WireFitError::invalid_argument(format!(
            "action grid of base {} over {} dimensions is too large",
            base, dims
        ))
    })?;

    let grid = (0..count)
        .map(|index| {
            let mut rest = index;
            let mut action = vec![0.0; dims];
            for m in (0..dims).rev() {
                let digit = rest % base;
                rest /= base;

                let lo = config.min_action[m];
                let hi = config.max_action[m];
                action[m] = if base > 1 {
                    lo + (hi - lo) * digit as f64 / (base - 1) as f64
                } else {
                    lo
                };
            }
            action
        })
        .collect();
    Ok(grid)
}

/// Number of points in a grid of `base ^ dims` actions, if it can be allocated
fn grid_size(base: usize, dims: usize) -> Option<usize> {
    let count = base.checked_pow(u32::try_from(dims).ok()?)?;
    let bytes = count.checked_mul(std::mem::size_of::<Wire>())?;
    (bytes <= isize::MAX as usize).then_some(count)
}

/// Zero-reward wires spread over the action grid.
///
/// The grid base grows past `base_of_dimensions` until there is a distinct
/// grid point for every wire; wires then take evenly strided grid points.
fn initial_wires(config: &WireFitConfig) -> Result<Vec<Wire>> {
    let dims = u32::try_from(config.action_dimensions)
        .map_err(|_| WireFitError::invalid_argument("too many action dimensions"))?;
    let count = config.number_of_wires;

    let mut base = config.base_of_dimensions.max(1);
    while base.saturating_pow(dims) < count {
        base += 1;
    }

    let grid = action_grid(config, base)?;
    Ok((0..count)
        .map(|i| Wire::new(grid[i * grid.len() / count].clone(), 0.0))
        .collect())
}
