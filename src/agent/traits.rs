//! Learner trait definition.

use crate::error::Result;

/// A reinforcement learner driven one step at a time.
///
/// Each action selection records the state and the chosen action; the next
/// reinforcement consumes them.
pub trait Learner {
    /// Select the action the learner currently rates highest for `state`
    fn choose_best_action(&mut self, state: &[f64]) -> Result<Vec<f64>>;

    /// Select an action with Boltzmann (softmax) exploration.
    ///
    /// Lower `exploration_constant` values favour the best action, higher
    /// values approach a uniform choice.
    fn choose_boltzman_action(&mut self, state: &[f64], exploration_constant: f64)
        -> Result<Vec<f64>>;

    /// Learn from the reward of the last chosen action and the state it led to
    fn apply_reinforcement_to_last_action(&mut self, reward: f64, new_state: &[f64]) -> Result<()>;

    /// Forget everything learned and any pending action
    fn reset(&mut self);

    /// Get learner name
    fn name(&self) -> &str;
}
