//! Learner configuration.

use crate::error::{Result, WireFitError};
use serde::{Deserialize, Serialize};

/// Gradient descent settings for fitting corrected control wires
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPointsGd {
    /// Squared error below which the fit stops
    pub error_target: f64,
    /// Step size applied to each wire reward
    pub learning_rate: f64,
    /// Hard cap on the number of descent steps
    pub max_iterations: usize,
}

impl Default for ControlPointsGd {
    fn default() -> Self {
        Self {
            error_target: 0.001,
            learning_rate: 0.4,
            max_iterations: 10_000,
        }
    }
}

/// Wire-fitted Q-learning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFitConfig {
    /// Length of the state vector
    pub state_dimensions: usize,
    /// Length of the action vector
    pub action_dimensions: usize,
    /// Number of wires produced by the approximator for each state
    pub number_of_wires: usize,
    /// Number of discrete values per action dimension in the wire grid
    pub base_of_dimensions: usize,
    /// Lower action bound per dimension
    pub min_action: Vec<f64>,
    /// Upper action bound per dimension
    pub max_action: Vec<f64>,
    /// Fraction of the gap to the corrected wires closed per reinforcement
    pub learning_rate: f64,
    /// Discount applied to the value of the next state
    pub devaluation_factor: f64,
    /// Control wire fitting
    #[serde(default)]
    pub control_points_gd: ControlPointsGd,
}

impl Default for WireFitConfig {
    fn default() -> Self {
        Self::new(1, vec![0.0], vec![1.0], 2)
    }
}

impl WireFitConfig {
    /// Create a configuration whose wire count is `base_of_dimensions ^ action_dimensions`.
    ///
    /// A wire count past `usize::MAX` is pinned there and rejected by [`WireFitConfig::validate`].
    pub fn new(
        state_dimensions: usize,
        min_action: Vec<f64>,
        max_action: Vec<f64>,
        base_of_dimensions: usize,
    ) -> Self {
        let action_dimensions = min_action.len();
        let number_of_wires = u32::try_from(action_dimensions)
            .ok()
            .and_then(|dims| base_of_dimensions.checked_pow(dims))
            .unwrap_or(usize::MAX);

        Self {
            state_dimensions,
            action_dimensions,
            number_of_wires,
            base_of_dimensions,
            min_action,
            max_action,
            learning_rate: 0.95,
            devaluation_factor: 0.4,
            control_points_gd: ControlPointsGd::default(),
        }
    }

    pub fn with_number_of_wires(mut self, number_of_wires: usize) -> Self {
        self.number_of_wires = number_of_wires;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_devaluation_factor(mut self, devaluation_factor: f64) -> Self {
        self.devaluation_factor = devaluation_factor;
        self
    }

    pub fn with_control_points_gd(mut self, control_points_gd: ControlPointsGd) -> Self {
        self.control_points_gd = control_points_gd;
        self
    }

    /// Length of the approximator output: every wire is its action plus a reward.
    ///
    /// Saturates for configurations that fail [`WireFitConfig::validate`].
    pub fn raw_output_size(&self) -> usize {
        self.checked_raw_output_size().unwrap_or(usize::MAX)
    }

    /// Output length, if a buffer of that many values can be allocated
    fn checked_raw_output_size(&self) -> Option<usize> {
        let size = self
            .number_of_wires
            .checked_mul(self.action_dimensions.checked_add(1)?)?;
        let bytes = size.checked_mul(std::mem::size_of::<f64>())?;
        (bytes <= isize::MAX as usize).then_some(size)
    }

    /// Check every parameter against its valid range
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(WireFitError::invalid_argument(msg));

        if self.state_dimensions == 0 {
            return fail("state dimensions must be positive".into());
        }
        if self.action_dimensions == 0 {
            return fail("action dimensions must be positive".into());
        }
        if self.number_of_wires == 0 {
            return fail("number of wires must be positive".into());
        }
        if self.base_of_dimensions == 0 {
            return fail("base of dimensions must be positive".into());
        }
        WireFitError::check_len("min action", self.action_dimensions, self.min_action.len())?;
        WireFitError::check_len("max action", self.action_dimensions, self.max_action.len())?;
        if self.checked_raw_output_size().is_none() {
            return fail(format!(
                "{} wires over {} action dimensions do not fit in memory",
                self.number_of_wires, self.action_dimensions
            ));
        }

        for (i, (lo, hi)) in self.min_action.iter().zip(&self.max_action).enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return fail(format!("invalid action bounds [{}, {}] in dimension {}", lo, hi, i));
            }
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return fail(format!("learning rate must be in (0, 1], got {}", self.learning_rate));
        }
        if !(0.0..=1.0).contains(&self.devaluation_factor) {
            return fail(format!(
                "devaluation factor must be in [0, 1], got {}",
                self.devaluation_factor
            ));
        }

        let gd = &self.control_points_gd;
        if !(gd.learning_rate > 0.0 && gd.learning_rate.is_finite()) {
            return fail(format!(
                "control points learning rate must be positive, got {}",
                gd.learning_rate
            ));
        }
        if !(gd.error_target > 0.0 && gd.error_target.is_finite()) {
            return fail(format!(
                "control points error target must be positive, got {}",
                gd.error_target
            ));
        }
        if gd.max_iterations == 0 {
            return fail("control points max iterations must be positive".into());
        }

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: WireFitConfig = serde_json::from_str(&content)?;
        config
            .validate()
            .map_err(|e| WireFitError::Config(format!("{}: {}", path, e)))?;
        Ok(config)
    }
}
