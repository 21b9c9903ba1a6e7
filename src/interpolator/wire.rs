//! Wire data record and its flat encoding.

use crate::error::{Result, WireFitError};
use serde::{Deserialize, Serialize};

/// A labelled control point: an action vector and its estimated long-term reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    /// Action vector
    pub action: Vec<f64>,
    /// Estimated reward of taking `action`
    pub reward: f64,
}

impl Wire {
    /// Create a new wire
    pub fn new(action: Vec<f64>, reward: f64) -> Self {
        Self { action, reward }
    }

    /// Same action, different reward
    pub fn with_reward(&self, reward: f64) -> Self {
        Self {
            action: self.action.clone(),
            reward,
        }
    }

    /// Number of action components
    pub fn dimensions(&self) -> usize {
        self.action.len()
    }

    /// Decode a flat buffer into wires.
    ///
    /// Wires are laid out in index order, each as
    /// `[action_0 .. action_{d-1}, reward]`.
    pub fn decode_all(raw: &[f64], action_dimensions: usize) -> Result<Vec<Wire>> {
        if action_dimensions == 0 {
            return Err(WireFitError::invalid_argument(
                "action dimensions must be positive",
            ));
        }
        let stride = action_dimensions + 1;
        if raw.len() % stride != 0 {
            return Err(WireFitError::invalid_argument(format!(
                "buffer of length {} is not a multiple of the wire stride {}",
                raw.len(),
                stride
            )));
        }

        Ok(raw
            .chunks_exact(stride)
            .map(|chunk| Wire::new(chunk[..action_dimensions].to_vec(), chunk[action_dimensions]))
            .collect())
    }

    /// Encode wires into the flat buffer layout read by [`Wire::decode_all`]
    /// Index of the first wire in `wires` equal to this one
    pub fn position_in(&self, wires: &[Wire]) -> Result<usize> {
        wires
            .iter()
            .position(|w| w == self)
            .ok_or_else(|| WireFitError::invalid_argument("wire is not one of the control wires"))
    }

    pub fn encode_all(wires: &[Wire]) -> Vec<f64> {
        let mut raw = Vec::with_capacity(wires.iter().map(|w| w.dimensions() + 1).sum());
        for wire in wires {
            raw.extend_from_slice(&wire.action);
            raw.push(wire.reward);
        }
        raw
    }
}

/// Index of the wire with the highest reward; ties go to the first wire
pub fn best_wire_index(wires: &[Wire]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, wire) in wires.iter().enumerate() {
        match best {
            Some((_, reward)) if wire.reward <= reward => {}
            _ => best = Some((i, wire.reward)),
        }
    }
    best.map(|(i, _)| i)
}
