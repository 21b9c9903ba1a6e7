//! # Interpolator Module
//!
//! Reconstructs a continuous reward(action) surface from a sparse set of wires.

mod wire;
mod wire_fit;

pub use wire::{best_wire_index, Wire};
pub use wire_fit::WireFitInterpolator;

use crate::error::Result;
use std::sync::Arc;

/// Differentiable interpolation over a set of control wires
pub trait Interpolator {
    /// Interpolated reward at `action`
    fn reward(&self, control_wires: &[Wire], action: &[f64]) -> Result<f64>;

    /// Partial derivative of [`Interpolator::reward`] at `action` with respect to `wire.reward`.
    ///
    /// `wire` is looked up in `control_wires` by value, so identical copies all
    /// resolve to the first one. Prefer [`Interpolator::reward_derivative_at`]
    /// when the position of the wire is known.
    fn reward_derivative(
        &self,
        action: &[f64],
        wire: &Wire,
        control_wires: &[Wire],
    ) -> Result<f64> {
        let index = wire.position_in(control_wires)?;
        self.reward_derivative_at(action, index, control_wires)
    }

    /// Partial derivative of [`Interpolator::reward`] at `action` with respect to
    /// the reward of `control_wires[index]`
    fn reward_derivative_at(
        &self,
        action: &[f64],
        index: usize,
        control_wires: &[Wire],
    ) -> Result<f64>;

    /// Partial derivative of [`Interpolator::reward`] at `action` with respect to
    /// one component of `wire.action`.
    ///
    /// `wire_action_term` is the current value of that component and
    /// `action_term` the matching component of the query action.
    fn action_term_derivative(
        &self,
        action_term: f64,
        wire_action_term: f64,
        action: &[f64],
        wire: &Wire,
        control_wires: &[Wire],
    ) -> Result<f64>;

    /// Name of the interpolation scheme
    fn name(&self) -> &str;
}

macro_rules! forward_interpolator {
    ($($ptr:ty),*) => {$(
        impl<T: Interpolator + ?Sized> Interpolator for $ptr {
            fn reward(&self, control_wires: &[Wire], action: &[f64]) -> Result<f64> {
                (**self).reward(control_wires, action)
            }

            fn reward_derivative(
                &self,
                action: &[f64],
                wire: &Wire,
                control_wires: &[Wire],
            ) -> Result<f64> {
                (**self).reward_derivative(action, wire, control_wires)
            }

            fn reward_derivative_at(
                &self,
                action: &[f64],
                index: usize,
                control_wires: &[Wire],
            ) -> Result<f64> {
                (**self).reward_derivative_at(action, index, control_wires)
            }

            fn action_term_derivative(
                &self,
                action_term: f64,
                wire_action_term: f64,
                action: &[f64],
                wire: &Wire,
                control_wires: &[Wire],
            ) -> Result<f64> {
                (**self).action_term_derivative(
                    action_term,
                    wire_action_term,
                    action,
                    wire,
                    control_wires,
                )
            }

            fn name(&self) -> &str {
                (**self).name()
            }
        }
    )*};
}

forward_interpolator!(&T, Box<T>, Arc<T>);
