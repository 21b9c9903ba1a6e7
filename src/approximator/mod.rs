//! # Approximator Module
//!
//! Function approximators mapping a state to the learner's flat wire buffer.

mod neural_network;

pub use neural_network::{NeuralNetwork, TrainingParams};

use crate::error::Result;

/// A trainable mapping from an input vector to a fixed-size output vector
pub trait FunctionApproximator {
    /// Compute the output for `input`
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>>;

    /// Move the output for `input` toward `target`.
    ///
    /// `rate` in `(0, 1]` is the fraction of the gap between the current
    /// output and `target` that should be closed.
    fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<()>;

    /// Re-initialize all parameters
    fn reset(&mut self);

    /// Expected input length
    fn input_size(&self) -> usize;

    /// Produced output length
    fn output_size(&self) -> usize;
}

impl<T: FunctionApproximator + ?Sized> FunctionApproximator for &mut T {
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        (**self).predict(input)
    }

    fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<()> {
        (**self).train(input, target, rate)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn output_size(&self) -> usize {
        (**self).output_size()
    }
}

impl<T: FunctionApproximator + ?Sized> FunctionApproximator for Box<T> {
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        (**self).predict(input)
    }

    fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<()> {
        (**self).train(input, target, rate)
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn input_size(&self) -> usize {
        (**self).input_size()
    }

    fn output_size(&self) -> usize {
        (**self).output_size()
    }
}
