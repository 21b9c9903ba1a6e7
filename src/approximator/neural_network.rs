//! Small multi-layer perceptron used as the default wire approximator.

use super::FunctionApproximator;
use crate::error::{Result, WireFitError};
use ndarray::{Array1, Array2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Hidden layers squash with a sigmoid, the output layer stays linear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Activation {
    Sigmoid,
    Linear,
}

impl Activation {
    fn apply(&self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-z).exp()),
            Activation::Linear => z,
        }
    }

    /// Derivative evaluated at the pre-activation `z`
    fn derivative(&self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let s = self.apply(z);
                s * (1.0 - s)
            }
            Activation::Linear => 1.0,
        }
    }
}

/// Gradient descent settings used by [`NeuralNetwork::train`](FunctionApproximator::train)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingParams {
    /// Step size of a single backpropagation update
    pub step_size: f64,
    /// Maximum number of updates per training call
    pub max_epochs: usize,
    /// Stop once the mean squared error drops below this value
    pub error_target: f64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            step_size: 0.05,
            max_epochs: 200,
            error_target: 1e-8,
        }
    }
}

/// A single dense layer
#[derive(Debug, Clone)]
struct Layer {
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

impl Layer {
    fn new(input_size: usize, output_size: usize, activation: Activation, rng: &mut StdRng) -> Self {
        // Xavier initialization
        let scale = (6.0 / (input_size + output_size) as f64).sqrt();
        let weights = Array2::random_using(
            (input_size, output_size),
            Uniform::new(-scale, scale),
            rng,
        );
        let biases = Array1::zeros(output_size);

        Self {
            weights,
            biases,
            activation,
        }
    }

    /// Returns the pre-activation and the activation
    fn forward(&self, input: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let z = input.dot(&self.weights) + &self.biases;
        let a = z.mapv(|x| self.activation.apply(x));
        (z, a)
    }
}

/// Fully connected network with sigmoid hidden layers and a linear output layer.
///
/// Initialization is driven by a fixed seed, so [`FunctionApproximator::reset`]
/// restores exactly the network that [`NeuralNetwork::new`] built.
#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
    output_bias: Option<Array1<f64>>,
    params: TrainingParams,
    seed: u64,
}

impl NeuralNetwork {
    /// Create a network with the given layer sizes (input, hidden..., output)
    pub fn new(layer_sizes: &[usize], seed: u64) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(WireFitError::invalid_argument(
                "need at least input and output layers",
            ));
        }
        if layer_sizes.iter().any(|&n| n == 0) {
            return Err(WireFitError::invalid_argument("layer sizes must be positive"));
        }

        let mut network = Self {
            layer_sizes: layer_sizes.to_vec(),
            layers: Vec::new(),
            output_bias: None,
            params: TrainingParams::default(),
            seed,
        };
        network.layers = network.build_layers();
        Ok(network)
    }

    /// Create a network with `num_hidden_layers` layers of `neurons_per_layer` neurons each
    pub fn with_hidden_layers(
        input_size: usize,
        output_size: usize,
        num_hidden_layers: usize,
        neurons_per_layer: usize,
        seed: u64,
    ) -> Result<Self> {
        let mut sizes = vec![input_size];
        sizes.extend(std::iter::repeat(neurons_per_layer).take(num_hidden_layers));
        sizes.push(output_size);
        Self::new(&sizes, seed)
    }

    /// Zero the output weights and start the output layer at `bias`.
    ///
    /// The untrained network then predicts exactly `bias` for every input.
    pub fn with_output_bias(mut self, bias: &[f64]) -> Result<Self> {
        WireFitError::check_len("output bias", self.output_size(), bias.len())?;
        self.output_bias = Some(Array1::from_vec(bias.to_vec()));
        self.layers = self.build_layers();
        Ok(self)
    }

    pub fn with_training_params(mut self, params: TrainingParams) -> Self {
        self.params = params;
        self
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn training_params(&self) -> &TrainingParams {
        &self.params
    }

    /// Get the number of parameters
    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|l| l.weights.len() + l.biases.len())
            .sum()
    }

    fn build_layers(&self) -> Vec<Layer> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let last = self.layer_sizes.len() - 2;

        let mut layers: Vec<Layer> = (0..=last)
            .map(|i| {
                let activation = if i == last {
                    Activation::Linear
                } else {
                    Activation::Sigmoid
                };
                Layer::new(
                    self.layer_sizes[i],
                    self.layer_sizes[i + 1],
                    activation,
                    &mut rng,
                )
            })
            .collect();

        if let (Some(bias), Some(output)) = (&self.output_bias, layers.last_mut()) {
            output.weights.fill(0.0);
            output.biases.assign(bias);
        }
        layers
    }

    /// Forward pass
    pub fn forward(&self, input: &Array1<f64>) -> Array1<f64> {
        let mut output = input.clone();
        for layer in &self.layers {
            output = layer.forward(&output).1;
        }
        output
    }

    /// One backpropagation update on squared error; returns the mean squared
    /// error measured before the update
    fn train_single(&mut self, input: &Array1<f64>, target: &Array1<f64>) -> f64 {
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut activations = vec![input.clone()];
        for layer in &self.layers {
            let (z, a) = layer.forward(activations.last().unwrap_or(input));
            pre_activations.push(z);
            activations.push(a);
        }

        let output = &activations[self.layers.len()];
        let error = output - target;
        let mse = error.iter().map(|e| e * e).sum::<f64>() / error.len() as f64;

        let mut grad = error;
        for i in (0..self.layers.len()).rev() {
            let layer = &self.layers[i];
            let delta: Array1<f64> = grad
                .iter()
                .zip(pre_activations[i].iter())
                .map(|(&g, &z)| g * layer.activation.derivative(z))
                .collect();

            // Propagate before the weights change
            let next_grad = layer.weights.dot(&delta);

            let grad_weights = activations[i]
                .view()
                .insert_axis(Axis(1))
                .dot(&delta.view().insert_axis(Axis(0)));

            let step = self.params.step_size;
            let layer = &mut self.layers[i];
            layer.weights.scaled_add(-step, &grad_weights);
            layer.biases.scaled_add(-step, &delta);

            grad = next_grad;
        }

        mse
    }
}

impl FunctionApproximator for NeuralNetwork {
    fn predict(&self, input: &[f64]) -> Result<Vec<f64>> {
        WireFitError::check_len("network input", self.input_size(), input.len())?;
        Ok(self.forward(&Array1::from_vec(input.to_vec())).to_vec())
    }

    fn train(&mut self, input: &[f64], target: &[f64], rate: f64) -> Result<()> {
        WireFitError::check_len("network input", self.input_size(), input.len())?;
        WireFitError::check_len("network target", self.output_size(), target.len())?;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(WireFitError::invalid_argument(format!(
                "training rate must be in (0, 1], got {}",
                rate
            )));
        }

        let input = Array1::from_vec(input.to_vec());
        let current = self.forward(&input);
        let target = &current + &((&Array1::from_vec(target.to_vec()) - &current) * rate);

        for _ in 0..self.params.max_epochs {
            if self.train_single(&input, &target) < self.params.error_target {
                break;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.layers = self.build_layers();
    }

    fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }
}
