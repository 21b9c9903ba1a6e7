//! # Wire-Fit Q-Learn
//!
//! Q-learning over continuous state and action spaces with wire fitting
//! (Gaskett, Wettergreen and Zelinsky).
//!
//! ## Modules
//!
//! - `interpolator` - Wires and the wire-fit interpolator
//! - `approximator` - Function approximators producing wires from a state
//! - `agent` - The wire-fitted Q-learning agent
//! - `utils` - Configuration and logging

pub mod agent;
pub mod approximator;
pub mod error;
pub mod interpolator;
pub mod utils;

pub use agent::{Learner, WireFitQLearn};
pub use approximator::{FunctionApproximator, NeuralNetwork};
pub use error::{Result, WireFitError};
pub use interpolator::{Interpolator, Wire, WireFitInterpolator};
pub use utils::{setup_logging, ControlPointsGd, WireFitConfig};
