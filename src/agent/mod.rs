//! # Agent Module
//!
//! Learners built on top of an approximator and an interpolator.

mod traits;
mod wire_fit_qlearn;

pub use traits::Learner;
pub use wire_fit_qlearn::WireFitQLearn;
