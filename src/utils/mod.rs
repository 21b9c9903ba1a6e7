//! Configuration and logging helpers.

mod config;
mod logging;

pub use config::{ControlPointsGd, WireFitConfig};
pub use logging::setup_logging;
