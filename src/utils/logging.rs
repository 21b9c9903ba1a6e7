//! Console logging for the learner and its tools.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Route `tracing` events to stderr.
///
/// `RUST_LOG` wins over `level` when set. A second call keeps the subscriber
/// that is already installed.
pub fn setup_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)?,
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(level, "wire-fit logging ready");
    }

    Ok(())
}
