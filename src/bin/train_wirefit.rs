//! Train a wire-fitted Q-learner on a one-dimensional toy task.
//!
//! The reward of an action is its first component, so a trained learner
//! should settle on the upper action bound.

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use wire_fit_qlearn::{setup_logging, Learner, WireFitConfig, WireFitQLearn};

#[derive(Parser)]
#[command(name = "train_wirefit")]
#[command(about = "Train a wire-fitted Q-learner on a toy task", long_about = None)]
struct Cli {
    /// Path to a JSON learner configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Number of reinforcement steps
    #[arg(short, long, default_value = "300")]
    episodes: usize,

    /// Boltzmann exploration constant
    #[arg(long, default_value = "0.3")]
    exploration: f64,

    /// Number of wires (defaults to the grid size)
    #[arg(short, long)]
    wires: Option<usize>,

    /// Hidden layers of the network
    #[arg(long, default_value = "1")]
    hidden_layers: usize,

    /// Neurons per hidden layer
    #[arg(long, default_value = "8")]
    neurons: usize,

    /// Random seed for network initialization and exploration
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => WireFitConfig::from_file(path)?,
        None => WireFitConfig::default().with_devaluation_factor(0.0),
    };
    if let Some(wires) = cli.wires {
        config = config.with_number_of_wires(wires);
    }

    let mut learner =
        WireFitQLearn::with_network(config.clone(), cli.hidden_layers, cli.neurons, cli.seed)?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    info!(
        "Training {} learner: {} wires, {} steps",
        learner.name(),
        config.number_of_wires,
        cli.episodes
    );

    let mut total_reward = 0.0;
    for episode in 0..cli.episodes {
        let state: Vec<f64> = (0..config.state_dimensions).map(|_| rng.gen()).collect();
        let action = learner.choose_boltzman_action_with_rng(&state, cli.exploration, &mut rng)?;

        let reward = action[0];
        total_reward += reward;
        learner.apply_reinforcement_to_last_action(reward, &state)?;

        if (episode + 1) % 50 == 0 {
            info!(
                "Step {} | Avg reward: {:.3}",
                episode + 1,
                total_reward / (episode + 1) as f64
            );
        }
    }

    let probe = vec![0.5; config.state_dimensions];
    let best = learner.best_action(&probe)?;
    let value = learner.highest_reward(&probe)?;
    info!("Greedy action {:?} with estimated reward {:.3}", best, value);

    Ok(())
}
