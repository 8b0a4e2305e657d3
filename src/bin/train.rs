use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use xo_learner::ai::{TdAgent, ValueStore};
use xo_learner::checkpoint::CheckpointManager;
use xo_learner::config::AppConfig;
use xo_learner::training::session::{OpponentKind, TrainingSession};
use xo_learner::training::trainer::Trainer;

/// Train the tic-tac-toe TD agent against a scripted opponent.
#[derive(Parser)]
#[command(name = "train", about = "Train the tic-tac-toe TD agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Resume training from the latest checkpoint
    #[arg(long)]
    resume: bool,

    /// Override number of training games
    #[arg(long)]
    games: Option<u64>,

    /// Training opponent: random or negamax
    #[arg(long)]
    opponent: Option<OpponentKind>,

    /// Seed for the agent and opponents
    #[arg(long)]
    seed: Option<u64>,

    /// Where to export the trained value table
    #[arg(long)]
    store: Option<PathBuf>,

    /// Override the checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Seed a fresh run from an existing value table
    #[arg(long, conflicts_with = "resume")]
    init_from: Option<PathBuf>,

    /// Print a config file with every default value and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // Load configuration
    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(games) = cli.games {
        config.training.num_games = games;
    }
    if let Some(opponent) = cli.opponent {
        config.training.opponent = opponent;
    }
    if let Some(seed) = cli.seed {
        config.agent.seed = Some(seed);
        config.training.seed = Some(seed);
    }
    if let Some(store) = cli.store {
        config.training.store_path = store;
    }
    if let Some(dir) = cli.checkpoint_dir {
        config.checkpoint.checkpoint_dir = dir;
    }
    config.validate().context("invalid configuration")?;

    let (mut agent, mut session) = if cli.resume {
        resume(&config)
    } else {
        let store = match &cli.init_from {
            Some(path) => ValueStore::try_load(path)
                .with_context(|| format!("loading value table from {}", path.display()))?,
            None => ValueStore::new(),
        };
        let session = TrainingSession::new(config.training.num_games, config.training.training_strength);
        (TdAgent::with_store(config.agent.clone(), store), session)
    };

    let trainer = Trainer::new(config.training.clone(), config.checkpoint.clone());
    let report = trainer
        .train(&mut agent, &mut session)
        .context("training failed")?;

    info!(
        games = report.games_played,
        wins = report.tally.wins,
        draws = report.tally.draws,
        losses = report.tally.losses,
        states = report.states,
        "done"
    );
    Ok(())
}

/// Continue from the latest checkpoint, or start fresh if there is none.
fn resume(config: &AppConfig) -> (TdAgent, TrainingSession) {
    let manager = CheckpointManager::new(config.checkpoint.clone());
    match manager.load_latest() {
        Ok(data) => {
            info!(
                path = %data.path.display(),
                games = data.metadata.games_played,
                phase = data.metadata.training_phase,
                states = data.store.len(),
                "resumed from checkpoint"
            );
            let (agent, mut session) = data.into_agent(config.agent.clone());
            session.training_strength = config.training.training_strength;
            session.extend(config.training.num_games);
            (agent, session)
        }
        Err(e) => {
            warn!(error = %e, "no checkpoint to resume from, starting fresh");
            let session = TrainingSession::new(config.training.num_games, config.training.training_strength);
            (TdAgent::new(config.agent.clone()), session)
        }
    }
}
