use serde::{Deserialize, Serialize};

use crate::ai::AgentConfig;
use crate::training::session::TrainingSession;

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub average_game_length: f64,
    pub average_td_error: f64,
    pub states: usize,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub games_played: u64,
    pub training_phase: u64,
    pub timestamp: u64,
    pub effective_epsilon: f64,
    pub effective_alpha: f64,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: AgentConfig,
    pub session: TrainingSession,
}
