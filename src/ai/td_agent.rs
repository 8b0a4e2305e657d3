//! Tabular temporal-difference agent.
//!
//! The agent scores a candidate move by the stored value of the board it
//! would produce, plays epsilon-greedily over those scores, and after each
//! finished game moves the value of the board it last moved from toward the
//! observed reward plus the discounted best follow-up value.

use std::path::Path;

use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::agent::Agent;
use crate::ai::value_store::{StateKey, ValueStore};
use crate::error::StoreError;
use crate::game::{Board, GameOutcome, GameState, Player};

/// Terminal rewards, from the agent's point of view. Intermediate moves
/// always earn zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            win: 1.0,
            loss: -1.0,
            draw: 0.1,
        }
    }
}

impl RewardConfig {
    /// Reward earned by `agent` for a finished game.
    pub fn reward_for(&self, outcome: GameOutcome, agent: Player) -> f64 {
        match outcome {
            GameOutcome::Winner(winner) if winner == agent => self.win,
            GameOutcome::Winner(_) => self.loss,
            GameOutcome::Draw => self.draw,
        }
    }
}

/// Learning agent hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base learning rate.
    pub alpha: f64,
    /// Floor for the annealed learning rate.
    pub min_alpha: f64,
    /// Fraction of `alpha` removed once `anneal_phases` is reached.
    pub alpha_anneal: f64,
    /// Training phase at which annealing bottoms out. Zero disables it.
    pub anneal_phases: u64,
    pub gamma: f64,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    /// Mark the agent plays and evaluates future moves with.
    pub mark: Player,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
    pub rewards: RewardConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            alpha: 0.7,
            min_alpha: 0.05,
            alpha_anneal: 0.5,
            anneal_phases: 20_000,
            gamma: 0.9,
            epsilon: 0.3,
            epsilon_decay: 0.995,
            min_epsilon: 0.1,
            mark: Player::O,
            seed: None,
            rewards: RewardConfig::default(),
        }
    }
}

/// Record of a single value update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TdUpdate {
    pub key: StateKey,
    pub previous: f64,
    pub updated: f64,
    pub target: f64,
    pub td_error: f64,
    pub alpha: f64,
}

/// Simulate `mark` playing at `position` without touching `board`.
pub fn apply(board: &Board, position: usize, mark: Player) -> Board {
    board.apply(position, mark.to_cell())
}

/// Epsilon-greedy agent over a [`ValueStore`].
pub struct TdAgent {
    store: ValueStore,
    config: AgentConfig,
    training_phase: u64,
    rng: StdRng,
}

impl TdAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self::with_store(config, ValueStore::new())
    }

    pub fn with_store(config: AgentConfig, store: ValueStore) -> Self {
        Self::resume(config, store, 0)
    }

    /// Rebuild an agent part-way through a training schedule.
    pub fn resume(config: AgentConfig, store: ValueStore, training_phase: u64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        TdAgent {
            store,
            config,
            training_phase,
            rng,
        }
    }

    /// Construct with the table at `path`, or an empty one if it cannot be read.
    pub fn load(config: AgentConfig, path: &Path) -> Self {
        Self::with_store(config, ValueStore::load(path))
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        self.store.save(path)
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ValueStore {
        &mut self.store
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn mark(&self) -> Player {
        self.config.mark
    }

    pub fn training_phase(&self) -> u64 {
        self.training_phase
    }

    /// Called by the driver once per completed game.
    pub fn advance_training_phase(&mut self, by: u64) {
        self.training_phase = self.training_phase.saturating_add(by);
    }

    /// `max(min_epsilon, epsilon * decay^phase)`.
    pub fn effective_epsilon(&self) -> f64 {
        let decayed = self.config.epsilon
            * self.config.epsilon_decay.powf(self.training_phase as f64);
        decayed.max(self.config.min_epsilon)
    }

    /// Linearly annealed learning rate, never below `min_alpha`.
    pub fn effective_alpha(&self) -> f64 {
        let progress = if self.config.anneal_phases == 0 {
            0.0
        } else {
            (self.training_phase as f64 / self.config.anneal_phases as f64).min(1.0)
        };
        let annealed = self.config.alpha * (1.0 - self.config.alpha_anneal * progress);
        annealed.max(self.config.min_alpha.min(self.config.alpha))
    }

    pub fn value(&self, board: &Board) -> f64 {
        self.store.get(&StateKey::from(board))
    }

    pub fn reward_for(&self, outcome: GameOutcome) -> f64 {
        self.config.rewards.reward_for(outcome, self.config.mark)
    }

    /// Pick a position for `player` on `board`, exploring with the scheduled
    /// epsilon.
    ///
    /// Panics if `available` is empty or names an occupied cell.
    pub fn choose_action(&mut self, board: &Board, available: &[usize], player: Player) -> usize {
        let epsilon = self.effective_epsilon();
        self.choose_with_epsilon(board, available, player, epsilon)
    }

    fn choose_with_epsilon(
        &mut self,
        board: &Board,
        available: &[usize],
        player: Player,
        epsilon: f64,
    ) -> usize {
        assert!(!available.is_empty(), "choose_action called with no available positions");
        assert!(
            available.iter().all(|&p| board.is_empty_at(p)),
            "choose_action offered occupied positions {available:?} on {board}"
        );

        if self.rng.random_range(0.0..1.0) < epsilon {
            return available[self.rng.random_range(0..available.len())];
        }

        let best = self.greedy_candidates(board, available, player);
        if best.is_empty() {
            // Only reachable when every candidate value is NaN.
            return available[self.rng.random_range(0..available.len())];
        }
        best[self.rng.random_range(0..best.len())]
    }

    /// All positions whose resulting board has the highest stored value.
    pub fn greedy_candidates(&self, board: &Board, available: &[usize], player: Player) -> Vec<usize> {
        let mut best_value = f64::NEG_INFINITY;
        let mut best = Vec::new();
        for &pos in available {
            let value = self.value(&apply(board, pos, player));
            if value > best_value {
                best_value = value;
                best.clear();
                best.push(pos);
            } else if value == best_value {
                best.push(pos);
            }
        }
        best
    }

    /// Best stored value reachable by the agent's next move from `board`,
    /// or zero when no move is available.
    pub fn max_future_value(&self, board: &Board) -> f64 {
        let moves = board.available_moves();
        if moves.is_empty() {
            return 0.0;
        }
        moves
            .iter()
            .map(|&a| self.value(&apply(board, a, self.config.mark)))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// One-step TD update of the board the agent moved from.
    pub fn update(&mut self, old_board: &Board, reward: f64, new_board: &Board) -> TdUpdate {
        let key = StateKey::from(old_board);
        let alpha = self.effective_alpha();
        let max_future = self.max_future_value(new_board);

        let previous = self.store.get(&key);
        let target = reward + self.config.gamma * max_future;
        let td_error = target - previous;
        let updated = previous + alpha * td_error;
        self.store.set(key, updated);

        debug!(board = %key, previous, updated, reward, "value update");

        TdUpdate {
            key,
            previous,
            updated,
            target,
            td_error,
            alpha,
        }
    }
}

impl Agent for TdAgent {
    fn select_action(&mut self, state: &GameState, training: bool) -> usize {
        let epsilon = if training { self.effective_epsilon() } else { 0.0 };
        let available = state.legal_actions();
        self.choose_with_epsilon(state.board(), &available, state.current_player(), epsilon)
    }

    fn name(&self) -> &str {
        "TD"
    }
}
