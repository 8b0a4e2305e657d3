use serde::{Deserialize, Serialize};

use crate::ai::{Agent, TdAgent, TdUpdate};
use crate::error::TrainingError;
use crate::game::{Board, GameOutcome, GameState, MoveError, Player};

/// Game result from the learning agent's side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentResult {
    Win,
    Loss,
    Draw,
}

impl AgentResult {
    pub fn from_outcome(outcome: GameOutcome, agent: Player) -> Self {
        match outcome {
            GameOutcome::Winner(p) if p == agent => AgentResult::Win,
            GameOutcome::Winner(_) => AgentResult::Loss,
            GameOutcome::Draw => AgentResult::Draw,
        }
    }
}

/// Result of a single finished game.
#[derive(Debug, Clone)]
pub struct EpisodeResult {
    pub outcome: GameOutcome,
    pub agent_result: AgentResult,
    pub game_length: usize,
    pub reward: f64,
    /// Present when the agent moved at least once and learning was on.
    pub update: Option<TdUpdate>,
}

/// One game between the learning agent and some other player, advanced one
/// move at a time.
///
/// The episode remembers the board the agent last moved from; when the game
/// ends, [`Episode::finish`] credits that board with the terminal reward.
#[derive(Debug, Clone)]
pub struct Episode {
    state: GameState,
    agent_mark: Player,
    last_agent_board: Option<Board>,
    moves: usize,
    finished: bool,
}

impl Episode {
    pub fn new(agent_mark: Player) -> Self {
        Episode {
            state: GameState::initial(),
            agent_mark,
            last_agent_board: None,
            moves: 0,
            finished: false,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn agent_mark(&self) -> Player {
        self.agent_mark
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn is_over(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn agent_to_move(&self) -> bool {
        !self.is_over() && self.state.current_player() == self.agent_mark
    }

    /// Let the agent move. `training` enables exploration.
    pub fn play_agent(&mut self, agent: &mut TdAgent, training: bool) -> Result<usize, TrainingError> {
        if !self.agent_to_move() {
            return Err(TrainingError::OutOfTurn(agent.mark().name().to_string()));
        }
        let before = *self.state.board();
        let position = agent.select_action(&self.state, training);
        self.apply(position, agent.name())?;
        self.last_agent_board = Some(before);
        Ok(position)
    }

    /// Apply a move for the other side, e.g. from a human or scripted opponent.
    pub fn play_opponent(&mut self, position: usize) -> Result<(), MoveError> {
        if self.agent_to_move() {
            return Err(MoveError::OutOfTurn);
        }
        self.state.apply_move_mut(position)?;
        self.moves += 1;
        Ok(())
    }

    /// Advance by exactly one move, whoever is to play.
    pub fn step(
        &mut self,
        agent: &mut TdAgent,
        opponent: &mut dyn Agent,
        training: bool,
    ) -> Result<usize, TrainingError> {
        if self.is_over() {
            return Err(TrainingError::GameOver);
        }
        if self.agent_to_move() {
            return self.play_agent(agent, training);
        }
        let position = opponent.select_action(&self.state, training);
        self.apply(position, opponent.name())?;
        Ok(position)
    }

    fn apply(&mut self, position: usize, who: &str) -> Result<(), TrainingError> {
        let legal = self.state.legal_actions();
        self.state
            .apply_move_mut(position)
            .map_err(|_| TrainingError::IllegalAction {
                player: who.to_string(),
                action: position,
                legal,
            })?;
        self.moves += 1;
        Ok(())
    }

    /// Close out a finished game: compute the agent's reward and, when
    /// `learn` is set, apply the terminal value update. Returns `None` while
    /// the game is still running or if it was already closed.
    pub fn finish(&mut self, agent: &mut TdAgent, learn: bool) -> Option<EpisodeResult> {
        let outcome = self.state.outcome()?;
        if self.finished {
            return None;
        }
        self.finished = true;

        let reward = agent.reward_for(outcome);
        let update = match (learn, self.last_agent_board) {
            (true, Some(before)) => Some(agent.update(&before, reward, self.state.board())),
            _ => None,
        };

        Some(EpisodeResult {
            outcome,
            agent_result: AgentResult::from_outcome(outcome, self.agent_mark),
            game_length: self.moves,
            reward,
            update,
        })
    }
}

/// Win/draw/loss counts from an evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
}

impl EvalReport {
    pub fn record(&mut self, result: AgentResult) {
        self.games += 1;
        match result {
            AgentResult::Win => self.wins += 1,
            AgentResult::Draw => self.draws += 1,
            AgentResult::Loss => self.losses += 1,
        }
    }

    fn rate(&self, n: usize) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        n as f64 / self.games as f64
    }

    pub fn win_rate(&self) -> f64 {
        self.rate(self.wins)
    }

    pub fn draw_rate(&self) -> f64 {
        self.rate(self.draws)
    }

    pub fn loss_rate(&self) -> f64 {
        self.rate(self.losses)
    }
}

/// Play a single game between two agents without exploration.
pub fn play_eval_game(
    agent: &mut dyn Agent,
    agent_mark: Player,
    opponent: &mut dyn Agent,
) -> Result<AgentResult, TrainingError> {
    let mut state = GameState::initial();

    while !state.is_terminal() {
        let (mover, name) = if state.current_player() == agent_mark {
            let name = agent.name().to_string();
            (agent.select_action(&state, false), name)
        } else {
            let name = opponent.name().to_string();
            (opponent.select_action(&state, false), name)
        };
        let legal = state.legal_actions();
        state = state
            .apply_move(mover)
            .map_err(|_| TrainingError::IllegalAction {
                player: name,
                action: mover,
                legal,
            })?;
    }

    let outcome = state.outcome().ok_or(TrainingError::GameOver)?;
    Ok(AgentResult::from_outcome(outcome, agent_mark))
}

/// Evaluate an agent against an opponent over `games` games.
pub fn evaluate(
    agent: &mut dyn Agent,
    agent_mark: Player,
    opponent: &mut dyn Agent,
    games: usize,
) -> Result<EvalReport, TrainingError> {
    let mut report = EvalReport::default();
    for _ in 0..games {
        report.record(play_eval_game(agent, agent_mark, opponent)?);
    }
    Ok(report)
}

/// Derive a deterministic seed for a given game index.
pub fn episode_seed(base_seed: u64, episode_index: u64) -> u64 {
    // FNV-1a style mixing
    let mut hash = base_seed ^ 0x517cc1b727220a95;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= episode_index;
    hash = hash.wrapping_mul(0x100000001b3);
    hash ^= episode_index >> 32;
    hash
}
