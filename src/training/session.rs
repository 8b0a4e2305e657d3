use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ai::{Agent, NegamaxAgent, RandomAgent, TdAgent};
use crate::error::TrainingError;
use crate::game::Player;
use crate::training::episode::{AgentResult, Episode, EpisodeResult};

/// Scripted opponent the agent trains against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    Random,
    Negamax,
}

impl OpponentKind {
    pub fn build(self, seed: Option<u64>) -> Box<dyn Agent> {
        match (self, seed) {
            (OpponentKind::Random, Some(s)) => Box::new(RandomAgent::seeded(s)),
            (OpponentKind::Random, None) => Box::new(RandomAgent::new()),
            (OpponentKind::Negamax, Some(s)) => Box::new(NegamaxAgent::seeded(s)),
            (OpponentKind::Negamax, None) => Box::new(NegamaxAgent::new()),
        }
    }
}

impl std::str::FromStr for OpponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentKind::Random),
            "negamax" | "minimax" | "perfect" => Ok(OpponentKind::Negamax),
            other => Err(format!(
                "unknown opponent '{other}' (expected 'random' or 'negamax')"
            )),
        }
    }
}

/// Lifetime win/draw/loss counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
}

impl Tally {
    pub fn record(&mut self, result: AgentResult) {
        match result {
            AgentResult::Win => self.wins += 1,
            AgentResult::Draw => self.draws += 1,
            AgentResult::Loss => self.losses += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.wins + self.draws + self.losses
    }
}

/// What a single [`TrainingSession::step`] did.
#[derive(Debug, Clone)]
pub enum SessionStep {
    /// One move was played; the game continues.
    Moved { player: Player, position: usize },
    /// A move ended the game and the agent has learned from it.
    GameFinished(EpisodeResult),
    /// The session has nothing left to do.
    Idle,
}

/// Progress of a training run, advanced one move per [`step`](Self::step).
///
/// All counters live here rather than in the host, so a host can drive
/// training from a loop, a timer, or a test, and can persist the session to
/// resume later. The game in progress is not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSession {
    pub games_target: u64,
    pub games_played: u64,
    /// Training-phase increment applied to the agent per finished game.
    pub training_strength: u64,
    pub stop_requested: bool,
    pub tally: Tally,
    #[serde(skip)]
    current: Option<Episode>,
}

impl TrainingSession {
    pub fn new(games_target: u64, training_strength: u64) -> Self {
        TrainingSession {
            games_target,
            games_played: 0,
            training_strength,
            stop_requested: false,
            tally: Tally::default(),
            current: None,
        }
    }

    /// Schedule `games` more games, e.g. when resuming.
    pub fn extend(&mut self, games: u64) {
        self.games_target = self.games_played + games;
        self.stop_requested = false;
    }

    /// Ask the session to stop; the game in progress is abandoned without
    /// learning on the next step.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub fn is_finished(&self) -> bool {
        self.stop_requested || self.games_played >= self.games_target
    }

    pub fn remaining(&self) -> u64 {
        self.games_target.saturating_sub(self.games_played)
    }

    pub fn current_episode(&self) -> Option<&Episode> {
        self.current.as_ref()
    }

    /// Play one move of the current game, starting a new game if needed.
    pub fn step(
        &mut self,
        agent: &mut TdAgent,
        opponent: &mut dyn Agent,
    ) -> Result<SessionStep, TrainingError> {
        if self.stop_requested {
            if self.current.take().is_some() {
                debug!(games = self.games_played, "abandoned game in progress");
            }
            return Ok(SessionStep::Idle);
        }

        if self.current.is_none() {
            if self.games_played >= self.games_target {
                return Ok(SessionStep::Idle);
            }
            self.current = Some(Episode::new(agent.mark()));
        }
        let Some(episode) = self.current.as_mut() else {
            return Ok(SessionStep::Idle);
        };

        let player = episode.state().current_player();
        let position = episode.step(agent, opponent, true)?;
        if !episode.is_over() {
            return Ok(SessionStep::Moved { player, position });
        }

        let Some(result) = episode.finish(agent, true) else {
            return Err(TrainingError::GameOver);
        };
        self.current = None;
        agent.advance_training_phase(self.training_strength);
        self.games_played += 1;
        self.tally.record(result.agent_result);

        Ok(SessionStep::GameFinished(result))
    }

    /// Step until the current game ends. Returns `None` if the session is
    /// finished.
    pub fn play_game(
        &mut self,
        agent: &mut TdAgent,
        opponent: &mut dyn Agent,
    ) -> Result<Option<EpisodeResult>, TrainingError> {
        loop {
            match self.step(agent, opponent)? {
                SessionStep::Moved { .. } => continue,
                SessionStep::GameFinished(result) => return Ok(Some(result)),
                SessionStep::Idle => return Ok(None),
            }
        }
    }
}
