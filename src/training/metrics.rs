use std::collections::VecDeque;

use crate::training::episode::{AgentResult, EpisodeResult};

/// Compact per-game record kept in the rolling window.
#[derive(Debug, Clone, Copy)]
struct GameRecord {
    result: AgentResult,
    game_length: usize,
    td_error: Option<f64>,
}

/// Training metrics tracker with rolling window computations.
pub struct TrainingMetrics {
    records: VecDeque<GameRecord>,
    capacity: usize,
    total_episodes: u64, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn record_episode(&mut self, result: &EpisodeResult) {
        self.total_episodes += 1;
        self.records.push_back(GameRecord {
            result: result.agent_result,
            game_length: result.game_length,
            td_error: result.update.map(|u| u.td_error),
        });
        if self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    fn recent(&self, last_n: usize) -> impl Iterator<Item = &GameRecord> {
        self.records.iter().rev().take(last_n)
    }

    fn rate_of(&self, last_n: usize, result: AgentResult) -> f64 {
        let n = self.records.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let hits = self.recent(n).filter(|r| r.result == result).count();
        hits as f64 / n as f64
    }

    /// Agent win rate in the last N episodes.
    pub fn win_rate(&self, last_n: usize) -> f64 {
        self.rate_of(last_n, AgentResult::Win)
    }

    /// Draw rate in the last N episodes.
    pub fn draw_rate(&self, last_n: usize) -> f64 {
        self.rate_of(last_n, AgentResult::Draw)
    }

    /// Agent loss rate in the last N episodes.
    pub fn loss_rate(&self, last_n: usize) -> f64 {
        self.rate_of(last_n, AgentResult::Loss)
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f64 {
        let n = self.records.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self.recent(n).map(|r| r.game_length).sum();
        total as f64 / n as f64
    }

    /// Mean absolute TD error over the last N episodes that produced an update.
    pub fn average_td_error(&self, last_n: usize) -> f64 {
        let errors: Vec<f64> = self
            .recent(last_n)
            .filter_map(|r| r.td_error)
            .map(f64::abs)
            .collect();
        if errors.is_empty() {
            return 0.0;
        }
        errors.iter().sum::<f64>() / errors.len() as f64
    }

    pub fn total_episodes(&self) -> u64 {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{StateKey, TdUpdate};
    use crate::game::{Board, GameOutcome, Player};

    fn result(agent_result: AgentResult, game_length: usize, td_error: Option<f64>) -> EpisodeResult {
        let outcome = match agent_result {
            AgentResult::Win => GameOutcome::Winner(Player::O),
            AgentResult::Loss => GameOutcome::Winner(Player::X),
            AgentResult::Draw => GameOutcome::Draw,
        };
        EpisodeResult {
            outcome,
            agent_result,
            game_length,
            reward: 0.0,
            update: td_error.map(|e| TdUpdate {
                key: StateKey::from(Board::new()),
                previous: 0.0,
                updated: 0.0,
                target: e,
                td_error: e,
                alpha: 0.5,
            }),
        }
    }

    #[test]
    fn test_win_rate() {
        let mut m = TrainingMetrics::new();
        for _ in 0..7 {
            m.record_episode(&result(AgentResult::Win, 7, None));
        }
        for _ in 0..3 {
            m.record_episode(&result(AgentResult::Loss, 5, None));
        }
        assert!((m.win_rate(10) - 0.7).abs() < 1e-9);
        assert!((m.loss_rate(10) - 0.3).abs() < 1e-9);
        // Only the most recent three games
        assert_eq!(m.win_rate(3), 0.0);
    }

    #[test]
    fn test_draw_rate() {
        let mut m = TrainingMetrics::new();
        m.record_episode(&result(AgentResult::Draw, 9, None));
        m.record_episode(&result(AgentResult::Win, 6, None));
        assert!((m.draw_rate(10) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_average_game_length() {
        let mut m = TrainingMetrics::new();
        m.record_episode(&result(AgentResult::Draw, 9, None));
        m.record_episode(&result(AgentResult::Loss, 5, None));
        assert!((m.average_game_length(10) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_td_error_skips_games_without_update() {
        let mut m = TrainingMetrics::new();
        m.record_episode(&result(AgentResult::Win, 6, Some(0.5)));
        m.record_episode(&result(AgentResult::Loss, 5, Some(-1.5)));
        m.record_episode(&result(AgentResult::Loss, 5, None));
        assert!((m.average_td_error(10) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_is_capped() {
        let mut m = TrainingMetrics::with_capacity(2);
        m.record_episode(&result(AgentResult::Loss, 5, None));
        m.record_episode(&result(AgentResult::Win, 6, None));
        m.record_episode(&result(AgentResult::Win, 6, None));
        assert_eq!(m.total_episodes(), 3);
        assert_eq!(m.win_rate(100), 1.0);
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let m = TrainingMetrics::new();
        assert_eq!(m.win_rate(10), 0.0);
        assert_eq!(m.average_game_length(10), 0.0);
        assert_eq!(m.average_td_error(10), 0.0);
    }
}
