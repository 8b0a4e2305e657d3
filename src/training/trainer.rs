use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::{NegamaxAgent, RandomAgent, TdAgent};
use crate::checkpoint::{CheckpointConfig, CheckpointManager, CheckpointMetrics};
use crate::error::TrainingError;
use crate::training::episode::{episode_seed, evaluate, EvalReport};
use crate::training::metrics::TrainingMetrics;
use crate::training::session::{OpponentKind, SessionStep, Tally, TrainingSession};

/// Trainer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub num_games: u64,
    /// Training-phase increment per finished game.
    pub training_strength: u64,
    pub opponent: OpponentKind,
    pub log_interval: u64,
    /// Games between evaluations; 0 disables periodic evaluation.
    pub eval_interval: u64,
    pub eval_games: usize,
    /// Games between checkpoints; 0 disables periodic checkpoints.
    pub checkpoint_interval: u64,
    /// Where the final value table is exported.
    pub store_path: PathBuf,
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            num_games: 10_000,
            training_strength: 1,
            opponent: OpponentKind::Random,
            log_interval: 1000,
            eval_interval: 5000,
            eval_games: 200,
            checkpoint_interval: 5000,
            store_path: PathBuf::from("xo_values.json"),
            seed: None,
        }
    }
}

/// Greedy results against both scripted opponents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Evaluation {
    pub vs_random: EvalReport,
    pub vs_negamax: EvalReport,
}

/// Summary of a finished [`Trainer::train`] call.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub games_played: u64,
    pub tally: Tally,
    pub states: usize,
    pub evaluation: Evaluation,
    pub checkpoint: Option<PathBuf>,
}

/// Runs a [`TrainingSession`] to completion against a scripted opponent.
pub struct Trainer {
    config: TrainerConfig,
    checkpoint_manager: CheckpointManager,
}

impl Trainer {
    pub fn new(config: TrainerConfig, checkpoint: CheckpointConfig) -> Self {
        Trainer {
            config,
            checkpoint_manager: CheckpointManager::new(checkpoint),
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Fresh session sized from the configuration.
    pub fn new_session(&self) -> TrainingSession {
        TrainingSession::new(self.config.num_games, self.config.training_strength)
    }

    /// Run the training loop until the session is finished.
    pub fn train(
        &self,
        agent: &mut TdAgent,
        session: &mut TrainingSession,
    ) -> Result<TrainingReport, TrainingError> {
        let window = self.config.log_interval.max(1) as usize;
        let mut metrics = TrainingMetrics::with_capacity(window);
        let seed = self.config.seed.map(|s| episode_seed(s, session.games_played));
        let mut opponent = self.config.opponent.build(seed);

        info!(
            games = session.remaining(),
            start = session.games_played,
            opponent = opponent.name(),
            phase = agent.training_phase(),
            "starting TD training"
        );

        while !session.is_finished() {
            let result = match session.step(agent, opponent.as_mut())? {
                SessionStep::Moved { .. } => continue,
                SessionStep::Idle => break,
                SessionStep::GameFinished(result) => result,
            };
            metrics.record_episode(&result);
            debug!(
                game = session.games_played,
                result = ?result.agent_result,
                length = result.game_length,
                "game finished"
            );

            let games = session.games_played;
            if games % self.config.log_interval.max(1) == 0 {
                info!(
                    game = games,
                    target = session.games_target,
                    epsilon = %format!("{:.3}", agent.effective_epsilon()),
                    alpha = %format!("{:.3}", agent.effective_alpha()),
                    win = %format!("{:.1}%", metrics.win_rate(window) * 100.0),
                    draw = %format!("{:.1}%", metrics.draw_rate(window) * 100.0),
                    loss = %format!("{:.1}%", metrics.loss_rate(window) * 100.0),
                    avg_len = %format!("{:.1}", metrics.average_game_length(window)),
                    td_error = %format!("{:.4}", metrics.average_td_error(window)),
                    states = agent.store().len(),
                    "training progress"
                );
            }

            if self.config.eval_interval > 0 && games % self.config.eval_interval == 0 {
                let eval = self.evaluate(agent, games)?;
                log_evaluation(&eval, self.config.eval_games);
            }

            if self.config.checkpoint_interval > 0 && games % self.config.checkpoint_interval == 0 {
                self.checkpoint(agent, session, &metrics, window);
            }
        }

        let evaluation = self.evaluate(agent, session.games_played)?;
        log_evaluation(&evaluation, self.config.eval_games);
        let checkpoint = self.checkpoint(agent, session, &metrics, window);

        agent.save(&self.config.store_path)?;
        info!(
            path = %self.config.store_path.display(),
            states = agent.store().len(),
            games = session.games_played,
            "training complete, value table exported"
        );

        Ok(TrainingReport {
            games_played: session.games_played,
            tally: session.tally,
            states: agent.store().len(),
            evaluation,
            checkpoint,
        })
    }

    /// Play `eval_games` greedy games against each scripted opponent. The
    /// agent does not learn from these games.
    pub fn evaluate(&self, agent: &mut TdAgent, games_played: u64) -> Result<Evaluation, TrainingError> {
        let mark = agent.mark();
        let (mut random, mut negamax) = match self.config.seed {
            Some(s) => {
                let base = episode_seed(s, games_played);
                (RandomAgent::seeded(base), NegamaxAgent::seeded(base.wrapping_add(1)))
            }
            None => (RandomAgent::new(), NegamaxAgent::new()),
        };
        Ok(Evaluation {
            vs_random: evaluate(&mut *agent, mark, &mut random, self.config.eval_games)?,
            vs_negamax: evaluate(&mut *agent, mark, &mut negamax, self.config.eval_games)?,
        })
    }

    fn checkpoint(
        &self,
        agent: &TdAgent,
        session: &TrainingSession,
        metrics: &TrainingMetrics,
        window: usize,
    ) -> Option<PathBuf> {
        let snapshot = CheckpointMetrics {
            win_rate: metrics.win_rate(window),
            draw_rate: metrics.draw_rate(window),
            loss_rate: metrics.loss_rate(window),
            average_game_length: metrics.average_game_length(window),
            average_td_error: metrics.average_td_error(window),
            states: agent.store().len(),
        };
        match self.checkpoint_manager.save_checkpoint(agent, session, &snapshot) {
            Ok(path) => {
                info!(path = %path.display(), "checkpoint saved");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "checkpoint failed");
                None
            }
        }
    }
}

fn log_evaluation(eval: &Evaluation, games: usize) {
    info!(
        games,
        vs_random_win = %format!("{:.1}%", eval.vs_random.win_rate() * 100.0),
        vs_random_loss = %format!("{:.1}%", eval.vs_random.loss_rate() * 100.0),
        vs_negamax_draw = %format!("{:.1}%", eval.vs_negamax.draw_rate() * 100.0),
        vs_negamax_loss = %format!("{:.1}%", eval.vs_negamax.loss_rate() * 100.0),
        "evaluation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AgentConfig, ValueStore};

    fn trainer(dir: &std::path::Path, num_games: u64) -> Trainer {
        Trainer::new(
            TrainerConfig {
                num_games,
                log_interval: 50,
                eval_interval: 100,
                eval_games: 20,
                checkpoint_interval: 100,
                store_path: dir.join("values.json"),
                seed: Some(9),
                ..Default::default()
            },
            CheckpointConfig {
                checkpoint_dir: dir.join("checkpoints"),
                keep_last_n: 2,
            },
        )
    }

    fn agent() -> TdAgent {
        TdAgent::new(AgentConfig {
            seed: Some(5),
            ..Default::default()
        })
    }

    #[test]
    fn test_train_runs_all_games_and_exports_store() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 300);
        let mut agent = agent();
        let mut session = trainer.new_session();

        let report = trainer.train(&mut agent, &mut session).unwrap();
        assert_eq!(report.games_played, 300);
        assert_eq!(report.tally.total(), 300);
        assert_eq!(agent.training_phase(), 300);
        assert_eq!(report.evaluation.vs_random.games, 20);
        assert_eq!(report.evaluation.vs_negamax.wins, 0);

        let exported = ValueStore::try_load(&dir.path().join("values.json")).unwrap();
        assert_eq!(&exported, agent.store());
        assert_eq!(exported.len(), report.states);
    }

    #[test]
    fn test_train_writes_and_prunes_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 300);
        let mut agent = agent();
        let mut session = trainer.new_session();

        let report = trainer.train(&mut agent, &mut session).unwrap();
        assert!(report.checkpoint.is_some());

        let manager = CheckpointManager::new(CheckpointConfig {
            checkpoint_dir: dir.path().join("checkpoints"),
            keep_last_n: 2,
        });
        let list = manager.list_checkpoints().unwrap();
        let games: Vec<u64> = list.iter().map(|(_, m)| m.games_played).collect();
        assert_eq!(games, vec![200, 300]);

        let latest = manager.load_latest().unwrap();
        assert_eq!(latest.metadata.training_phase, 300);
        assert_eq!(latest.metadata.session.games_played, 300);
    }

    #[test]
    fn test_evaluation_does_not_learn() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 10);
        let mut agent = agent();

        let eval = trainer.evaluate(&mut agent, 0).unwrap();
        assert_eq!(eval.vs_random.games, 20);
        assert_eq!(eval.vs_negamax.games, 20);
        assert!(agent.store().is_empty());
        assert_eq!(agent.training_phase(), 0);
    }

    #[test]
    fn test_finished_session_trains_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = trainer(dir.path(), 10);
        let mut agent = agent();
        let mut session = TrainingSession::new(0, 1);

        let report = trainer.train(&mut agent, &mut session).unwrap();
        assert_eq!(report.games_played, 0);
        assert_eq!(agent.training_phase(), 0);
    }
}
