use std::path::Path;

use xo_learner::ai::{AgentConfig, TdAgent, ValueStore};
use xo_learner::checkpoint::{CheckpointConfig, CheckpointManager};
use xo_learner::training::session::OpponentKind;
use xo_learner::training::trainer::{Trainer, TrainerConfig};

fn trainer(dir: &Path, games: u64, opponent: OpponentKind) -> Trainer {
    Trainer::new(
        TrainerConfig {
            num_games: games,
            opponent,
            log_interval: 100,
            eval_interval: 0,
            eval_games: 10,
            checkpoint_interval: 50,
            store_path: dir.join("values.json"),
            seed: Some(7),
            ..Default::default()
        },
        CheckpointConfig {
            checkpoint_dir: dir.join("checkpoints"),
            keep_last_n: 3,
        },
    )
}

fn agent_config() -> AgentConfig {
    AgentConfig {
        seed: Some(7),
        ..Default::default()
    }
}

#[test]
fn seeded_runs_are_reproducible() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();

    let mut stores = Vec::new();
    for dir in [a.path(), b.path()] {
        let trainer = trainer(dir, 200, OpponentKind::Random);
        let mut agent = TdAgent::new(agent_config());
        let mut session = trainer.new_session();
        trainer.train(&mut agent, &mut session).unwrap();
        stores.push(std::fs::read(dir.join("values.json")).unwrap());
    }
    assert_eq!(stores[0], stores[1]);
}

#[test]
fn exported_table_matches_agent_bit_for_bit() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = trainer(dir.path(), 150, OpponentKind::Random);
    let mut agent = TdAgent::new(agent_config());
    let mut session = trainer.new_session();
    trainer.train(&mut agent, &mut session).unwrap();

    let loaded = ValueStore::try_load(&dir.path().join("values.json")).unwrap();
    assert_eq!(loaded.len(), agent.store().len());
    for (key, value) in agent.store().iter() {
        assert_eq!(loaded.get(key).to_bits(), value.to_bits());
    }
}

#[test]
fn resume_continues_from_latest_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = trainer(dir.path(), 100, OpponentKind::Random);
    let mut agent = TdAgent::new(agent_config());
    let mut session = trainer.new_session();
    trainer.train(&mut agent, &mut session).unwrap();
    let first_run = agent.store().clone();

    let manager = CheckpointManager::new(CheckpointConfig {
        checkpoint_dir: dir.path().join("checkpoints"),
        keep_last_n: 3,
    });
    let data = manager.load_latest().unwrap();
    assert_eq!(data.metadata.games_played, 100);
    assert_eq!(&data.store, &first_run);

    let (mut resumed, mut session) = data.into_agent(agent_config());
    assert_eq!(resumed.training_phase(), 100);
    session.extend(100);

    let report = trainer.train(&mut resumed, &mut session).unwrap();
    assert_eq!(report.games_played, 200);
    assert_eq!(resumed.training_phase(), 200);
    assert_eq!(report.tally.total(), 200);
    for (key, _) in first_run.iter() {
        assert!(resumed.store().contains(key));
    }

    let latest = manager.load_latest().unwrap();
    assert_eq!(latest.metadata.games_played, 200);
    assert!(manager.list_checkpoints().unwrap().len() <= 3);
}

#[test]
fn trained_agent_never_beats_negamax() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = trainer(dir.path(), 100, OpponentKind::Negamax);
    let mut agent = TdAgent::new(agent_config());
    let mut session = trainer.new_session();

    let report = trainer.train(&mut agent, &mut session).unwrap();
    assert_eq!(report.tally.wins, 0);
    assert_eq!(report.evaluation.vs_negamax.wins, 0);
    assert!(!agent.store().is_empty());
}
