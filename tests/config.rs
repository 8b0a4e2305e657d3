use std::path::Path;

use xo_learner::config::AppConfig;

#[test]
fn shipped_config_matches_defaults() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml");
    let shipped = AppConfig::load(&path).unwrap();
    let default = AppConfig::default();

    assert_eq!(shipped.agent.alpha, default.agent.alpha);
    assert_eq!(shipped.agent.min_alpha, default.agent.min_alpha);
    assert_eq!(shipped.agent.anneal_phases, default.agent.anneal_phases);
    assert_eq!(shipped.agent.epsilon_decay, default.agent.epsilon_decay);
    assert_eq!(shipped.agent.mark, default.agent.mark);
    assert_eq!(shipped.agent.rewards, default.agent.rewards);
    assert_eq!(shipped.training.num_games, default.training.num_games);
    assert_eq!(shipped.training.opponent, default.training.opponent);
    assert_eq!(shipped.training.store_path, default.training.store_path);
    assert_eq!(shipped.checkpoint.keep_last_n, default.checkpoint.keep_last_n);
    assert_eq!(shipped.play.agent_delay_ms, default.play.agent_delay_ms);
}

#[test]
fn generated_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generated.toml");
    std::fs::write(&path, AppConfig::default_toml()).unwrap();
    let config = AppConfig::load(&path).unwrap();
    assert_eq!(config.play.store_path, AppConfig::default().play.store_path);
}
