use std::path::{Path, PathBuf};

use tracing::warn;

use crate::ai::AgentConfig;
use crate::checkpoint::CheckpointConfig;
use crate::error::ConfigError;
use crate::training::trainer::TrainerConfig;

/// Settings for the interactive game.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayConfig {
    /// Value table loaded at startup and saved after every game.
    pub store_path: PathBuf,
    /// Delay before the agent answers a human move.
    pub agent_delay_ms: u64,
}

impl Default for PlayConfig {
    fn default() -> Self {
        PlayConfig {
            store_path: PathBuf::from("xo_values.json"),
            agent_delay_ms: 500,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointConfig,
    pub play: PlayConfig,
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.agent;
        if !(a.alpha > 0.0 && a.alpha <= 1.0) {
            return Err(invalid("agent.alpha must be in (0, 1]"));
        }
        if !(a.min_alpha > 0.0 && a.min_alpha <= a.alpha) {
            return Err(invalid("agent.min_alpha must be in (0, agent.alpha]"));
        }
        if !(0.0..=1.0).contains(&a.alpha_anneal) {
            return Err(invalid("agent.alpha_anneal must be in [0, 1]"));
        }
        if !(a.gamma > 0.0 && a.gamma <= 1.0) {
            return Err(invalid("agent.gamma must be in (0, 1]"));
        }
        if !(0.0..=1.0).contains(&a.epsilon) {
            return Err(invalid("agent.epsilon must be in [0, 1]"));
        }
        if !(a.epsilon_decay > 0.0 && a.epsilon_decay <= 1.0) {
            return Err(invalid("agent.epsilon_decay must be in (0, 1]"));
        }
        if !(a.min_epsilon >= 0.0 && a.min_epsilon <= a.epsilon) {
            return Err(invalid("agent.min_epsilon must be in [0, agent.epsilon]"));
        }

        let r = &a.rewards;
        if !(r.win.is_finite() && r.draw.is_finite() && r.loss.is_finite()) {
            return Err(invalid("agent.rewards must be finite"));
        }
        if !(r.loss < r.draw && r.draw < r.win) {
            return Err(invalid("agent.rewards must satisfy loss < draw < win"));
        }

        let t = &self.training;
        if t.num_games == 0 {
            return Err(invalid("training.num_games must be > 0"));
        }
        if t.training_strength == 0 {
            return Err(invalid("training.training_strength must be > 0"));
        }
        if t.log_interval == 0 {
            return Err(invalid("training.log_interval must be > 0"));
        }
        if t.eval_games == 0 {
            return Err(invalid("training.eval_games must be > 0"));
        }

        if self.checkpoint.keep_last_n == 0 {
            return Err(invalid("checkpoint.keep_last_n must be >= 1"));
        }

        Ok(())
    }

    /// Generate a TOML string with all default values (useful for creating
    /// example config files).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Player;
    use crate::training::session::OpponentKind;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().expect("default config should be valid");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[agent]
alpha = 0.5

[agent.rewards]
draw = 0.5
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!((config.agent.alpha - 0.5).abs() < 1e-12);
        assert!((config.agent.rewards.draw - 0.5).abs() < 1e-12);
        // Other fields should be defaults
        assert!((config.agent.gamma - 0.9).abs() < 1e-12);
        assert_eq!(config.agent.rewards.win, 1.0);
        assert_eq!(config.training.num_games, 10_000);
        assert_eq!(config.play.agent_delay_ms, 500);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(config.agent.alpha, default.agent.alpha);
        assert_eq!(config.agent.mark, Player::O);
        assert_eq!(config.training.opponent, OpponentKind::Random);
        assert_eq!(config.checkpoint.keep_last_n, default.checkpoint.keep_last_n);
    }

    #[test]
    fn test_opponent_and_mark_parse_from_toml() {
        let toml_str = r#"
[agent]
mark = "X"

[training]
opponent = "negamax"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.agent.mark, Player::X);
        assert_eq!(config.training.opponent, OpponentKind::Negamax);
    }

    #[test]
    fn test_validation_rejects_bad_alpha() {
        let mut config = AppConfig::default();
        config.agent.alpha = 0.0;
        assert!(config.validate().is_err());
        config.agent.alpha = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_min_alpha_above_alpha() {
        let mut config = AppConfig::default();
        config.agent.alpha = 0.1;
        config.agent.min_alpha = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_gamma() {
        let mut config = AppConfig::default();
        config.agent.gamma = 1.5;
        assert!(config.validate().is_err());
        config.agent.gamma = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_epsilon_out_of_range() {
        let mut config = AppConfig::default();
        config.agent.epsilon = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_min_epsilon_above_epsilon() {
        let mut config = AppConfig::default();
        config.agent.epsilon = 0.1;
        config.agent.min_epsilon = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_decay() {
        let mut config = AppConfig::default();
        config.agent.epsilon_decay = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_misordered_rewards() {
        let mut config = AppConfig::default();
        config.agent.rewards.draw = 2.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.agent.rewards.win = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_games() {
        let mut config = AppConfig::default();
        config.training.num_games = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_strength_and_interval() {
        let mut config = AppConfig::default();
        config.training.training_strength = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.training.log_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_eval_and_checkpoint_intervals_are_allowed() {
        let mut config = AppConfig::default();
        config.training.eval_interval = 0;
        config.training.checkpoint_interval = 0;
        config.validate().unwrap();
    }

    #[test]
    fn test_validation_rejects_keep_zero_checkpoints() {
        let mut config = AppConfig::default();
        config.checkpoint.keep_last_n = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = AppConfig::load_or_default(Path::new("nonexistent_config.toml")).unwrap();
        assert_eq!(config.training.num_games, 10_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
num_games = 500

[play]
agent_delay_ms = 0
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.num_games, 500);
        assert_eq!(config.play.agent_delay_ms, 0);
        // Others are defaults
        assert!((config.agent.alpha - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[agent]\ngamma = 2.0\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));

        std::fs::write(&path, "[agent\n").unwrap();
        assert!(matches!(AppConfig::load(&path), Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[agent.rewards]"));
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
    }
}
