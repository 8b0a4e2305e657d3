use std::path::PathBuf;

/// Errors that can occur while reading or writing a value table.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read value table {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write value table {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed value table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported value table version {0}")]
    UnsupportedVersion(u32),

    #[error("invalid board key {0:?}")]
    InvalidKey(String),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("value table error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("{player} selected illegal action {action} (legal: {legal:?})")]
    IllegalAction {
        player: String,
        action: usize,
        legal: Vec<usize>,
    },

    #[error("{0} asked to move out of turn")]
    OutOfTurn(String),

    #[error("game is already over")]
    GameOver,

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("value table error: {0}")]
    Store(#[from] StoreError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
