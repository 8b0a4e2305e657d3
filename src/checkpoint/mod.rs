//! Training checkpoints: value table plus schedule and session state, so a
//! run can be resumed where it stopped.

mod manager;
mod metadata;

pub use manager::{CheckpointConfig, CheckpointData, CheckpointManager};
pub use metadata::{CheckpointMetadata, CheckpointMetrics};
