//! Training infrastructure: the per-game episode driver, the resumable
//! training session, rolling metrics, and the batch trainer.

pub mod episode;
pub mod metrics;
pub mod session;
pub mod trainer;
