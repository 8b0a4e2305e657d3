//! # xo-learner
//!
//! Tic-tac-toe with a tabular temporal-difference learner. The agent keeps a
//! value per board it has seen, plays epsilon-greedily over those values, and
//! after each finished game pulls the value of its last pre-move board toward
//! the reward. A terminal UI lets a human play against it while it learns, and
//! a headless trainer runs it against scripted opponents.
//!
//! ## Modules
//!
//! - [`game`]: board, players, and the game state machine
//! - [`ai`]: the TD agent, its value store, and scripted opponents
//! - [`training`]: episode driver, resumable session, metrics, trainer
//! - [`checkpoint`]: value table and session persistence for resuming runs
//! - [`ui`]: the interactive terminal game
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
pub mod ui;
