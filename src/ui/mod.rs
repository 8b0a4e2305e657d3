//! Terminal UI for playing against the learning agent.

mod app;
mod game_view;

pub use app::App;
