use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{backend::Backend, Terminal};

use crate::ai::{AgentConfig, TdAgent, ValueStore};
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::game::{GameOutcome, MoveError, SIDE};
use crate::training::episode::{AgentResult, Episode, EpisodeResult};
use crate::training::session::Tally;

const CENTER: usize = 4;

/// Interactive game: a human against the learning agent, which keeps
/// learning from every finished game.
pub struct App {
    agent: TdAgent,
    episode: Episode,
    store_path: PathBuf,
    agent_delay: Duration,
    pending_agent_move: Option<Instant>,
    cursor: usize,
    games_played: u64,
    tally: Tally,
    last_result: Option<EpisodeResult>,
    should_quit: bool,
    message: Option<String>,
}

impl App {
    pub fn new(agent: TdAgent, store_path: PathBuf, agent_delay: Duration) -> Self {
        let episode = Episode::new(agent.mark());
        App {
            agent,
            episode,
            store_path,
            agent_delay,
            pending_agent_move: None,
            cursor: CENTER,
            games_played: 0,
            tally: Tally::default(),
            last_result: None,
            should_quit: false,
            message: None,
        }
    }

    /// Build the app from configuration, loading the agent's value table from
    /// `play.store_path`. A missing or unreadable table starts a fresh agent.
    pub fn from_config(config: &AppConfig) -> Self {
        let path = config.play.store_path.clone();
        let (store, message) = match ValueStore::try_load(&path) {
            Ok(store) => {
                let msg = format!("Loaded {} states from {}", store.len(), path.display());
                (store, msg)
            }
            Err(StoreError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                (ValueStore::new(), "No saved values yet, the agent starts fresh".to_string())
            }
            Err(e) => (ValueStore::new(), format!("Starting fresh: {e}")),
        };
        let agent = TdAgent::with_store(config.agent.clone(), store);
        let mut app = Self::new(
            agent,
            path,
            Duration::from_millis(config.play.agent_delay_ms),
        );
        app.message = Some(message);
        app
    }

    /// Main application loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            self.handle_events()?;
            self.tick(Instant::now());
        }
        Ok(())
    }

    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key.code, Instant::now());
                }
            }
        }
        Ok(())
    }

    /// Handle key press
    pub fn handle_key(&mut self, code: KeyCode, now: Instant) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Enter | KeyCode::Char(' ') => self.human_move(now),
            KeyCode::Char(c @ '1'..='9') => {
                self.cursor = c as usize - '1' as usize;
                self.human_move(now);
            }
            KeyCode::Char('r') => self.restart(),
            _ => {}
        }
    }

    fn move_cursor(&mut self, d_row: isize, d_col: isize) {
        let side = SIDE as isize;
        let row = (self.cursor / SIDE) as isize + d_row;
        let col = (self.cursor % SIDE) as isize + d_col;
        if (0..side).contains(&row) && (0..side).contains(&col) {
            self.cursor = (row * side + col) as usize;
        }
    }

    fn human_move(&mut self, now: Instant) {
        if self.episode.is_over() {
            self.message = Some("Game over! Press 'r' to play again.".to_string());
            return;
        }

        match self.episode.play_opponent(self.cursor) {
            Ok(()) => {
                self.message = None;
                if self.episode.is_over() {
                    self.finish_game();
                } else {
                    self.pending_agent_move = Some(now + self.agent_delay);
                }
            }
            Err(MoveError::Occupied) => {
                self.message = Some("That square is taken!".to_string());
            }
            Err(MoveError::InvalidPosition) => {
                self.message = Some("Invalid square!".to_string());
            }
            Err(MoveError::OutOfTurn) => {
                self.message = Some("Wait for the agent to move.".to_string());
            }
            Err(MoveError::GameOver) => {
                self.message = Some("Game is over!".to_string());
            }
        }
    }

    /// Advance time: plays the agent's move once it is due.
    pub fn tick(&mut self, now: Instant) {
        if !self.episode.agent_to_move() {
            self.pending_agent_move = None;
            return;
        }
        let due = *self
            .pending_agent_move
            .get_or_insert(now + self.agent_delay);
        if now < due {
            return;
        }
        self.pending_agent_move = None;

        match self.episode.play_agent(&mut self.agent, true) {
            Ok(position) => {
                self.cursor = position;
                if self.episode.is_over() {
                    self.finish_game();
                }
            }
            Err(e) => self.message = Some(format!("Agent error: {e}")),
        }
    }

    fn finish_game(&mut self) {
        let Some(result) = self.episode.finish(&mut self.agent, true) else {
            return;
        };
        self.agent.advance_training_phase(1);
        self.games_played += 1;
        self.tally.record(result.agent_result);

        let headline = match (result.outcome, result.agent_result) {
            (GameOutcome::Draw, _) => "It's a draw!".to_string(),
            (GameOutcome::Winner(p), AgentResult::Loss) => format!("You win as {}!", p.name()),
            (GameOutcome::Winner(p), _) => format!("The agent wins as {}!", p.name()),
        };
        self.message = Some(match self.agent.save(&self.store_path) {
            Ok(()) => format!("{headline} Press 'r' to play again."),
            Err(e) => format!("{headline} Could not save values: {e}"),
        });
        self.last_result = Some(result);
    }

    fn restart(&mut self) {
        self.episode = Episode::new(self.agent.mark());
        self.pending_agent_move = None;
        self.cursor = CENTER;
        self.message = Some("New game started!".to_string());
    }

    fn quit(&mut self) {
        if let Err(e) = self.agent.save(&self.store_path) {
            self.message = Some(format!("Could not save values: {e}"));
        }
        self.should_quit = true;
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn agent(&self) -> &TdAgent {
        &self.agent
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn games_played(&self) -> u64 {
        self.games_played
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn last_result(&self) -> Option<&EpisodeResult> {
        self.last_result.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn agent_thinking(&self) -> bool {
        self.pending_agent_move.is_some()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn render(&self, frame: &mut ratatui::Frame) {
        super::game_view::render(frame, self);
    }
}

impl Default for App {
    fn default() -> Self {
        App::new(
            TdAgent::new(AgentConfig::default()),
            PathBuf::from("xo_values.json"),
            Duration::from_millis(500),
        )
    }
}
