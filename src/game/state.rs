use serde::{Deserialize, Serialize};

use super::board::{self, Board};
use super::Player;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Player),
    Draw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    Occupied,
    InvalidPosition,
    GameOver,
    /// A driver was asked to move for the side that is not to play.
    OutOfTurn,
}

impl From<board::MoveError> for MoveError {
    fn from(e: board::MoveError) -> Self {
        match e {
            board::MoveError::Occupied => MoveError::Occupied,
            board::MoveError::InvalidPosition => MoveError::InvalidPosition,
        }
    }
}

/// The authoritative game: board, side to move and result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameState {
    board: Board,
    current_player: Player,
    outcome: Option<GameOutcome>,
    winning_line: Option<[usize; 3]>,
}

impl GameState {
    /// Create initial game state
    pub fn initial() -> Self {
        GameState {
            board: Board::new(),
            current_player: Player::X, // X starts
            outcome: None,
            winning_line: None,
        }
    }

    /// Get current player
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Get reference to board
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Get game outcome if game is over
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// The completed line, if the game was won.
    pub fn winning_line(&self) -> Option<[usize; 3]> {
        self.winning_line
    }

    /// Check if game is over
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Get list of empty positions, or none once the game is over
    pub fn legal_actions(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board.empty_positions()
    }

    /// Apply a move and return new state (immutable)
    pub fn apply_move(&self, position: usize) -> Result<GameState, MoveError> {
        let mut next = *self;
        next.apply_move_mut(position)?;
        Ok(next)
    }

    /// Apply move mutably (for UI efficiency)
    pub fn apply_move_mut(&mut self, position: usize) -> Result<(), MoveError> {
        if self.is_terminal() {
            return Err(MoveError::GameOver);
        }

        self.board
            .place(position, self.current_player.to_cell())?;

        if let Some((_, line)) = self.board.winning_line() {
            self.outcome = Some(GameOutcome::Winner(self.current_player));
            self.winning_line = Some(line);
        } else if self.board.is_full() {
            self.outcome = Some(GameOutcome::Draw);
        }

        self.current_player = self.current_player.other();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::Cell;

    fn play(moves: &[usize]) -> GameState {
        moves
            .iter()
            .fold(GameState::initial(), |s, &m| s.apply_move(m).unwrap())
    }

    #[test]
    fn test_initial_state() {
        let state = GameState::initial();
        assert_eq!(state.current_player(), Player::X);
        assert!(!state.is_terminal());
        assert_eq!(state.legal_actions().len(), 9);
    }

    #[test]
    fn test_apply_move() {
        let state = GameState::initial();
        let new_state = state.apply_move(4).unwrap();

        assert_eq!(new_state.current_player(), Player::O);
        assert_eq!(new_state.board().get(4), Cell::X);
        assert_eq!(state.board().get(4), Cell::Empty);
    }

    #[test]
    fn test_occupied_move_rejected() {
        let state = play(&[4]);
        assert_eq!(state.apply_move(4), Err(MoveError::Occupied));
        assert_eq!(state.apply_move(12), Err(MoveError::InvalidPosition));
    }

    #[test]
    fn test_top_row_win() {
        // X: 0, 1, 2   O: 3, 4
        let state = play(&[0, 3, 1, 4, 2]);
        assert!(state.is_terminal());
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::X)));
        assert_eq!(state.winning_line(), Some([0, 1, 2]));
        assert!(state.legal_actions().is_empty());
        assert_eq!(state.apply_move(5), Err(MoveError::GameOver));
    }

    #[test]
    fn test_diagonal_win_for_o() {
        // X: 3, 6, 1   O: 0, 4, 8
        let state = play(&[3, 0, 6, 4, 1, 8]);
        assert_eq!(state.outcome(), Some(GameOutcome::Winner(Player::O)));
        assert_eq!(state.winning_line(), Some([0, 4, 8]));
    }

    #[test]
    fn test_draw() {
        // X O X
        // X O O
        // O X X
        let state = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert!(state.is_terminal());
        assert_eq!(state.outcome(), Some(GameOutcome::Draw));
        assert_eq!(state.winning_line(), None);
    }
}
