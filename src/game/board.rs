use std::fmt;
use std::str::FromStr;

pub const SIDE: usize = 3;
pub const CELLS: usize = SIDE * SIDE;

/// Every three-in-a-row, as board indices.
pub const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cell {
    Empty,
    X,
    O,
}

impl Cell {
    /// Character used in the textual board encoding.
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }

    pub fn from_symbol(c: char) -> Option<Cell> {
        match c {
            '.' | ' ' | '-' => Some(Cell::Empty),
            'X' | 'x' => Some(Cell::X),
            'O' | 'o' => Some(Cell::O),
            _ => None,
        }
    }
}

/// A 3x3 board, indexed `row * 3 + col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Cell; CELLS],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    Occupied,
    InvalidPosition,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [Cell::Empty; CELLS],
        }
    }

    pub fn from_cells(cells: [Cell; CELLS]) -> Self {
        Board { cells }
    }

    pub fn cells(&self) -> &[Cell; CELLS] {
        &self.cells
    }

    /// Get the cell at a position
    pub fn get(&self, position: usize) -> Cell {
        self.cells[position]
    }

    pub fn is_empty_at(&self, position: usize) -> bool {
        position < CELLS && self.cells[position] == Cell::Empty
    }

    /// Put a mark on the live board.
    pub fn place(&mut self, position: usize, cell: Cell) -> Result<(), MoveError> {
        if position >= CELLS {
            return Err(MoveError::InvalidPosition);
        }
        if self.cells[position] != Cell::Empty {
            return Err(MoveError::Occupied);
        }
        self.cells[position] = cell;
        Ok(())
    }

    /// Return a copy of this board with `mark` at `position`.
    ///
    /// Panics if the position is off the board or already occupied; callers
    /// only simulate moves on cells they know to be empty.
    pub fn apply(&self, position: usize, mark: Cell) -> Board {
        assert!(
            self.is_empty_at(position),
            "cannot simulate a move on occupied or invalid position {position}"
        );
        let mut next = *self;
        next.cells[position] = mark;
        next
    }

    /// Indices of all empty cells, ascending.
    pub fn empty_positions(&self) -> Vec<usize> {
        (0..CELLS)
            .filter(|&i| self.cells[i] == Cell::Empty)
            .collect()
    }

    /// Positions a player could still move to. A board with a completed line
    /// has none.
    pub fn available_moves(&self) -> Vec<usize> {
        if self.winning_line().is_some() {
            return Vec::new();
        }
        self.empty_positions()
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != Cell::Empty)
    }

    /// First completed line and the mark that completed it.
    pub fn winning_line(&self) -> Option<(Cell, [usize; 3])> {
        WIN_LINES.iter().find_map(|&line| {
            let [a, b, c] = line;
            let cell = self.cells[a];
            if cell != Cell::Empty && cell == self.cells[b] && cell == self.cells[c] {
                Some((cell, line))
            } else {
                None
            }
        })
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.cells {
            write!(f, "{}", c.symbol())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBoardError(pub String);

impl fmt::Display for ParseBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid board encoding {:?}", self.0)
    }
}

impl std::error::Error for ParseBoardError {}

impl FromStr for Board {
    type Err = ParseBoardError;

    /// Parse nine cell symbols; `.`, `-` and space are empty.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let symbols: Vec<char> = s.chars().collect();
        if symbols.len() != CELLS {
            return Err(ParseBoardError(s.to_string()));
        }
        let mut cells = [Cell::Empty; CELLS];
        for (slot, &c) in cells.iter_mut().zip(&symbols) {
            *slot = Cell::from_symbol(c).ok_or_else(|| ParseBoardError(s.to_string()))?;
        }
        Ok(Board { cells })
    }
}
