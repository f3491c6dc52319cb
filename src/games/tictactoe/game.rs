//! Tic-tac-toe rules.

use serde::{Deserialize, Serialize};

use crate::core::PlayerId;
use crate::rules::{Game, GameResult, PolicyGrid};

/// Number of distinct positions reachable from the empty board,
/// terminal positions included.
pub const REACHABLE_POSITIONS: usize = 5478;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Contents of one square.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Taken(PlayerId),
}

/// Board position. The player to move is implied by the piece count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Cell; 9],
}

impl Board {
    /// Empty board, X to move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a 9-character row-major string of `X`, `O`
    /// and `.`/`-`/space. Panics on any other character or length.
    ///
    /// ```
    /// use mcts_graph::games::tictactoe::Board;
    ///
    /// let board = Board::from_str_grid("XX.OO....");
    /// assert_eq!(board.piece_count(), 4);
    /// ```
    pub fn from_str_grid(grid: &str) -> Self {
        let chars: Vec<char> = grid.chars().collect();
        assert_eq!(chars.len(), 9, "Board grid must have 9 cells");

        let mut board = Self::new();
        for (i, c) in chars.into_iter().enumerate() {
            board.cells[i] = match c {
                'X' | 'x' => Cell::Taken(PlayerId::FIRST),
                'O' | 'o' => Cell::Taken(PlayerId::SECOND),
                '.' | '-' | ' ' => Cell::Empty,
                other => panic!("Invalid board character: {other:?}"),
            };
        }
        board
    }

    /// Contents of a cell.
    #[must_use]
    pub fn cell(&self, index: usize) -> Cell {
        self.cells[index]
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != Cell::Empty).count()
    }

    /// Player to move.
    #[must_use]
    pub fn to_move(&self) -> PlayerId {
        if self.piece_count() % 2 == 0 {
            PlayerId::FIRST
        } else {
            PlayerId::SECOND
        }
    }

    /// Owner of a completed line, if any.
    #[must_use]
    pub fn line_owner(&self) -> Option<PlayerId> {
        LINES.iter().find_map(|&[a, b, c]| match self.cells[a] {
            Cell::Taken(p) if self.cells[b] == self.cells[a] && self.cells[c] == self.cells[a] => {
                Some(p)
            }
            _ => None,
        })
    }

    fn with_move(&self, index: usize) -> Self {
        debug_assert_eq!(self.cells[index], Cell::Empty, "cell {index} is occupied");
        let mut next = self.clone();
        next.cells[index] = Cell::Taken(self.to_move());
        next
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..3 {
            for col in 0..3 {
                let c = match self.cells[row * 3 + col] {
                    Cell::Empty => '.',
                    Cell::Taken(PlayerId(0)) => 'X',
                    Cell::Taken(_) => 'O',
                };
                write!(f, "{c}")?;
            }
            if row < 2 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Tic-tac-toe rules.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl TicTacToe {
    /// Create the rules.
    pub fn new() -> Self {
        Self
    }
}

impl Game for TicTacToe {
    type State = Board;
    type Move = usize;

    fn legal_moves(&self, state: &Board) -> Vec<usize> {
        if state.line_owner().is_some() {
            return Vec::new();
        }
        (0..9).filter(|&i| state.cells[i] == Cell::Empty).collect()
    }

    fn apply(&self, state: &Board, mv: &usize) -> Board {
        state.with_move(*mv)
    }

    fn result(&self, state: &Board) -> Option<GameResult> {
        match state.line_owner() {
            Some(winner) => Some(GameResult::Winner(winner)),
            None if state.piece_count() == 9 => Some(GameResult::Draw),
            None => None,
        }
    }

    fn player_to_move(&self, state: &Board) -> PlayerId {
        state.to_move()
    }
}

impl PolicyGrid for TicTacToe {
    fn policy_shape(&self) -> (usize, usize) {
        (3, 3)
    }

    fn policy_coords(&self, mv: &usize) -> (usize, usize) {
        (mv / 3, mv % 3)
    }
}
