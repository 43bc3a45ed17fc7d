//! Game logic and game board.

use core::fmt::{self, Formatter};
use core::str::FromStr;
use tracing::{debug, instrument};

/// Width and height of the board.
pub const SIZE: usize = 3;

/// Number of cells on the board.
pub const CELLS: usize = SIZE * SIZE;

/// All lines that win the game, in the order they are checked:
/// rows, columns, main diagonal, anti-diagonal.
const LINES: [[Move; 3]; 8] = [
    // rows
    [Move::new(0, 0), Move::new(0, 1), Move::new(0, 2)],
    [Move::new(1, 0), Move::new(1, 1), Move::new(1, 2)],
    [Move::new(2, 0), Move::new(2, 1), Move::new(2, 2)],
    // columns
    [Move::new(0, 0), Move::new(1, 0), Move::new(2, 0)],
    [Move::new(0, 1), Move::new(1, 1), Move::new(2, 1)],
    [Move::new(0, 2), Move::new(1, 2), Move::new(2, 2)],
    // diagonals
    [Move::new(0, 0), Move::new(1, 1), Move::new(2, 2)],
    [Move::new(0, 2), Move::new(1, 1), Move::new(2, 0)],
];

/// Errors of the game core.
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Eq, derive_more::Display)]
pub enum GameError {
    /// Target cell is occupied or outside the board.
    #[display("illegal move at {_0}")]
    IllegalMove(Move),
    /// The board is full, there is nothing left to search.
    #[display("no legal move left, the board is full")]
    NoLegalMove,
    /// The game already has a final outcome.
    #[display("the game is already over")]
    GameOver,
    #[display("it is not {_0:?}'s turn")]
    NotYourTurn(Mark),
}

impl core::error::Error for GameError {}

/// Errors when reading a [`Board`] from its text form.
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Eq, derive_more::Display)]
pub enum ParseBoardError {
    #[display("invalid cell symbol {_0:?}")]
    InvalidSymbol(char),
    #[display("row has {_0} cells, expected 3")]
    InvalidRowLength(usize),
    #[display("board has {_0} rows, expected 3")]
    InvalidRowCount(usize),
}

impl core::error::Error for ParseBoardError {}

/// The two sides of the game.
#[derive(Copy, Clone, PartialOrd, PartialEq, Eq, Hash, Debug)]
pub enum Mark {
    /// The human, plays `O`.
    Player,
    /// The computer, plays `X`.
    Ai,
}

impl Mark {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Ai,
            Self::Ai => Self::Player,
        }
    }

    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Player => 'O',
            Self::Ai => 'X',
        }
    }
}

/// State of a single cell. `None` is an empty cell.
pub type Cell = Option<Mark>;

/// A (row, column) coordinate on the board.
///
/// A move is not guaranteed to be inside the board; [`Board::place`] rejects
/// coordinates outside of `[0, 2] x [0, 2]`.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash, Debug, derive_more::Display)]
#[display("({row}, {col})")]
pub struct Move {
    pub row: usize,
    pub col: usize,
}

impl Move {
    /// All cells in row-major order. This is the scan order of the search.
    pub const ALL: [Self; CELLS] = [
        Self::new(0, 0),
        Self::new(0, 1),
        Self::new(0, 2),
        Self::new(1, 0),
        Self::new(1, 1),
        Self::new(1, 2),
        Self::new(2, 0),
        Self::new(2, 1),
        Self::new(2, 2),
    ];

    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Creates a move from its row-major cell index (0-8).
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < CELLS {
            Some(Self::new(index / SIZE, index % SIZE))
        } else {
            None
        }
    }

    /// Row-major cell index (0-8).
    #[must_use]
    pub const fn index(self) -> usize {
        self.row * SIZE + self.col
    }

    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.row < SIZE && self.col < SIZE
    }
}

/// Final or intermediate result of a game. Always derived from a [`Board`].
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Outcome {
    InProgress,
    PlayerWin,
    AiWin,
    Draw,
}

impl Outcome {
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Gameboard. Small enough to be copied as scratch space for the search.
#[derive(Debug, PartialOrd, PartialEq, Clone, Copy, Eq, Hash)]
pub struct Board(
    /*
     * Board: rows --> col --> field
     * (row=0,col=0) <==> top left of the game board
     */
    [[Cell; SIZE]; SIZE],
);

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    #[must_use]
    pub const fn new() -> Self {
        Self([[None; SIZE]; SIZE])
    }

    /// Returns the state of the cell.
    ///
    /// # Panics
    /// If the move lies outside of the board.
    #[must_use]
    pub const fn cell(&self, mv: Move) -> Cell {
        self.0[mv.row][mv.col]
    }

    /// Returns whether the cell exists and is empty.
    #[must_use]
    pub const fn is_empty(&self, mv: Move) -> bool {
        mv.in_bounds() && self.cell(mv).is_none()
    }

    /// Emits the empty cells in row-major order.
    pub fn empty_cells_iter(&self) -> impl Iterator<Item = Move> + '_ {
        Move::ALL.into_iter().filter(|&mv| self.is_empty(mv))
    }

    /// Number of cells set by completed moves.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.0.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Returns the mark owning a complete line, if any.
    ///
    /// Lines are checked rows first, then columns, then the main diagonal and
    /// finally the anti-diagonal. The first complete line wins; more than one
    /// only exists on boards that legal play never produces.
    #[must_use]
    pub fn winner(&self) -> Option<Mark> {
        LINES.iter().find_map(|&[a, b, c]| {
            let mark = self.cell(a)?;
            (self.cell(b) == Some(mark) && self.cell(c) == Some(mark)).then_some(mark)
        })
    }

    /// Returns whether no empty cell is left.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.iter().flatten().all(Option::is_some)
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(Mark::Player) => Outcome::PlayerWin,
            Some(Mark::Ai) => Outcome::AiWin,
            None if self.is_full() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }

    /// Sets the cell of `mv` to `mark`.
    ///
    /// # Errors
    /// [`GameError::IllegalMove`] if the cell is occupied or out of range. The
    /// board is left untouched in that case.
    pub fn place(&mut self, mv: Move, mark: Mark) -> Result<(), GameError> {
        if !self.is_empty(mv) {
            return Err(GameError::IllegalMove(mv));
        }
        self.set(mv, Some(mark));
        Ok(())
    }

    /// Unchecked write, used by the search to place and undo marks.
    pub(crate) const fn set(&mut self, mv: Move, cell: Cell) {
        self.0[mv.row][mv.col] = cell;
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, row) in self.0.into_iter().enumerate() {
            if i > 0 {
                writeln!(f, "-+-+-")?;
            }
            let [a, b, c] = row.map(|cell| cell.map_or(' ', Mark::symbol));
            writeln!(f, "{a}|{b}|{c}")?;
        }
        Ok(())
    }
}

/// Reads a board from three rows of three symbols, separated by `/` or
/// newlines. `X` is the AI, `O` the player, ` ` or `.` an empty cell.
impl FromStr for Board {
    type Err = ParseBoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_suffix('\n').unwrap_or(s);
        let rows = s.split(['/', '\n']).collect::<Vec<_>>();
        if rows.len() != SIZE {
            return Err(ParseBoardError::InvalidRowCount(rows.len()));
        }

        let mut board = Self::new();
        for (row, line) in rows.into_iter().enumerate() {
            let len = line.chars().count();
            if len != SIZE {
                return Err(ParseBoardError::InvalidRowLength(len));
            }
            for (col, symbol) in line.chars().enumerate() {
                board.0[row][col] = match symbol {
                    'X' => Some(Mark::Ai),
                    'O' => Some(Mark::Player),
                    ' ' | '.' => None,
                    other => return Err(ParseBoardError::InvalidSymbol(other)),
                };
            }
        }
        Ok(board)
    }
}

/// One game with all its state, owned by whoever hosts the game.
#[derive(Debug, PartialOrd, PartialEq, Clone, Eq)]
pub struct GameSession {
    board: Board,
    first: Mark,
    to_move: Mark,
    round: usize,
}

impl GameSession {
    #[must_use]
    pub const fn new(first: Mark) -> Self {
        Self {
            board: Board::new(),
            first,
            to_move: first,
            round: 0,
        }
    }

    /// Clears the board and hands the first move back to the opening side.
    #[instrument(skip(self), fields(round = self.round))]
    pub fn restart(&mut self) {
        debug!("restarting game session");
        *self = Self::new(self.first);
    }

    /// Places `mark` at `mv` and passes the turn to the opponent.
    ///
    /// # Errors
    /// - [`GameError::GameOver`] if the game has already ended
    /// - [`GameError::NotYourTurn`] if `mark` is not to move
    /// - [`GameError::IllegalMove`] if the cell can't be taken
    #[instrument(skip(self), fields(round = self.round), ret, err(level = "debug"))]
    pub fn play(&mut self, mark: Mark, mv: Move) -> Result<Outcome, GameError> {
        if self.outcome().is_over() {
            return Err(GameError::GameOver);
        }
        if mark != self.to_move {
            return Err(GameError::NotYourTurn(mark));
        }

        self.board.place(mv, mark)?;
        self.round += 1;
        self.to_move = mark.opponent();
        debug_assert_eq!(self.round, self.board.occupied_count());

        Ok(self.outcome())
    }

    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub const fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Side that opened the game.
    #[must_use]
    pub const fn first(&self) -> Mark {
        self.first
    }

    /// Number of moves made so far.
    #[must_use]
    pub const fn round(&self) -> usize {
        self.round
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(Mark::Player)
    }
}
