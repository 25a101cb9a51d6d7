use crate::{DifficultySettings, GameError, Position};
use itertools::iproduct;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{RngCore, SeedableRng};
use std::collections::{HashSet, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Largest supported board edge.
pub const MAX_DIMENSION: u32 = 128;

/// One grid square. Snapshots are handed out by value; the mine bit reads
/// false until the game reaches a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    mine: bool,
    revealed: bool,
    flagged: bool,
    triggered: bool,
    adjacent_mines: u8,
}

impl Cell {
    pub fn is_mine(&self) -> bool {
        self.mine
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// True only for the mine that ended a lost game.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Number of mines in the 8-neighborhood. Valid once mines are placed.
    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

struct BoardState {
    cells: Array2<Cell>,
    state: GameState,
    mines_placed: bool,
    revealed_count: u32,
    rng: Box<dyn RngCore + Send + Sync>,
}

/// Authoritative game state. All mutation goes through `reveal` and
/// `toggle_flag`, which hold the write lock for their full duration, so a
/// single writer and concurrent readers can share one `Board`.
pub struct Board {
    settings: DifficultySettings,
    inner: RwLock<BoardState>,
}

impl Board {
    pub fn new(rows: u32, cols: u32, mines: u32) -> Result<Self, GameError> {
        Self::with_rng(rows, cols, mines, StdRng::from_entropy())
    }

    /// Builds a board whose mine placement draws from the supplied source,
    /// so tests can seed it and assert exact layouts.
    pub fn with_rng(
        rows: u32,
        cols: u32,
        mines: u32,
        rng: impl RngCore + Send + Sync + 'static,
    ) -> Result<Self, GameError> {
        Self::from_settings(DifficultySettings::new(rows, cols, mines), Box::new(rng))
    }

    pub fn from_difficulty(settings: DifficultySettings) -> Result<Self, GameError> {
        Self::from_settings(settings, Box::new(StdRng::from_entropy()))
    }

    pub fn from_difficulty_with_rng(
        settings: DifficultySettings,
        rng: impl RngCore + Send + Sync + 'static,
    ) -> Result<Self, GameError> {
        Self::from_settings(settings, Box::new(rng))
    }

    fn from_settings(
        settings: DifficultySettings,
        rng: Box<dyn RngCore + Send + Sync>,
    ) -> Result<Self, GameError> {
        if !(1..=MAX_DIMENSION).contains(&settings.rows)
            || !(1..=MAX_DIMENSION).contains(&settings.cols)
        {
            return Err(GameError::InvalidDimensions {
                rows: settings.rows,
                cols: settings.cols,
            });
        }
        if settings.mines == 0 || settings.mines >= settings.total_cells() {
            return Err(GameError::InvalidMineCount {
                rows: settings.rows,
                cols: settings.cols,
                mines: settings.mines,
            });
        }

        let cells = Array2::from_elem(
            (settings.rows as usize, settings.cols as usize),
            Cell::default(),
        );
        Ok(Self {
            settings,
            inner: RwLock::new(BoardState {
                cells,
                state: GameState::NotStarted,
                mines_placed: false,
                revealed_count: 0,
                rng,
            }),
        })
    }

    /// Test-harness constructor: mines are placed immediately at the given
    /// positions instead of lazily on the first reveal.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_mines(rows: u32, cols: u32, mines: &[Position]) -> Result<Self, GameError> {
        let board = Self::new(rows, cols, mines.len() as u32)?;
        {
            let mut st = board.write();
            let distinct: HashSet<Position> = mines.iter().copied().collect();
            assert_eq!(distinct.len(), mines.len(), "duplicate mine positions");
            for &pos in mines {
                assert!(
                    board.is_within_bounds(pos),
                    "mine position out of bounds: {:?}",
                    pos
                );
                st.cells[index_of(pos)].mine = true;
            }
            board.compute_adjacency(&mut st);
            st.mines_placed = true;
        }
        Ok(board)
    }

    /// Ground truth for validation harnesses; empty until mines are placed.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn mine_positions(&self) -> HashSet<Position> {
        let st = self.read();
        self.iter_positions()
            .filter(|&pos| st.cells[index_of(pos)].mine)
            .collect()
    }

    pub fn settings(&self) -> DifficultySettings {
        self.settings
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.settings.rows, self.settings.cols)
    }

    pub fn mines_count(&self) -> u32 {
        self.settings.mines
    }

    pub fn state(&self) -> GameState {
        self.read().state
    }

    pub fn is_within_bounds(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.row < self.settings.rows as i32
            && pos.col >= 0
            && pos.col < self.settings.cols as i32
    }

    /// Cell snapshot, or `None` out of bounds. The mine bit is masked while
    /// the game is running; mine positions are display data for finished
    /// games only.
    pub fn cell(&self, pos: Position) -> Option<Cell> {
        if !self.is_within_bounds(pos) {
            return None;
        }
        let st = self.read();
        let mut cell = st.cells[index_of(pos)];
        if !st.state.is_terminal() {
            cell.mine = false;
        }
        Some(cell)
    }

    pub fn flag_count(&self) -> u32 {
        self.read().cells.iter().filter(|c| c.flagged).count() as u32
    }

    /// Number of revealed safe cells.
    pub fn revealed_count(&self) -> u32 {
        self.read().revealed_count
    }

    /// The up-to-8 in-bounds neighbors, in raster order of offsets.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        pos.neighbors().filter(move |&p| self.is_within_bounds(p))
    }

    /// Full-board raster scan: rows ascending, then columns.
    pub fn iter_positions(&self) -> impl Iterator<Item = Position> {
        let (rows, cols) = (self.settings.rows as i32, self.settings.cols as i32);
        iproduct!(0..rows, 0..cols).map(|(row, col)| Position::new(row, col))
    }

    /// Reveals a cell and returns the resulting state. Out-of-bounds
    /// positions, terminal games, and already revealed or flagged cells are
    /// no-ops returning the current state. The first successful reveal
    /// places the mines and starts the game.
    pub fn reveal(&self, pos: Position) -> GameState {
        let mut st = self.write();
        if !self.is_within_bounds(pos) || st.state.is_terminal() {
            return st.state;
        }
        let idx = index_of(pos);
        if st.cells[idx].revealed || st.cells[idx].flagged {
            return st.state;
        }

        if !st.mines_placed {
            self.place_mines(&mut st, pos);
        }
        if st.state == GameState::NotStarted {
            st.state = GameState::InProgress;
        }

        if st.cells[idx].mine {
            st.cells[idx].revealed = true;
            st.cells[idx].triggered = true;
            for cell in st.cells.iter_mut().filter(|c| c.mine) {
                cell.revealed = true;
            }
            st.state = GameState::Lost;
            return st.state;
        }

        self.flood_reveal(&mut st, pos);

        if st.revealed_count == self.settings.total_cells() - self.settings.mines {
            st.state = GameState::Won;
        }
        st.state
    }

    /// Flips the flag on an untouched cell; same no-op guards as `reveal`.
    /// Flags shield cells from reveal and flood reveal but never affect
    /// placement or the win condition.
    pub fn toggle_flag(&self, pos: Position) -> GameState {
        let mut st = self.write();
        if !self.is_within_bounds(pos) || st.state.is_terminal() {
            return st.state;
        }
        let idx = index_of(pos);
        if st.cells[idx].revealed {
            return st.state;
        }
        st.cells[idx].flagged = !st.cells[idx].flagged;
        st.state
    }

    /// Uniform placement among cells outside the exclusion zone: the first
    /// click plus its 8 neighbors when capacity allows, otherwise the first
    /// click alone. Adjacency counts are computed before the lock is
    /// released, so readers never see mines without counts.
    fn place_mines(&self, st: &mut BoardState, first: Position) {
        let mines = self.settings.mines;
        let excluded: HashSet<Position> =
            if self.settings.total_cells().saturating_sub(9) >= mines {
                std::iter::once(first).chain(first.neighbors()).collect()
            } else {
                std::iter::once(first).collect()
            };

        let chosen = self
            .iter_positions()
            .filter(|p| !excluded.contains(p))
            .choose_multiple(&mut st.rng, mines as usize);
        for pos in chosen {
            st.cells[index_of(pos)].mine = true;
        }

        self.compute_adjacency(st);
        st.mines_placed = true;
    }

    fn compute_adjacency(&self, st: &mut BoardState) {
        for pos in self.iter_positions() {
            if st.cells[index_of(pos)].mine {
                continue;
            }
            let count = self
                .neighbors(pos)
                .filter(|&p| st.cells[index_of(p)].mine)
                .count() as u8;
            st.cells[index_of(pos)].adjacent_mines = count;
        }
    }

    /// Breadth-first expansion over the worklist; each coordinate is
    /// processed at most once per call. Flagged and mine cells are never
    /// auto-revealed.
    fn flood_reveal(&self, st: &mut BoardState, seed: Position) {
        let mut queue = VecDeque::from([seed]);
        let mut visited = HashSet::from([seed]);

        while let Some(pos) = queue.pop_front() {
            let idx = index_of(pos);
            if st.cells[idx].revealed || st.cells[idx].flagged || st.cells[idx].mine {
                continue;
            }
            st.cells[idx].revealed = true;
            st.revealed_count += 1;

            if st.cells[idx].adjacent_mines == 0 {
                for npos in self.neighbors(pos) {
                    if visited.insert(npos) {
                        queue.push_back(npos);
                    }
                }
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Only valid after a bounds check.
fn index_of(pos: Position) -> (usize, usize) {
    (pos.row as usize, pos.col as usize)
}
