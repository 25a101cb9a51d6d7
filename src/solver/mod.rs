mod board;

pub use board::{SolverBoard, SolverCell};

use crate::{Board, Position};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    Reveal,
    Flag,
}

/// A single recommendation, produced fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverMove {
    pub pos: Position,
    pub action: MoveAction,
    pub rationale: String,
}

/// How many of the lowest-risk cells the guess stage picks between.
const GUESS_POOL_SIZE: usize = 5;

/// Proposes one move at a time: a mine-deduction pass feeding a growing
/// known-mines set, a safe-cell pass over satisfied constraints, and a
/// probability guess as the fallback. Each pass runs once per call, so
/// chained deductions surface over successive calls.
///
/// A solver is tied to the board it was created for; start a new game with
/// a new solver.
pub struct Solver<'a> {
    board: SolverBoard<'a>,
    known_mines: HashSet<Position>,
    rng: Box<dyn RngCore + Send>,
}

impl<'a> Solver<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self::with_rng(board, StdRng::from_entropy())
    }

    /// Guess tie-breaking draws from the supplied source, so tests can
    /// seed it and assert exact choices.
    pub fn with_rng(board: &'a Board, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            board: SolverBoard::new(board),
            known_mines: HashSet::new(),
            rng: Box::new(rng),
        }
    }

    /// Positions proven (not guessed) to be mines so far.
    pub fn known_mines(&self) -> &HashSet<Position> {
        &self.known_mines
    }

    /// The next recommended move, or `None` when no unrevealed cell
    /// outside the known mines remains.
    pub fn next_move(&mut self) -> Option<SolverMove> {
        self.identify_mines();
        if let Some(mv) = self.find_safe_cell() {
            return Some(mv);
        }
        self.make_guess()
    }

    /// Unrevealed neighbors not already proven to be mines. Flags are not
    /// information: a flagged cell is as unknown as a covered one.
    fn unknown_neighbors(&self, pos: Position) -> Vec<Position> {
        self.board
            .neighbors(pos)
            .into_iter()
            .filter(|&p| matches!(self.board.get(p), Some(c) if c.is_unrevealed()))
            .filter(|p| !self.known_mines.contains(p))
            .collect()
    }

    fn known_mine_neighbors(&self, pos: Position) -> usize {
        self.board
            .neighbors(pos)
            .into_iter()
            .filter(|p| self.known_mines.contains(p))
            .count()
    }

    /// Wherever a revealed number has exactly as many unknown neighbors as
    /// mines still unaccounted for, those neighbors are all mines.
    fn identify_mines(&mut self) {
        for pos in self.board.iter_positions() {
            let n = match self.board.get(pos) {
                Some(SolverCell::Revealed(n)) if n > 0 => n as usize,
                _ => continue,
            };
            let unknown = self.unknown_neighbors(pos);
            let remaining = n.saturating_sub(self.known_mine_neighbors(pos));
            if remaining > 0 && unknown.len() == remaining {
                self.known_mines.extend(unknown);
            }
        }
    }

    /// First cell (raster order) adjacent to a constraint whose mines are
    /// all identified; everything else around that constraint is safe.
    fn find_safe_cell(&self) -> Option<SolverMove> {
        for pos in self.board.iter_positions() {
            let n = match self.board.get(pos) {
                Some(SolverCell::Revealed(n)) => n as usize,
                _ => continue,
            };
            if self.known_mine_neighbors(pos) != n {
                continue;
            }
            if let Some(target) = self.unknown_neighbors(pos).into_iter().next() {
                return Some(SolverMove {
                    pos: target,
                    action: MoveAction::Reveal,
                    rationale: format!("Safe: ({},{}) has all mines identified", pos.row, pos.col),
                });
            }
        }
        None
    }

    /// Reveal one of the `GUESS_POOL_SIZE` lowest-risk cells, chosen
    /// uniformly; ties keep raster order under the stable sort.
    fn make_guess(&mut self) -> Option<SolverMove> {
        let mut candidates: Vec<(Position, f64)> = self
            .board
            .iter_positions()
            .filter(|&pos| matches!(self.board.get(pos), Some(c) if c.is_unrevealed()))
            .filter(|pos| !self.known_mines.contains(pos))
            .map(|pos| (pos, self.cell_risk(pos)))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.truncate(GUESS_POOL_SIZE);
        let (pos, risk) = candidates[self.rng.gen_range(0..candidates.len())];

        Some(SolverMove {
            pos,
            action: MoveAction::Reveal,
            rationale: format!("Guess: {:.0}% risk", risk * 100.0),
        })
    }

    /// Estimated probability that the cell is a mine: the global mine
    /// density when nothing nearby is revealed, otherwise the mean of each
    /// revealed neighbor's remaining mines spread over its unknown cells.
    fn cell_risk(&self, pos: Position) -> f64 {
        let revealed: Vec<(Position, u8)> = self
            .board
            .neighbors(pos)
            .into_iter()
            .filter_map(|p| match self.board.get(p) {
                Some(SolverCell::Revealed(n)) => Some((p, n)),
                _ => None,
            })
            .collect();

        if revealed.is_empty() {
            return self.board.total_mines() as f64 / self.board.total_cells() as f64;
        }

        let mut total = 0.0;
        let mut contributing = 0u32;
        for (npos, n) in revealed {
            let unknown = self.unknown_neighbors(npos).len();
            if unknown > 0 {
                let known = self.known_mine_neighbors(npos);
                total += (n as f64 - known as f64) / unknown as f64;
                contributing += 1;
            }
        }

        if contributing > 0 {
            total / contributing as f64
        } else {
            0.5
        }
    }
}
