//! Per-player session state for the shared Sudoku contest
//!
//! Each connected player solves a private copy of the same puzzle. This module
//! tracks that private board together with the per-cell status grid, the
//! player's score and counters, and their completion lifecycle:
//! - The board starts as a deep copy of the puzzle
//! - Given cells are immutable, correct cells lock permanently
//! - Completion time, duration and rank are stamped once, on first completion

use serde::Serialize;
use shared::{CellStatus, Grid, StatusGrid, BOARD_SIZE};
use std::time::{Duration, Instant};

/// Lifecycle status of a player within the current session.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Playing,
    Completed,
}

/// A registered player and their private view of the contest
///
/// Score changes by +10 for a first-time-correct submission and -10 for an
/// incorrect one; clearing a cell never changes the score. `filled_cells`
/// counts only correct cells, so it doubles as the player's progress measure.
#[derive(Debug, Clone)]
pub struct PlayerSession {
    /// Opaque identifier chosen by the client at join time
    pub id: String,
    /// Display name shown in scores and ranking announcements
    pub name: String,
    /// When the player joined; breaks ranking ties in insertion order
    pub joined_at: Instant,
    /// The player's private board, seeded from the puzzle
    pub board: Grid,
    /// Per-cell status mirroring `board`
    pub cell_status: StatusGrid,
    pub score: i32,
    /// Number of non-given cells currently correct
    pub filled_cells: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub status: PlayerStatus,
    /// Time from session start to this player's completion, set once
    pub completion_duration: Option<Duration>,
    /// 1-based order in which the player finished, set once
    pub completion_rank: Option<usize>,
}

impl PlayerSession {
    /// Creates a fresh session for a player joining the given puzzle.
    pub fn new(id: &str, name: &str, puzzle: &Grid) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            joined_at: Instant::now(),
            board: *puzzle,
            cell_status: seeded_status(puzzle),
            score: 0,
            filled_cells: 0,
            correct_answers: 0,
            wrong_answers: 0,
            status: PlayerStatus::Playing,
            completion_duration: None,
            completion_rank: None,
        }
    }

    /// Reinitializes the player for a new puzzle, keeping their identity.
    /// Used by the session reset operation.
    pub fn reset_for(&mut self, puzzle: &Grid) {
        self.board = *puzzle;
        self.cell_status = seeded_status(puzzle);
        self.score = 0;
        self.filled_cells = 0;
        self.correct_answers = 0;
        self.wrong_answers = 0;
        self.status = PlayerStatus::Playing;
        self.completion_duration = None;
        self.completion_rank = None;
    }

    /// True when every cell of the player's board matches the solution.
    pub fn board_matches(&self, solution: &Grid) -> bool {
        self.board == *solution
    }

    pub fn is_completed(&self) -> bool {
        self.status == PlayerStatus::Completed
    }
}

/// Builds the initial status grid: `given` for non-zero puzzle cells,
/// `empty` everywhere else.
fn seeded_status(puzzle: &Grid) -> StatusGrid {
    let mut status = [[CellStatus::Empty; BOARD_SIZE]; BOARD_SIZE];
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            if puzzle[row][col] != 0 {
                status[row][col] = CellStatus::Given;
            }
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator;

    #[test]
    fn test_new_player_seeds_board_from_puzzle() {
        let (puzzle, _) = generator::fallback_pair();
        let player = PlayerSession::new("p1", "Alice", &puzzle);

        assert_eq!(player.board, puzzle);
        assert_eq!(player.score, 0);
        assert_eq!(player.filled_cells, 0);
        assert_eq!(player.status, PlayerStatus::Playing);
        assert_eq!(player.completion_rank, None);
    }

    #[test]
    fn test_status_grid_marks_givens() {
        let (puzzle, _) = generator::fallback_pair();
        let player = PlayerSession::new("p1", "Alice", &puzzle);

        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let expected = if puzzle[row][col] != 0 {
                    CellStatus::Given
                } else {
                    CellStatus::Empty
                };
                assert_eq!(player.cell_status[row][col], expected);
            }
        }
    }

    #[test]
    fn test_reset_keeps_identity_and_clears_progress() {
        let (puzzle, solution) = generator::fallback_pair();
        let mut player = PlayerSession::new("p1", "Alice", &puzzle);

        player.board = solution;
        player.score = 120;
        player.filled_cells = 12;
        player.status = PlayerStatus::Completed;
        player.completion_rank = Some(1);
        player.completion_duration = Some(Duration::from_secs(90));

        player.reset_for(&puzzle);

        assert_eq!(player.id, "p1");
        assert_eq!(player.name, "Alice");
        assert_eq!(player.board, puzzle);
        assert_eq!(player.score, 0);
        assert_eq!(player.filled_cells, 0);
        assert_eq!(player.status, PlayerStatus::Playing);
        assert_eq!(player.completion_rank, None);
        assert_eq!(player.completion_duration, None);
    }

    #[test]
    fn test_board_matches_solution() {
        let (puzzle, solution) = generator::fallback_pair();
        let mut player = PlayerSession::new("p1", "Alice", &puzzle);

        assert!(!player.board_matches(&solution));
        player.board = solution;
        assert!(player.board_matches(&solution));
    }
}
