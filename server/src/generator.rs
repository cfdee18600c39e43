//! Sudoku puzzle generation with a uniqueness guarantee.
//!
//! Generation works in two phases: first a complete valid grid is built by
//! filling the three independent diagonal boxes and completing the rest with
//! randomized backtracking, then cells are removed in random order while a
//! bounded solution counter proves the puzzle still has exactly one solution.

use clap::ValueEnum;
use log::warn;
use rand::seq::SliceRandom;
use rand::Rng;
use shared::{empty_grid, Grid, BOARD_SIZE, BOX_SIZE};
use std::time::{Duration, Instant};

/// Wall-clock budget for a single generation attempt. Exceeding it means the
/// server falls back to the built-in puzzle instead of retrying indefinitely.
const GENERATION_BUDGET: Duration = Duration::from_secs(5);

/// Puzzle difficulty, expressed as the number of cells targeted for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        };
        f.write_str(name)
    }
}

impl Difficulty {
    /// How many cells the generator tries to blank out. The actual number can
    /// be lower when a removal would break solution uniqueness.
    pub fn removal_target(self) -> usize {
        match self {
            Difficulty::Easy => 35,
            Difficulty::Medium => 45,
            Difficulty::Hard => 55,
            Difficulty::Expert => 65,
        }
    }
}

/// Generates a (puzzle, solution) pair for the given difficulty.
///
/// The solution is a complete valid grid; the puzzle is the same grid with
/// cells blanked out such that exactly one solution exists. Always terminates:
/// the uniqueness search is capped at two discovered solutions and the whole
/// attempt is bounded by [`GENERATION_BUDGET`].
pub fn generate(difficulty: Difficulty) -> (Grid, Grid) {
    let started = Instant::now();
    let mut rng = rand::thread_rng();

    let mut solution = empty_grid();
    for band in (0..BOARD_SIZE).step_by(BOX_SIZE) {
        fill_box(&mut solution, band, band, &mut rng);
    }
    if !fill_remaining(&mut solution, 0, BOX_SIZE, &mut rng) {
        warn!("grid completion failed, serving the built-in fallback puzzle");
        return fallback_pair();
    }

    let (puzzle, within_budget) =
        carve_puzzle(&solution, difficulty.removal_target(), started, &mut rng);
    if !within_budget {
        warn!(
            "puzzle generation exceeded its {:?} budget, serving the built-in fallback puzzle",
            GENERATION_BUDGET
        );
        return fallback_pair();
    }

    (puzzle, solution)
}

/// Checks that every row, column and 3x3 box is a permutation of 1-9.
pub fn validate(grid: &Grid) -> bool {
    for row in 0..BOARD_SIZE {
        let unit: Vec<u8> = (0..BOARD_SIZE).map(|col| grid[row][col]).collect();
        if !is_valid_unit(&unit) {
            return false;
        }
    }
    for col in 0..BOARD_SIZE {
        let unit: Vec<u8> = (0..BOARD_SIZE).map(|row| grid[row][col]).collect();
        if !is_valid_unit(&unit) {
            return false;
        }
    }
    for box_row in (0..BOARD_SIZE).step_by(BOX_SIZE) {
        for box_col in (0..BOARD_SIZE).step_by(BOX_SIZE) {
            let mut unit = Vec::with_capacity(BOARD_SIZE);
            for i in 0..BOX_SIZE {
                for j in 0..BOX_SIZE {
                    unit.push(grid[box_row + i][box_col + j]);
                }
            }
            if !is_valid_unit(&unit) {
                return false;
            }
        }
    }
    true
}

/// True when the puzzle admits exactly one solution.
pub fn has_unique_solution(puzzle: &Grid) -> bool {
    let mut work = *puzzle;
    let mut count = 0;
    count_solutions(&mut work, 0, 0, &mut count);
    count == 1
}

fn is_valid_unit(unit: &[u8]) -> bool {
    let mut sorted: Vec<u8> = unit.to_vec();
    sorted.sort_unstable();
    sorted == (1..=9).collect::<Vec<u8>>()
}

fn fill_box(grid: &mut Grid, row: usize, col: usize, rng: &mut impl Rng) {
    let mut numbers: Vec<u8> = (1..=9).collect();
    numbers.shuffle(rng);
    for i in 0..BOX_SIZE {
        for j in 0..BOX_SIZE {
            grid[row + i][col + j] = numbers[i * BOX_SIZE + j];
        }
    }
}

fn is_safe(grid: &Grid, row: usize, col: usize, num: u8) -> bool {
    for j in 0..BOARD_SIZE {
        if grid[row][j] == num {
            return false;
        }
    }
    for i in 0..BOARD_SIZE {
        if grid[i][col] == num {
            return false;
        }
    }
    let start_row = row - row % BOX_SIZE;
    let start_col = col - col % BOX_SIZE;
    for i in 0..BOX_SIZE {
        for j in 0..BOX_SIZE {
            if grid[start_row + i][start_col + j] == num {
                return false;
            }
        }
    }
    true
}

/// Completes a partially filled grid using randomized backtracking.
fn fill_remaining(grid: &mut Grid, row: usize, col: usize, rng: &mut impl Rng) -> bool {
    let (row, col) = if col == BOARD_SIZE {
        (row + 1, 0)
    } else {
        (row, col)
    };
    if row == BOARD_SIZE {
        return true;
    }
    if grid[row][col] != 0 {
        return fill_remaining(grid, row, col + 1, rng);
    }

    let mut numbers: Vec<u8> = (1..=9).collect();
    numbers.shuffle(rng);
    for num in numbers {
        if is_safe(grid, row, col, num) {
            grid[row][col] = num;
            if fill_remaining(grid, row, col + 1, rng) {
                return true;
            }
            grid[row][col] = 0;
        }
    }
    false
}

/// Counts solutions of a puzzle, stopping as soon as two are found.
/// The cap bounds the worst-case branching of the uniqueness check.
fn count_solutions(grid: &mut Grid, row: usize, col: usize, count: &mut u32) {
    if *count >= 2 {
        return;
    }
    let (row, col) = if col == BOARD_SIZE {
        (row + 1, 0)
    } else {
        (row, col)
    };
    if row == BOARD_SIZE {
        *count += 1;
        return;
    }
    if grid[row][col] != 0 {
        return count_solutions(grid, row, col + 1, count);
    }

    for num in 1..=9 {
        if is_safe(grid, row, col, num) {
            grid[row][col] = num;
            count_solutions(grid, row, col + 1, count);
            grid[row][col] = 0;
            if *count >= 2 {
                return;
            }
        }
    }
}

/// Derives the puzzle by blanking cells in random order, keeping a removal
/// only while the puzzle still has exactly one solution. Returns the puzzle
/// and whether the work finished inside the generation budget.
fn carve_puzzle(
    solution: &Grid,
    removal_target: usize,
    started: Instant,
    rng: &mut impl Rng,
) -> (Grid, bool) {
    let mut puzzle = *solution;
    let mut positions: Vec<(usize, usize)> = (0..BOARD_SIZE)
        .flat_map(|row| (0..BOARD_SIZE).map(move |col| (row, col)))
        .collect();
    positions.shuffle(rng);

    let mut removed = 0;
    for (row, col) in positions {
        if removed >= removal_target {
            break;
        }
        if started.elapsed() > GENERATION_BUDGET {
            return (puzzle, false);
        }

        let backup = puzzle[row][col];
        puzzle[row][col] = 0;
        if has_unique_solution(&puzzle) {
            removed += 1;
        } else {
            puzzle[row][col] = backup;
        }
    }

    (puzzle, true)
}

/// Known-good puzzle/solution pair served when generation blows its budget.
pub fn fallback_pair() -> (Grid, Grid) {
    let puzzle: Grid = [
        [5, 3, 0, 0, 7, 0, 0, 0, 0],
        [6, 0, 0, 1, 9, 5, 0, 0, 0],
        [0, 9, 8, 0, 0, 0, 0, 6, 0],
        [8, 0, 0, 0, 6, 0, 0, 0, 3],
        [4, 0, 0, 8, 0, 3, 0, 0, 1],
        [7, 0, 0, 0, 2, 0, 0, 0, 6],
        [0, 6, 0, 0, 0, 0, 2, 8, 0],
        [0, 0, 0, 4, 1, 9, 0, 0, 5],
        [0, 0, 0, 0, 8, 0, 0, 7, 9],
    ];
    let solution: Grid = [
        [5, 3, 4, 6, 7, 8, 9, 1, 2],
        [6, 7, 2, 1, 9, 5, 3, 4, 8],
        [1, 9, 8, 3, 4, 2, 5, 6, 7],
        [8, 5, 9, 7, 6, 1, 4, 2, 3],
        [4, 2, 6, 8, 5, 3, 7, 9, 1],
        [7, 1, 3, 9, 2, 4, 8, 5, 6],
        [9, 6, 1, 5, 3, 7, 2, 8, 4],
        [2, 8, 7, 4, 1, 9, 6, 3, 5],
        [3, 4, 5, 2, 8, 6, 1, 7, 9],
    ];
    (puzzle, solution)
}
