//! The shared game session: player registry, state machine, scoring,
//! completion tracking and ranking snapshots.
//!
//! All operations are plain synchronous methods. The dispatcher wraps the
//! session in `Arc<RwLock<..>>`, so every mutation and every cross-player
//! snapshot happens under one coarse lock and observes a consistent state.

use crate::player::{PlayerSession, PlayerStatus};
use crate::ranking::{self, RankingEntry};
use log::info;
use serde::Serialize;
use shared::{CellStatus, Grid, StatusGrid, BOARD_SIZE, SCORE_CORRECT, SCORE_INCORRECT};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Session-level failures. The display strings are the exact messages put in
/// `ERROR` response envelopes. None of these mutate state.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game is full")]
    GameFull,
    #[error("Player ID already exists")]
    DuplicateId,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Game not in progress")]
    GameNotInProgress,
    #[error("Invalid coordinates")]
    OutOfRange,
    #[error("Invalid value")]
    InvalidValue,
    #[error("Cannot modify given numbers")]
    GivenCell,
    #[error("Cannot modify correct answers")]
    CellLocked,
    #[error("Player has already completed the puzzle")]
    AlreadyCompleted,
}

/// Session state machine: `waiting -> playing -> finished`, with reset
/// reinitializing to `playing` or `waiting`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Playing,
    Finished,
}

/// Append-only record of a player's first completion, in completion order.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub player_id: String,
    pub name: String,
    pub duration: Duration,
    pub score: i32,
    pub rank: usize,
}

/// Result payload of a processed (non-rejected) submission.
#[derive(Debug, Serialize, Clone)]
pub struct SubmitOutcome {
    pub correct: bool,
    pub score_change: i32,
    pub new_score: i32,
    pub player_completed: bool,
    pub game_complete: bool,
    pub cell_status: StatusGrid,
    pub board: Grid,
}

/// Per-player entry of the scores snapshot.
#[derive(Debug, Serialize, Clone)]
pub struct ScoreEntry {
    pub name: String,
    pub score: i32,
    pub status: PlayerStatus,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rank: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_duration: Option<f64>,
}

/// Per-player entry of the progress snapshot.
#[derive(Debug, Serialize, Clone)]
pub struct ProgressEntry {
    pub name: String,
    pub filled_cells: usize,
    pub total_empty_cells: usize,
    pub completion_percentage: f64,
    pub status: PlayerStatus,
}

/// Aggregate session snapshot for `get_game_state`.
#[derive(Debug, Serialize, Clone)]
pub struct StateSnapshot {
    pub game_state: GamePhase,
    pub players_count: usize,
    pub max_players: usize,
    pub game_duration: f64,
    pub completed_players: usize,
    pub total_players: usize,
    pub current_ranking: Vec<RankingEntry>,
}

/// The single shared mutable state of the contest.
pub struct GameSession {
    puzzle: Grid,
    solution: Grid,
    players: HashMap<String, PlayerSession>,
    phase: GamePhase,
    started_at: Option<Instant>,
    max_players: usize,
    completions: Vec<CompletionRecord>,
}

impl GameSession {
    pub fn new(max_players: usize, puzzle: Grid, solution: Grid) -> Self {
        Self {
            puzzle,
            solution,
            players: HashMap::new(),
            phase: GamePhase::Waiting,
            started_at: None,
            max_players,
            completions: Vec::new(),
        }
    }

    pub fn puzzle(&self) -> &Grid {
        &self.puzzle
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn completions(&self) -> &[CompletionRecord] {
        &self.completions
    }

    /// Registers a new player with a fresh copy of the current puzzle.
    /// The first join starts the game and stamps the session start time.
    pub fn add_player(&mut self, player_id: &str, player_name: &str) -> Result<(), SessionError> {
        if self.players.len() >= self.max_players {
            return Err(SessionError::GameFull);
        }
        if self.players.contains_key(player_id) {
            return Err(SessionError::DuplicateId);
        }

        self.players.insert(
            player_id.to_string(),
            PlayerSession::new(player_id, player_name, &self.puzzle),
        );

        if self.players.len() == 1 && self.phase == GamePhase::Waiting {
            self.phase = GamePhase::Playing;
            self.started_at = Some(Instant::now());
            info!("Game started");
        }
        info!(
            "Player {} ({}) joined. Total players: {}",
            player_name,
            player_id,
            self.players.len()
        );
        Ok(())
    }

    /// Removes a player. An empty session falls back to `waiting`; otherwise
    /// the all-completed condition is re-evaluated, covering the case where
    /// only already-completed players remain.
    pub fn remove_player(&mut self, player_id: &str) -> Result<(), SessionError> {
        let player = self
            .players
            .remove(player_id)
            .ok_or(SessionError::PlayerNotFound)?;
        info!(
            "Player {} ({}) removed. Remaining players: {}",
            player.name,
            player.id,
            self.players.len()
        );

        if self.players.is_empty() {
            self.phase = GamePhase::Waiting;
            self.started_at = None;
            self.completions.clear();
        } else {
            self.evaluate_finish();
        }
        Ok(())
    }

    /// Processes one cell submission for a player.
    ///
    /// Check order: player exists, game in progress, coordinates and value in
    /// range, player not completed, cell not given, cell not locked. A value
    /// of 0 clears an incorrect cell; correct cells are permanently immutable,
    /// including clears, because the lock check rejects them first.
    pub fn submit_answer(
        &mut self,
        player_id: &str,
        row: usize,
        col: usize,
        value: u8,
    ) -> Result<SubmitOutcome, SessionError> {
        if !self.players.contains_key(player_id) {
            return Err(SessionError::PlayerNotFound);
        }
        if self.phase != GamePhase::Playing {
            return Err(SessionError::GameNotInProgress);
        }
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return Err(SessionError::OutOfRange);
        }
        if value > 9 {
            return Err(SessionError::InvalidValue);
        }

        let solution = self.solution;
        let given = self.puzzle[row][col] != 0;
        let started_at = self.started_at;
        let next_rank = self.completions.len() + 1;

        let player = self
            .players
            .get_mut(player_id)
            .ok_or(SessionError::PlayerNotFound)?;

        if player.is_completed() {
            return Err(SessionError::AlreadyCompleted);
        }
        if given {
            return Err(SessionError::GivenCell);
        }
        if player.cell_status[row][col] == CellStatus::Correct {
            return Err(SessionError::CellLocked);
        }

        // Clearing: only an incorrect cell has anything to undo, an empty
        // cell is a no-op. Score never changes on a clear.
        if value == 0 {
            if player.cell_status[row][col] == CellStatus::Incorrect {
                player.board[row][col] = 0;
                player.cell_status[row][col] = CellStatus::Empty;
            }
            return Ok(SubmitOutcome {
                correct: true,
                score_change: 0,
                new_score: player.score,
                player_completed: false,
                game_complete: false,
                cell_status: player.cell_status,
                board: player.board,
            });
        }

        let correct = value == solution[row][col];
        player.board[row][col] = value;
        let score_change = if correct {
            player.cell_status[row][col] = CellStatus::Correct;
            player.correct_answers += 1;
            player.filled_cells += 1;
            SCORE_CORRECT
        } else {
            // The wrong value stays on the board, marked incorrect.
            player.cell_status[row][col] = CellStatus::Incorrect;
            player.wrong_answers += 1;
            SCORE_INCORRECT
        };
        player.score += score_change;

        let newly_completed = correct && player.board_matches(&solution);
        if !newly_completed {
            return Ok(SubmitOutcome {
                correct,
                score_change,
                new_score: player.score,
                player_completed: false,
                game_complete: false,
                cell_status: player.cell_status,
                board: player.board,
            });
        }

        let duration = started_at.map(|t| t.elapsed()).unwrap_or_default();
        player.status = PlayerStatus::Completed;
        player.completion_duration = Some(duration);
        player.completion_rank = Some(next_rank);

        let name = player.name.clone();
        let new_score = player.score;
        let cell_status = player.cell_status;
        let board = player.board;
        self.completions.push(CompletionRecord {
            player_id: player_id.to_string(),
            name: name.clone(),
            duration,
            score: new_score,
            rank: next_rank,
        });

        info!(
            "Player {} completed the puzzle in {} (rank {})",
            name,
            ranking::format_duration(duration),
            next_rank
        );
        info!("{}", ranking::announcement(&self.ranking(), false));
        self.evaluate_finish();

        Ok(SubmitOutcome {
            correct: true,
            score_change,
            new_score,
            player_completed: true,
            game_complete: self.phase == GamePhase::Finished,
            cell_status,
            board,
        })
    }

    /// The session finishes only once every registered player has completed.
    fn evaluate_finish(&mut self) {
        if self.phase == GamePhase::Playing
            && !self.players.is_empty()
            && self.players.values().all(PlayerSession::is_completed)
        {
            self.phase = GamePhase::Finished;
            info!("All players completed, game finished");
            info!("{}", ranking::announcement(&self.ranking(), true));
        }
    }

    pub fn player_board(&self, player_id: &str) -> Result<(Grid, StatusGrid), SessionError> {
        let player = self
            .players
            .get(player_id)
            .ok_or(SessionError::PlayerNotFound)?;
        Ok((player.board, player.cell_status))
    }

    pub fn scores(&self) -> HashMap<String, ScoreEntry> {
        self.players
            .iter()
            .map(|(id, player)| {
                (
                    id.clone(),
                    ScoreEntry {
                        name: player.name.clone(),
                        score: player.score,
                        status: player.status,
                        correct_answers: player.correct_answers,
                        wrong_answers: player.wrong_answers,
                        completion_rank: player.completion_rank,
                        completion_duration: player
                            .completion_duration
                            .map(|d| d.as_secs_f64()),
                    },
                )
            })
            .collect()
    }

    pub fn progress(&self) -> HashMap<String, ProgressEntry> {
        let total_empty = self
            .puzzle
            .iter()
            .flatten()
            .filter(|&&cell| cell == 0)
            .count();

        self.players
            .iter()
            .map(|(id, player)| {
                let percentage = if total_empty > 0 {
                    player.filled_cells as f64 / total_empty as f64 * 100.0
                } else {
                    0.0
                };
                (
                    id.clone(),
                    ProgressEntry {
                        name: player.name.clone(),
                        filled_cells: player.filled_cells,
                        total_empty_cells: total_empty,
                        completion_percentage: percentage,
                        status: player.status,
                    },
                )
            })
            .collect()
    }

    pub fn state_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            game_state: self.phase,
            players_count: self.players.len(),
            max_players: self.max_players,
            game_duration: self
                .started_at
                .map(|t| t.elapsed().as_secs_f64())
                .unwrap_or(0.0),
            completed_players: self
                .players
                .values()
                .filter(|p| p.is_completed())
                .count(),
            total_players: self.players.len(),
            current_ranking: self.ranking(),
        }
    }

    pub fn ranking(&self) -> Vec<RankingEntry> {
        ranking::rank_players(self.players.values().collect())
    }

    pub fn ranking_text(&self) -> String {
        ranking::announcement(&self.ranking(), self.phase == GamePhase::Finished)
    }

    /// Installs a freshly generated puzzle and reinitializes every player.
    /// Generation itself happens outside the session lock; only this brief
    /// reassignment runs under it.
    pub fn install_puzzle(&mut self, puzzle: Grid, solution: Grid) {
        self.puzzle = puzzle;
        self.solution = solution;
        self.completions.clear();
        for player in self.players.values_mut() {
            player.reset_for(&self.puzzle);
        }
        if self.players.is_empty() {
            self.phase = GamePhase::Waiting;
            self.started_at = None;
        } else {
            self.phase = GamePhase::Playing;
            self.started_at = Some(Instant::now());
        }
        info!("Game reset with new puzzle");
    }
}
