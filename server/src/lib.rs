//! # Multiplayer Sudoku Server
//!
//! Authoritative server for a competitive Sudoku game. Every connected
//! player races on the same generated puzzle; the server validates each
//! submitted cell against the stored solution, keeps the scores, and ranks
//! players as they finish.
//!
//! ## Architecture
//!
//! - [`generator`] — puzzle construction: a fully solved grid is built with
//!   randomized backtracking, then cells are carved out while the puzzle
//!   still has exactly one solution.
//! - [`game`] — the session state machine: players, boards, scoring,
//!   completion tracking and the waiting/playing/finished lifecycle.
//! - [`player`] — per-player state: board, cell statuses, score counters.
//! - [`ranking`] — standings computation and the human-readable announcement
//!   text.
//! - [`dispatcher`] — routes decoded commands onto the session, producing
//!   uniform response envelopes.
//! - [`network`] — async TCP transport with delimiter-framed JSON messages.
//!
//! The session itself is plain synchronous code; all locking lives in the
//! dispatcher, which holds an `Arc<RwLock<GameSession>>` shared across
//! connection tasks.

pub mod dispatcher;
pub mod game;
pub mod generator;
pub mod network;
pub mod player;
pub mod ranking;
