//! Maps validated wire commands onto game session operations and wraps every
//! outcome in the uniform response envelope.
//!
//! Nothing escapes this boundary: validation failures, session errors and
//! serialization problems all come back as `ERROR` envelopes, never as a
//! panic reaching the transport layer.

use crate::game::{GameSession, SessionError};
use crate::generator::{self, Difficulty};
use log::{debug, error, info};
use serde::Serialize;
use serde_json::json;
use shared::{Command, Request, Response};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stateless command router over the shared session.
///
/// Holds the session lock and the difficulty used when `reset_game`
/// regenerates the puzzle. Shared across connection tasks behind an `Arc`.
pub struct CommandDispatcher {
    session: Arc<RwLock<GameSession>>,
    difficulty: Difficulty,
}

impl CommandDispatcher {
    pub fn new(session: Arc<RwLock<GameSession>>, difficulty: Difficulty) -> Self {
        Self {
            session,
            difficulty,
        }
    }

    /// Processes one decoded request and always produces a response.
    pub async fn handle(&self, request: Request) -> Response {
        debug!(
            "Processing command: {} from player: {:?}",
            request.command, request.player_id
        );

        let command = match Command::from_request(&request) {
            Ok(command) => command,
            Err(message) => return Response::error(message),
        };

        match command {
            Command::JoinGame {
                player_id,
                player_name,
            } => {
                let mut session = self.session.write().await;
                match session.add_player(&player_id, &player_name) {
                    Ok(()) => Response::ok(
                        "Player added successfully",
                        json!({
                            "player_id": player_id,
                            "player_name": player_name,
                            "game_state": to_value_or_null(&session.state_snapshot()),
                        }),
                    ),
                    Err(err) => Response::error(err.to_string()),
                }
            }
            Command::GetPuzzle => {
                let session = self.session.read().await;
                Response::ok("Puzzle retrieved", json!({ "puzzle": session.puzzle() }))
            }
            Command::GetPlayerBoard { player_id } => {
                let session = self.session.read().await;
                match session.player_board(&player_id) {
                    Ok((board, cell_status)) => Response::ok(
                        "Player board retrieved",
                        json!({ "board": board, "cell_status": cell_status }),
                    ),
                    Err(err) => Response::error(err.to_string()),
                }
            }
            Command::SubmitAnswer {
                player_id,
                row,
                col,
                value,
            } => {
                let mut session = self.session.write().await;
                match session.submit_answer(&player_id, row, col, value) {
                    Ok(outcome) => {
                        let message = if value == 0 {
                            "Cell cleared"
                        } else {
                            "Answer processed"
                        };
                        serialized(message, &outcome)
                    }
                    Err(err) => Response::error(err.to_string()),
                }
            }
            Command::GetScores => {
                let session = self.session.read().await;
                Response::ok("Scores retrieved", json!({ "scores": session.scores() }))
            }
            Command::GetGameState => {
                let session = self.session.read().await;
                serialized("Game state retrieved", &session.state_snapshot())
            }
            Command::GetPlayerProgress => {
                let session = self.session.read().await;
                Response::ok(
                    "Player progress retrieved",
                    json!({ "progress": session.progress() }),
                )
            }
            Command::GetCurrentRanking => {
                let session = self.session.read().await;
                Response::ok(
                    "Current ranking retrieved",
                    json!({
                        "ranking": session.ranking(),
                        "ranking_text": session.ranking_text(),
                    }),
                )
            }
            Command::LeaveGame { player_id } => {
                let mut session = self.session.write().await;
                match session.remove_player(&player_id) {
                    Ok(()) => Response::ok_empty("Left game successfully"),
                    Err(err) => Response::error(err.to_string()),
                }
            }
            Command::ResetGame => {
                // Puzzle generation is the expensive part; run it before
                // taking the write lock so in-flight requests are not stalled
                // behind the uniqueness search.
                let (puzzle, solution) = generator::generate(self.difficulty);
                let mut session = self.session.write().await;
                session.install_puzzle(puzzle, solution);
                Response::ok("Game reset successfully", json!({ "new_puzzle": puzzle }))
            }
        }
    }

    /// Transport cleanup hook: removes the player associated with a dropped
    /// connection, if they ever joined.
    pub async fn handle_disconnect(&self, player_id: &str) {
        let mut session = self.session.write().await;
        match session.remove_player(player_id) {
            Ok(()) => info!("Cleaned up player {} after disconnect", player_id),
            Err(SessionError::PlayerNotFound) => {}
            Err(err) => error!("Disconnect cleanup for {} failed: {}", player_id, err),
        }
    }
}

/// Serializes a payload into the envelope, degrading to a generic error if
/// serialization ever fails instead of letting it propagate.
fn serialized<T: Serialize>(message: &str, payload: &T) -> Response {
    match serde_json::to_value(payload) {
        Ok(value) => Response::ok(message, value),
        Err(err) => {
            error!("Failed to serialize response payload: {}", err);
            Response::error("Internal server error")
        }
    }
}

fn to_value_or_null<T: Serialize>(payload: &T) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}
