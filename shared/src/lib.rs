use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const BOARD_SIZE: usize = 9;
pub const BOX_SIZE: usize = 3;
pub const SCORE_CORRECT: i32 = 10;
pub const SCORE_INCORRECT: i32 = -10;
pub const DEFAULT_MAX_PLAYERS: usize = 4;
pub const DEFAULT_PORT: u16 = 55555;
/// Every wire message is UTF-8 text terminated by this delimiter.
pub const MESSAGE_DELIMITER: &str = "\r\n\r\n";

/// A 9x9 digit grid. 0 marks an empty cell, 1-9 are filled digits.
pub type Grid = [[u8; BOARD_SIZE]; BOARD_SIZE];

pub fn empty_grid() -> Grid {
    [[0; BOARD_SIZE]; BOARD_SIZE]
}

/// Per-player state of a single cell.
///
/// `Given` cells come from the puzzle and are immutable for everyone.
/// `Correct` cells are locked for the player who solved them.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Given,
    Empty,
    Correct,
    Incorrect,
}

pub type StatusGrid = [[CellStatus; BOARD_SIZE]; BOARD_SIZE];

/// Raw command envelope as it appears on the wire.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Request {
    pub fn new(command: &str, player_id: Option<&str>, data: Value) -> Self {
        Self {
            command: command.to_string(),
            player_id: player_id.map(str::to_string),
            data,
        }
    }

    /// Serializes the request and appends the message delimiter.
    pub fn to_wire(&self) -> String {
        let mut text = serde_json::to_string(self).unwrap_or_default();
        text.push_str(MESSAGE_DELIMITER);
        text
    }
}

/// The validated, fully-typed command set accepted by the server.
///
/// Converting a [`Request`] into a `Command` performs all field presence
/// and type validation, so session logic never touches untyped payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JoinGame {
        player_id: String,
        player_name: String,
    },
    GetPuzzle,
    GetPlayerBoard {
        player_id: String,
    },
    SubmitAnswer {
        player_id: String,
        row: usize,
        col: usize,
        value: u8,
    },
    GetScores,
    GetGameState,
    GetPlayerProgress,
    GetCurrentRanking,
    LeaveGame {
        player_id: String,
    },
    ResetGame,
}

impl Command {
    /// Validates a raw request and produces a typed command.
    ///
    /// The error string is the human-readable validation message that goes
    /// straight into the `ERROR` response envelope.
    pub fn from_request(request: &Request) -> Result<Command, String> {
        match request.command.as_str() {
            "join_game" => {
                let player_id = required_player_id(request)?;
                let player_name = match request.data.get("player_name").and_then(Value::as_str) {
                    Some(name) if !name.is_empty() => name.to_string(),
                    _ => return Err("Missing player name".to_string()),
                };
                Ok(Command::JoinGame {
                    player_id,
                    player_name,
                })
            }
            "get_puzzle" => Ok(Command::GetPuzzle),
            "get_player_board" => Ok(Command::GetPlayerBoard {
                player_id: required_player_id(request)?,
            }),
            "submit_answer" => {
                let player_id = required_player_id(request)?;
                let row = required_int(&request.data, "row")?;
                let col = required_int(&request.data, "col")?;
                let value = required_int(&request.data, "value")?;
                let row = usize::try_from(row).map_err(|_| "Invalid coordinates".to_string())?;
                let col = usize::try_from(col).map_err(|_| "Invalid coordinates".to_string())?;
                let value = u8::try_from(value).map_err(|_| "Invalid value".to_string())?;
                Ok(Command::SubmitAnswer {
                    player_id,
                    row,
                    col,
                    value,
                })
            }
            "get_scores" => Ok(Command::GetScores),
            "get_game_state" => Ok(Command::GetGameState),
            "get_player_progress" => Ok(Command::GetPlayerProgress),
            "get_current_ranking" => Ok(Command::GetCurrentRanking),
            "leave_game" => Ok(Command::LeaveGame {
                player_id: required_player_id(request)?,
            }),
            "reset_game" => Ok(Command::ResetGame),
            "" => Err("Missing command".to_string()),
            other => Err(format!("Unknown command: {}", other)),
        }
    }
}

fn required_player_id(request: &Request) -> Result<String, String> {
    match &request.player_id {
        Some(id) if !id.is_empty() => Ok(id.clone()),
        _ => Err("Missing player ID".to_string()),
    }
}

fn required_int(data: &Value, field: &str) -> Result<i64, String> {
    let raw = data
        .get(field)
        .ok_or_else(|| format!("Missing field: {}", field))?;
    // Accept both numbers and numeric strings, like the original wire format.
    match raw {
        Value::Number(n) => n.as_i64().ok_or_else(|| "Invalid data types".to_string()),
        Value::String(s) => s.parse().map_err(|_| "Invalid data types".to_string()),
        _ => Err("Invalid data types".to_string()),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// Uniform response envelope returned for every command.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Response {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn ok(message: &str, data: Value) -> Self {
        Self {
            status: Status::Ok,
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn ok_empty(message: &str) -> Self {
        Self {
            status: Status::Ok,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            data: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Serializes the response and appends the message delimiter.
    pub fn to_wire(&self) -> String {
        let mut text = serde_json::to_string(self).unwrap_or_default();
        text.push_str(MESSAGE_DELIMITER);
        text
    }

    /// Parses a single delimited message as received from the wire.
    pub fn from_wire(raw: &str) -> Result<Response, serde_json::Error> {
        serde_json::from_str(raw.trim_end_matches(MESSAGE_DELIMITER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(command: &str, player_id: Option<&str>, data: Value) -> Request {
        Request::new(command, player_id, data)
    }

    #[test]
    fn test_request_roundtrip() {
        let req = request("join_game", Some("p1"), json!({"player_name": "Alice"}));
        let wire = req.to_wire();
        assert!(wire.ends_with(MESSAGE_DELIMITER));

        let parsed: Request =
            serde_json::from_str(wire.trim_end_matches(MESSAGE_DELIMITER)).unwrap();
        assert_eq!(parsed.command, "join_game");
        assert_eq!(parsed.player_id.as_deref(), Some("p1"));
        assert_eq!(parsed.data["player_name"], "Alice");
    }

    #[test]
    fn test_request_defaults() {
        let parsed: Request = serde_json::from_str(r#"{"command":"get_scores"}"#).unwrap();
        assert_eq!(parsed.command, "get_scores");
        assert_eq!(parsed.player_id, None);
        assert!(parsed.data.is_null());
    }

    #[test]
    fn test_join_game_validation() {
        let cmd = Command::from_request(&request(
            "join_game",
            Some("p1"),
            json!({"player_name": "Alice"}),
        ))
        .unwrap();
        assert_eq!(
            cmd,
            Command::JoinGame {
                player_id: "p1".to_string(),
                player_name: "Alice".to_string(),
            }
        );

        let err = Command::from_request(&request("join_game", None, json!({"player_name": "A"})))
            .unwrap_err();
        assert_eq!(err, "Missing player ID");

        let err = Command::from_request(&request("join_game", Some("p1"), json!({}))).unwrap_err();
        assert_eq!(err, "Missing player name");
    }

    #[test]
    fn test_submit_answer_validation() {
        let cmd = Command::from_request(&request(
            "submit_answer",
            Some("p1"),
            json!({"row": 2, "col": 3, "value": 7}),
        ))
        .unwrap();
        assert_eq!(
            cmd,
            Command::SubmitAnswer {
                player_id: "p1".to_string(),
                row: 2,
                col: 3,
                value: 7,
            }
        );

        let err = Command::from_request(&request(
            "submit_answer",
            Some("p1"),
            json!({"row": 2, "col": 3}),
        ))
        .unwrap_err();
        assert_eq!(err, "Missing field: value");

        let err = Command::from_request(&request(
            "submit_answer",
            Some("p1"),
            json!({"row": 2, "col": 3, "value": "abc"}),
        ))
        .unwrap_err();
        assert_eq!(err, "Invalid data types");

        let err = Command::from_request(&request(
            "submit_answer",
            Some("p1"),
            json!({"row": -1, "col": 3, "value": 5}),
        ))
        .unwrap_err();
        assert_eq!(err, "Invalid coordinates");
    }

    #[test]
    fn test_submit_answer_accepts_numeric_strings() {
        let cmd = Command::from_request(&request(
            "submit_answer",
            Some("p1"),
            json!({"row": "4", "col": "5", "value": "9"}),
        ))
        .unwrap();
        assert_eq!(
            cmd,
            Command::SubmitAnswer {
                player_id: "p1".to_string(),
                row: 4,
                col: 5,
                value: 9,
            }
        );
    }

    #[test]
    fn test_unknown_command() {
        let err = Command::from_request(&request("fly", None, Value::Null)).unwrap_err();
        assert_eq!(err, "Unknown command: fly");

        let err = Command::from_request(&request("", None, Value::Null)).unwrap_err();
        assert_eq!(err, "Missing command");
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::ok("Puzzle retrieved", json!({"puzzle": vec![vec![0; 9]; 9]}));
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains(r#""status":"OK""#));

        let parsed = Response::from_wire(&resp.to_wire()).unwrap();
        assert!(parsed.is_ok());
        assert_eq!(parsed.message, "Puzzle retrieved");
        assert!(parsed.data.is_some());
    }

    #[test]
    fn test_error_response_omits_data() {
        let resp = Response::error("Game is full");
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains(r#""status":"ERROR""#));
        assert!(!text.contains("data"));
    }

    #[test]
    fn test_cell_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&CellStatus::Given).unwrap(),
            r#""given""#
        );
        assert_eq!(
            serde_json::to_string(&CellStatus::Incorrect).unwrap(),
            r#""incorrect""#
        );
    }
}
