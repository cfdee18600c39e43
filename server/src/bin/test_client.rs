//! Interactive command-line client for poking at a running server.
//!
//! Speaks the delimiter-framed JSON protocol over a plain blocking socket,
//! which keeps the tool independent of the async runtime and easy to drive
//! from a terminal.

use clap::Parser;
use serde_json::{json, Value};
use shared::{Request, Response, MESSAGE_DELIMITER};
use std::io::{self, BufRead, Read, Write};
use std::net::TcpStream;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Interactive test client for the Sudoku server")]
struct Args {
    /// Server address to connect to
    #[clap(short, long, default_value = "127.0.0.1")]
    host: String,
    /// Server port
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
    /// Player ID to use for player-scoped commands
    #[clap(short = 'i', long, default_value = "tester")]
    player_id: String,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let mut stream = TcpStream::connect((args.host.as_str(), args.port))?;
    println!("Connected to {}:{}", args.host, args.port);
    print_help();

    let stdin = io::stdin();
    let mut pending = Vec::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = parts.first() else {
            continue;
        };

        let request = match cmd {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                continue;
            }
            "join" => {
                let name = parts.get(1).copied().unwrap_or("Tester");
                Request::new(
                    "join_game",
                    Some(&args.player_id),
                    json!({ "player_name": name }),
                )
            }
            "puzzle" => Request::new("get_puzzle", None, Value::Null),
            "board" => Request::new("get_player_board", Some(&args.player_id), Value::Null),
            "submit" => {
                let (Some(row), Some(col), Some(value)) = (
                    parts.get(1).and_then(|s| s.parse::<u64>().ok()),
                    parts.get(2).and_then(|s| s.parse::<u64>().ok()),
                    parts.get(3).and_then(|s| s.parse::<u64>().ok()),
                ) else {
                    println!("Usage: submit <row> <col> <value>  (value 0 clears)");
                    continue;
                };
                Request::new(
                    "submit_answer",
                    Some(&args.player_id),
                    json!({ "row": row, "col": col, "value": value }),
                )
            }
            "scores" => Request::new("get_scores", None, Value::Null),
            "state" => Request::new("get_game_state", None, Value::Null),
            "progress" => Request::new("get_player_progress", None, Value::Null),
            "ranking" => Request::new("get_current_ranking", None, Value::Null),
            "leave" => Request::new("leave_game", Some(&args.player_id), Value::Null),
            "reset" => Request::new("reset_game", None, Value::Null),
            other => {
                println!("Unknown command: {} (try 'help')", other);
                continue;
            }
        };

        stream.write_all(request.to_wire().as_bytes())?;
        let raw = read_message(&mut stream, &mut pending)?;
        match Response::from_wire(&raw) {
            Ok(response) => {
                println!("[{:?}] {}", response.status, response.message);
                if let Some(data) = response.data {
                    if request.command == "get_current_ranking" {
                        if let Some(text) = data["ranking_text"].as_str() {
                            println!("{}", text);
                            continue;
                        }
                    }
                    println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
                }
            }
            Err(err) => println!("Bad response: {} ({})", raw.trim(), err),
        }
    }

    println!("Bye");
    Ok(())
}

/// Reads bytes until a full delimiter-terminated message is buffered,
/// keeping any trailing bytes for the next call.
fn read_message(stream: &mut TcpStream, pending: &mut Vec<u8>) -> io::Result<String> {
    let delim = MESSAGE_DELIMITER.as_bytes();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(pos) = pending.windows(delim.len()).position(|w| w == delim) {
            let frame: Vec<u8> = pending.drain(..pos + delim.len()).collect();
            return Ok(String::from_utf8_lossy(&frame[..pos]).into_owned());
        }
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ));
        }
        pending.extend_from_slice(&chunk[..read]);
    }
}

fn print_help() {
    println!("Commands:");
    println!("  join [name]            join the game");
    println!("  puzzle                 fetch the shared puzzle");
    println!("  board                  fetch your board with cell statuses");
    println!("  submit <r> <c> <v>     place a value (0 clears the cell)");
    println!("  scores                 current scores for all players");
    println!("  state                  session state snapshot");
    println!("  progress               fill progress for all players");
    println!("  ranking                current standings");
    println!("  leave                  leave the game");
    println!("  reset                  start a fresh puzzle");
    println!("  quit                   exit");
}
