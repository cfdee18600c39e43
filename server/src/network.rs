//! TCP transport for the game protocol.
//!
//! Each connection gets its own task. Messages are JSON documents separated
//! by a blank-line delimiter; partial reads are accumulated until a full
//! message is available. When a connection drops, any player it joined as is
//! removed from the session.

use crate::dispatcher::CommandDispatcher;
use log::{debug, info, warn};
use shared::{Request, Response, MESSAGE_DELIMITER};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Accepting half of the server. Owns the listener; connection tasks share
/// the dispatcher.
pub struct GameServer {
    listener: TcpListener,
    dispatcher: Arc<CommandDispatcher>,
}

impl GameServer {
    /// Binds the listener. Fails fast if the address is taken.
    pub async fn bind(addr: &str, dispatcher: Arc<CommandDispatcher>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            dispatcher,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Runs until the task is cancelled.
    pub async fn run(&self) -> std::io::Result<()> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            info!("Client connected: {}", addr);
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, dispatcher).await {
                    debug!("Connection {} closed with error: {}", addr, err);
                }
                info!("Client disconnected: {}", addr);
            });
        }
    }
}

/// Per-connection loop: frame, decode, dispatch, reply.
///
/// Remembers the player id of a successful join so the seat can be released
/// when the socket goes away without an explicit `leave_game`.
async fn handle_connection(
    mut stream: TcpStream,
    dispatcher: Arc<CommandDispatcher>,
) -> std::io::Result<()> {
    let mut joined_player: Option<String> = None;
    let result = connection_loop(&mut stream, &dispatcher, &mut joined_player).await;

    if let Some(player_id) = joined_player {
        dispatcher.handle_disconnect(&player_id).await;
    }
    result
}

async fn connection_loop(
    stream: &mut TcpStream,
    dispatcher: &CommandDispatcher,
    joined_player: &mut Option<String>,
) -> std::io::Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..read]);

        while let Some(end) = find_delimiter(&buf) {
            let frame: Vec<u8> = buf.drain(..end + MESSAGE_DELIMITER.len()).collect();
            let text = String::from_utf8_lossy(&frame[..end]);

            let response = match serde_json::from_str::<Request>(&text) {
                Ok(request) => {
                    let is_join = request.command == "join_game";
                    let player_id = request.player_id.clone();
                    let response = dispatcher.handle(request).await;
                    if is_join && response.is_ok() {
                        *joined_player = player_id;
                    }
                    response
                }
                Err(err) => {
                    warn!("Received malformed JSON: {}", err);
                    Response::error("Invalid JSON")
                }
            };

            stream.write_all(response.to_wire().as_bytes()).await?;
        }
    }
}

/// Finds the byte offset of the next message delimiter, if a complete
/// message is buffered.
fn find_delimiter(buf: &[u8]) -> Option<usize> {
    let delim = MESSAGE_DELIMITER.as_bytes();
    buf.windows(delim.len()).position(|window| window == delim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_delimiter_absent() {
        assert_eq!(find_delimiter(b"{\"command\":\"get_puzzle\"}"), None);
    }

    #[test]
    fn test_find_delimiter_present() {
        let buf = b"{}\r\n\r\n{\"next\":1}";
        assert_eq!(find_delimiter(buf), Some(2));
    }

    #[test]
    fn test_find_delimiter_partial_suffix() {
        // A trailing half-delimiter must not be treated as a frame end.
        assert_eq!(find_delimiter(b"{}\r\n"), None);
    }
}
