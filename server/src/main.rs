use clap::Parser;
use log::{error, info};
use server::dispatcher::CommandDispatcher;
use server::game::GameSession;
use server::generator::{self, Difficulty};
use server::network::GameServer;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main-method of the application.
/// Parses command-line arguments, generates the first puzzle, then runs the
/// TCP server until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "0.0.0.0")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
        port: u16,
        /// Maximum number of concurrent players
        #[clap(short, long, default_value_t = shared::DEFAULT_MAX_PLAYERS)]
        max_players: usize,
        /// Puzzle difficulty for new games
        #[clap(short, long, value_enum, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
    }

    // Parse command line arguments
    let args = Args::parse();

    info!(
        "Generating initial {} puzzle (max {} players)",
        args.difficulty, args.max_players
    );
    let (puzzle, solution) = generator::generate(args.difficulty);

    // Create shared game session with read-write lock
    let session = Arc::new(RwLock::new(GameSession::new(
        args.max_players,
        puzzle,
        solution,
    )));
    let dispatcher = Arc::new(CommandDispatcher::new(session, args.difficulty));

    let address = format!("{}:{}", args.host, args.port);
    let server = GameServer::bind(&address, dispatcher).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped with error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
