//! # SimChess — simultaneous-move chess engine
//!
//! SimChess resolves a chess variant where both sides submit a move every
//! turn in secret; the two half-moves are checked against each other and
//! against the board before either is applied. This binary wires that
//! engine up behind a WebSocket: `join` seats a player, `submit_move`
//! records their half-move, and once both sides are in the server
//! resolves the turn and broadcasts the result.
//!
//! Game *creation* is an external collaborator's job — see
//! [`game::GameRegistry`] — this binary only starts the transport.
//!
//! ## Usage
//!
//! ```bash
//! # Start the WebSocket server (default: 0.0.0.0:8080)
//! simchess serve
//!
//! # Start on a custom port
//! simchess serve --port 3000
//! ```

pub mod board;
pub mod game;
pub mod movegen;
pub mod resolver;
pub mod transport;

use actix_web::{web, App, HttpServer};
use clap::{Parser, Subcommand};

use crate::game::GameRegistry;
use crate::transport::TransportState;

/// SimChess — a simultaneous-move chess engine server.
#[derive(Parser, Debug)]
#[command(name = "simchess")]
#[command(about = "Simultaneous-move chess engine server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the WebSocket server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Host address to bind to.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => run_server(&host, port).await,
    }
}

/// Starts the WebSocket server. The only route is `/ws` — there is no
/// REST surface, no static asset serving, and no Swagger UI.
async fn run_server(host: &str, port: u16) -> std::io::Result<()> {
    let registry = web::Data::new(GameRegistry::new());
    let transport_state = web::Data::new(TransportState::new(registry.clone()));

    log::info!("starting SimChess server on {}:{}", host, port);
    log::info!("websocket endpoint: ws://{}:{}/ws", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(transport_state.clone())
            .route("/ws", web::get().to(transport::ws_connect))
    })
    .bind((host, port))?
    .run()
    .await
}
