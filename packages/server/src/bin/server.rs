//! Tsudoi chat server with broadcast functionality.
//!
//! Accepts TCP connections, relays chat messages to all other connected
//! clients, and replays the recent history to newcomers.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 5555
//! ```

use clap::Parser;

use tsudoi_server::console::shutdown_signal;
use tsudoi_server::history::MessageHistory;
use tsudoi_server::runner::{ChatServer, ServerConfig};
use tsudoi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsudoi-server")]
#[command(about = "TCP chat server with broadcast support", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value_t = 5555)]
    port: u16,

    /// Maximum number of chat messages kept in history
    #[arg(long, default_value_t = MessageHistory::DEFAULT_CAPACITY)]
    history_capacity: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        history_capacity: args.history_capacity,
    };

    let server = match ChatServer::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
