//! Simple TCP chat client with display name and reconnection support.
//!
//! Connects to a chat server, replays the recent history, and sends
//! messages from stdin. Displays "name> " prompt and waits for input.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second
//! interval). Connections with a display name already in use are rejected
//! by the server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-client -- --username Alice
//! cargo run --bin tsudoi-client -- -n Bob -a 127.0.0.1:5555
//! ```

use clap::Parser;

use tsudoi_client::runner::run_client;
use tsudoi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsudoi-client")]
#[command(about = "TCP chat client with history replay and reconnection", long_about = None)]
struct Args {
    /// Display name shown to other participants (the server assigns one
    /// when left empty)
    #[arg(short = 'n', long, default_value = "")]
    username: String,

    /// Chat server address
    #[arg(short = 'a', long, default_value = "127.0.0.1:5555")]
    addr: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = run_client(args.addr, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
