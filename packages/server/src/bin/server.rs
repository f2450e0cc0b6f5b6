//! Real-time multiplayer lobby/room server binary.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin banmen-server
//! cargo run --bin banmen-server -- --host 0.0.0.0 --port 3000
//! ```

use banmen_server::server::run_server;
use banmen_shared::logger::setup_logger;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "banmen-server")]
#[command(about = "Real-time multiplayer lobby/room server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "1111")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
