//! Ledgerly server binary
//!
//! Usage:
//!   ledgerly-server --db ledgerly.db --port 8080
//!   ledgerly-server --no-auth          Local development without tokens

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ledgerly_core::Database;
use ledgerly_server::ServerConfig;

#[derive(Parser)]
#[command(name = "ledgerly-server", about = "Ledgerly personal finance advisor API")]
struct Cli {
    /// Path to the SQLite database file
    #[arg(long, default_value = "ledgerly.db")]
    db: String,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Disable authentication (local development only)
    #[arg(long)]
    no_auth: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let db = Database::new(&cli.db)?;

    let mut config = ServerConfig::from_env();
    if cli.no_auth {
        tracing::warn!("Authentication disabled - do not expose this server publicly");
        config.require_auth = false;
    } else if config.token_secret.is_empty() {
        anyhow::bail!(
            "{} is not set. Set it, or pass --no-auth for local development.",
            ledgerly_server::TOKEN_SECRET_ENV
        );
    }

    ledgerly_server::run(db, &cli.host, cli.port, config).await
}
