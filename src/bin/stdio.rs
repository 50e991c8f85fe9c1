//! JSON-RPC-over-stdio entrypoint.

use clap::Parser;
use newsagg::config::AppConfig;
use newsagg::{bootstrap, transport};

#[derive(Debug, Parser)]
#[command(name = "newsagg-stdio", about = "Cascading news aggregation stdio JSON-RPC service")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "config/newsagg.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = AppConfig::load(&args.config)?;
    bootstrap::init_tracing(&config.logging);

    let shutdown = tokio_util::sync::CancellationToken::new();
    bootstrap::spawn_shutdown_listener(shutdown.clone());
    let handler = bootstrap::build_handler(&config, shutdown).await?;
    transport::stdio::run(handler).await?;
    Ok(())
}
