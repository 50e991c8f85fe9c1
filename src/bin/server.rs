//! HTTP/REST+SSE mirror entrypoint.

use clap::Parser;
use newsagg::config::AppConfig;
use newsagg::{bootstrap, routes, state::AppState};

#[derive(Debug, Parser)]
#[command(name = "newsagg-server", about = "Cascading news aggregation HTTP service")]
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
    let handler = bootstrap::build_handler(&config, shutdown.clone()).await?;
    let host = config.http.host.clone();
    let port = config.http.port;
    let state = AppState::new(std::sync::Arc::new(config), handler);
    let app = routes::create_router(state);

    newsagg::transport::http::serve(app, &host, port, shutdown).await?;
    Ok(())
}
