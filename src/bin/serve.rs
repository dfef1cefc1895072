//! HTTP server exposing POST /recommend and GET /health

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use drone_overwatch::api::router;
use drone_overwatch::cli::init_tracing;
use drone_overwatch::core::config::EngineConfig;
use drone_overwatch::core::error::Result;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Serve the decision engine over HTTP")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: String,

    /// TOML file overriding engine tables
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let listener = tokio::net::TcpListener::bind(args.addr.as_str()).await?;
    tracing::info!(addr = %args.addr, "Decision engine listening");
    axum::serve(listener, router(Arc::new(config))).await?;
    Ok(())
}
