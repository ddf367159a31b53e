mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cuemix_engine::Engine;

#[derive(Debug, Parser)]
#[command(name = "cuemix-server")]
#[command(about = "Network-addressable offline audio editing engine")]
struct Cli {
    /// TCP port to listen on.
    #[arg(long, default_value_t = 50051)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Startup marker scripts and tests wait for.
    println!("Listening on {addr}");
    info!(%addr, "engine server ready");

    let engine = Arc::new(Engine::new());
    server::serve(listener, engine).await
}
