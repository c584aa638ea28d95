use anyhow::{anyhow, Context};
use clap::Parser;
use ensgraph_core::{default_log_level, init_logging};
use ensgraph_server::{serve, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    let level = config.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, config.log_dir.as_deref()).map_err(|err| anyhow!(err))?;

    serve(config).await.context("server terminated")
}
