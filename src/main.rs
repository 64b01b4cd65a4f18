use anyhow::{anyhow, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;

mod config;
mod handler;
mod http;
mod logger;
mod routing;
mod schema;
mod server;
mod store;

/// Demo JSON API exercising typed path, query and body validation
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file path, extension optional
    #[arg(short, long, default_value = "config")]
    config: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::Config::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from '{}'", cli.config))?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder
        .build()
        .context("Failed to build the Tokio runtime")?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> anyhow::Result<()> {
    let addr = cfg.socket_addr().map_err(|e| anyhow!(e))?;
    let router = handler::build_router(handler::DemoState::default())
        .context("Failed to build the route table")?;
    let routes = router.len();

    let listener = server::create_listener(addr, cfg.server.backlog)
        .with_context(|| format!("Failed to bind {addr}"))?;
    logger::log_server_start(&addr, &cfg, routes);

    let grace = Duration::from_secs(cfg.performance.write_timeout);
    let state = Arc::new(config::AppState::new(cfg, router));
    server::run(listener, state, server::signal::shutdown_signal(), grace).await;

    Ok(())
}
