use clap::Parser;
use flux_config::ConfigLoader;
use flux_logging::init_logging;
use flux_server::{api, build_event_log, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory containing alerting.toml
    #[arg(short, long, default_value = "config")]
    config_dir: PathBuf,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new(&args.config_dir).load_validated()?;
    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    init_logging(&config.logging)?;
    tracing::info!("Starting FLUX alerting server with config dir: {}", args.config_dir.display());

    let state = AppState::from_config(&config, build_event_log(&config.logging))?;

    state
        .engine
        .start_scheduler(config.scheduler.interval(), None)
        .await?;

    let addr: SocketAddr = config.server.bind_address().parse()?;
    tracing::info!("HTTP API listening on http://{}", addr);

    axum::Server::try_bind(&addr)?
        .serve(api::create_router(state.clone()).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.shutdown().await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
    }
}
