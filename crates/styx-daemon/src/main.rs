use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use styx_core::{NodeId, Oracle};
use styx_daemon::api::{self, AppState};
use styx_daemon::config::DaemonConfig;
use styx_daemon::telemetry::Telemetry;

#[derive(Debug, Parser)]
#[command(name = "styx-daemon")]
#[command(about = "STYX membership-oracle HTTP daemon")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Base identifier of this oracle instance.
    #[arg(long, default_value_t = 1)]
    self_id: u64,

    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(args.log))
        .init();

    let mut cfg = DaemonConfig::from_env();
    cfg.listen = args.listen.parse()?;
    cfg.self_id = args.self_id;

    let oracle = Arc::new(Oracle::new(NodeId::new(cfg.self_id)));
    let state = AppState {
        oracle,
        telemetry: Telemetry::new(),
    };

    let listener = tokio::net::TcpListener::bind(cfg.listen).await?;
    tracing::info!(
        listen=%cfg.listen,
        self_id=%cfg.self_id,
        "starting STYX oracle server"
    );

    api::serve(listener, state, &cfg, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error=%err, "failed to install ctrl-c handler");
    }
}
