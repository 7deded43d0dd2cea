use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use zkgate_core::{logging, GatewayConfig};
use zkgate_kdc::Gateway;

/// zkgate KDC: ticket channel plus zero-knowledge proof gate.
#[derive(Debug, Parser)]
#[command(name = "zkgate-kdc", version)]
struct Args {
    /// TOML configuration file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.json_logs {
        logging::init_json();
    } else {
        logging::init();
    }

    let config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => GatewayConfig::default_config(),
    };
    info!(
        ticket = %config.ticket.listen_addr,
        proof = %config.proof.listen_addr,
        relation = %config.proof.relation,
        "Starting zkgate KDC"
    );

    let gateway = Gateway::initialize(config).context("gateway setup")?;
    let bound = gateway.bind().await?;

    let ticket_task = tokio::select! {
        result = bound.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted before authorization");
            return Ok(());
        }
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutting down ticket channel");
    ticket_task.abort();
    Ok(())
}
