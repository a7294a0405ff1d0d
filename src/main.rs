//! gwmon - scheduled health and benchmark probes for IPFS gateways.
//!
//! Usage:
//!   gwmon daemon    Run probes on their recurring schedule and serve metrics
//!   gwmon single    Run every probe once and exit

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use gwmon::{
    metrics, probes, Engine, GatewayClient, IpfsClient, PinningClient, Probe, ProbeDeps,
};
use prometheus::Registry;
use tracing::{error, info};

/// gwmon - scheduled health and benchmark probes for IPFS gateways
#[derive(Parser)]
#[command(name = "gwmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Gateway base URL to probe
    #[arg(long, default_value = "https://ipfs.io")]
    gateway: String,

    /// IPFS HTTP RPC API endpoint
    #[arg(long, default_value = "http://127.0.0.1:5001")]
    ipfs: String,

    /// Pinning service endpoint; enables the pinning benchmark
    #[arg(long)]
    pinning_service: Option<String>,

    /// Bearer token for the pinning service
    #[arg(long, requires = "pinning_service")]
    pinning_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run probes on their recurring schedule and serve metrics
    Daemon {
        /// Address for the prometheus scrape endpoint
        #[arg(long, default_value = "0.0.0.0:2112")]
        metrics_addr: SocketAddr,
    },

    /// Run every probe once and exit
    Single,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let pinner = cli
        .pinning_service
        .as_ref()
        .map(|base| PinningClient::new(base, cli.pinning_token.clone()));
    let deps = ProbeDeps::new(
        GatewayClient::new(&cli.gateway),
        IpfsClient::new(&cli.ipfs),
        pinner,
    );

    let mut probe_set = probes::all();
    if cli.pinning_service.is_some() {
        probe_set.push(Arc::new(probes::RandomPinningBench::new(
            "0 * * * *",
            16 * probes::MIB,
        )) as Arc<dyn Probe>);
    }

    info!(gateway = %cli.gateway, probes = probe_set.len(), "configured probe set");

    match cli.command {
        Commands::Daemon { metrics_addr } => run_daemon(deps, probe_set, metrics_addr).await,
        Commands::Single => run_single(deps, probe_set).await,
    }
}

/// Recurring mode: serve metrics and dispatch until interrupted.
async fn run_daemon(
    deps: ProbeDeps,
    probe_set: Vec<Arc<dyn Probe>>,
    metrics_addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new();
    let metrics_task = tokio::spawn(metrics::serve(metrics_addr, registry.clone()));

    let mut engine = Engine::new(deps, &registry, probe_set)?;
    let mut errors = engine.start()?;

    info!("engine running; press Ctrl+C to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                engine.stop();
                break;
            }
            next = errors.recv() => match next {
                Some(err) => error!(error = %err, "probe failed"),
                None => break,
            },
        }
    }

    metrics_task.abort();
    Ok(())
}

/// One-shot mode: run the probe set to completion, exit nonzero if any
/// probe failed.
async fn run_single(
    deps: ProbeDeps,
    probe_set: Vec<Arc<dyn Probe>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Registry::new();
    let mut engine = Engine::new_single(deps, &registry, probe_set)?;
    let mut errors = engine.start()?;

    let mut failed = 0usize;
    while let Some(err) = errors.recv().await {
        error!(error = %err, "probe failed");
        failed += 1;
    }

    if failed > 0 {
        return Err(format!("{failed} probe(s) failed").into());
    }
    info!("all probes passed");
    Ok(())
}
