//! The archive daemon (`archived`).
//!
//! Opens the store, runs schema migrations, then drives the validation
//! pipeline against the configured source node while serving the JSON query
//! gateway. A failed commit is fatal by design: the process exits non-zero
//! and supervision restarts it.

use archive_api::{gateway, ArchiveService};
use archive_client::{CommandVerifier, NodeClient};
use archive_model::NodeSource;
use archive_store::ArchiveStore;
use archive_validator::Archiver;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "archived", version, about = "Tick archive daemon")]
struct Args {
    /// Source node host
    #[arg(long, default_value = "127.0.0.1")]
    node_host: String,

    /// Source node port
    #[arg(long, default_value_t = archive_model::NODE_PORT)]
    node_port: u16,

    /// Data directory for the embedded store
    #[arg(long, default_value = "./archive-data")]
    data_dir: PathBuf,

    /// Listen address of the JSON query gateway
    #[arg(long, default_value = "0.0.0.0:8000")]
    gateway_addr: SocketAddr,

    /// Path to the signature verification helper binary
    #[arg(long)]
    sig_helper: PathBuf,

    /// Pipeline poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Per-stage fetch deadline in milliseconds
    #[arg(long, default_value_t = 5000)]
    stage_timeout_ms: u64,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::info!("archived v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = Arc::new(ArchiveStore::open(&args.data_dir)?);
    archive_validator::migrations::run(&store)?;

    let client = Arc::new(
        NodeClient::new(args.node_host.clone(), args.node_port)
            .with_timeout(Duration::from_millis(args.stage_timeout_ms)),
    );
    let verifier = Arc::new(CommandVerifier::new(&args.sig_helper));
    let source: Arc<dyn NodeSource> = client;

    let service = Arc::new(ArchiveService::new(Arc::clone(&store), Arc::clone(&source)));

    let mut archiver = Archiver::new(store, source, verifier)
        .with_poll_interval(Duration::from_millis(args.poll_interval_ms))
        .with_stage_timeout(Duration::from_millis(args.stage_timeout_ms));

    tracing::info!(
        node = %format!("{}:{}", args.node_host, args.node_port),
        "pipeline starting"
    );

    tokio::select! {
        result = archiver.run() => {
            // Only a fatal store failure ends the loop.
            if let Err(e) = result {
                tracing::error!(error = %e, "pipeline failed");
                std::process::exit(1);
            }
            Ok(())
        }
        result = gateway::serve(args.gateway_addr, service) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "gateway failed");
                std::process::exit(1);
            }
            Ok(())
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, stopping");
            Ok(())
        }
    }
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        filter = filter.add_directive(level.parse().expect("static directive"));
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Ctrl+C handler");
    }
}
