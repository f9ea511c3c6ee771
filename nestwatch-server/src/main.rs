//! nestwatch: no-fly-zone drone monitor and pilot violation registry.
//!
//! Polls the drone position feed, flags drones inside the protected zone,
//! resolves them to registered pilots, and serves the rolling violation
//! report over HTTP.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nestwatch_core::{NoFlyZone, ViolationLedger};

mod poller;
mod resolver;
mod web;

use poller::FeedPoller;
use resolver::{HttpPilotLookup, PilotResolver};

#[derive(Parser)]
#[command(name = "nestwatch", version, about = "No-fly-zone drone monitor")]
struct Cli {
    /// Drone position feed URL (XML)
    #[arg(
        long,
        env = "NESTWATCH_FEED_URL",
        default_value = "https://assignments.reaktor.com/birdnest/drones"
    )]
    feed_url: String,

    /// Pilot registry base URL (JSON, keyed by drone serial)
    #[arg(
        long,
        env = "NESTWATCH_PILOTS_URL",
        default_value = "https://assignments.reaktor.com/birdnest/pilots"
    )]
    pilots_url: String,

    /// Address to bind the report server to
    #[arg(long, env = "NESTWATCH_HOST", default_value = "127.0.0.1")]
    host: String,

    #[arg(long, env = "NESTWATCH_PORT", default_value = "8000")]
    port: u16,

    /// Milliseconds between feed polls
    #[arg(long, env = "NESTWATCH_POLL_INTERVAL_MS", default_value = "500")]
    poll_interval_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("nestwatch: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> std::io::Result<()> {
    let ledger = Arc::new(RwLock::new(ViolationLedger::new()));
    let client = reqwest::Client::new();

    let lookup = Arc::new(HttpPilotLookup::new(&cli.pilots_url, client.clone()));
    let resolver = PilotResolver::new(lookup, ledger.clone());

    let poller = FeedPoller::new(
        client,
        cli.feed_url,
        NoFlyZone::default(),
        resolver,
        ledger.clone(),
        Duration::from_millis(cli.poll_interval_ms),
    );

    tokio::spawn(poller.run());

    web::serve(ledger, &cli.host, cli.port).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "nestwatch_server=debug"
    } else {
        "nestwatch_server=info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}
