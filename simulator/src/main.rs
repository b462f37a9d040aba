use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{default_address, FeedBridge};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ScenarioConfig;
use workflow::runner::FeedModel;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic vessel feed for the vessel map")]
struct Args {
    /// Load the scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    #[arg(long, default_value_t = 40)]
    vessels: usize,
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Advance the fleet, print one snapshot and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Ticks to advance before the offline snapshot
    #[arg(long, default_value_t = 10)]
    ticks: u32,
    /// Write the offline snapshot to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Serve the feed over HTTP until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    address: Option<SocketAddr>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = &args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::from_args(args.vessels, args.seed)
    };
    let tick = config.tick();
    let bridge = FeedBridge::new(FeedModel::new(config));

    if args.offline {
        for _ in 0..args.ticks {
            bridge.advance(tick);
        }
        let snapshot = serde_json::to_string_pretty(&bridge.snapshot())
            .context("encoding offline snapshot")?;
        match &args.output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, snapshot)
                    .with_context(|| format!("writing snapshot to {}", path.display()))?;
            }
            None => println!("{}", snapshot),
        }
        let summary = bridge.summary();
        log::info!(
            "offline run -> {} of {} vessels listed after {} s, {} path points",
            summary.listed,
            summary.vessels,
            summary.clock_s,
            summary.path_points
        );
    }

    if args.serve {
        let address = args.address.unwrap_or_else(default_address);
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for the feed server")?;
        runtime.block_on(async {
            let shutdown = async {
                if let Err(err) = signal::ctrl_c().await {
                    log::warn!("awaiting Ctrl+C failed: {}", err);
                }
            };
            bridge.serve(address, tick, shutdown).await
        })?;
    } else if !args.offline {
        log::warn!("nothing to do: pass --offline or --serve");
    }

    Ok(())
}
