mod app;
mod layout;
mod metrics;
mod relation;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};
use tracing_subscriber::EnvFilter;

use crate::app::{AppConfig, LineageApp};
use crate::relation::RelationSource;

/// Interactive lineage viewer for WaveKit streaming databases.
#[derive(Debug, Parser)]
#[command(author, version, about)]
#[command(group(
    ArgGroup::new("relations")
        .required(true)
        .args(["snapshot", "console_url"]),
))]
struct Args {
    /// Relation snapshot JSON file to visualize.
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    /// Console base URL to fetch the relation snapshot from.
    #[arg(long, value_name = "URL")]
    console_url: Option<String>,

    /// Database to request from the console (console source only).
    #[arg(long)]
    database: Option<String>,

    /// Metrics API base URL for throughput polling.
    #[arg(long, value_name = "URL")]
    metrics_url: Option<String>,

    /// Cluster whose throughput series should be polled.
    #[arg(long)]
    cluster: Option<String>,

    /// Seconds between throughput polls.
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let relation_source = match (args.snapshot, args.console_url) {
        (Some(path), _) => RelationSource::Snapshot(path),
        (None, Some(base_url)) => RelationSource::Console {
            base_url,
            database: args.database,
        },
        // clap's "relations" group guarantees one of the two flags is present.
        (None, None) => unreachable!("a relation source flag is required"),
    };

    let config = AppConfig {
        relation_source,
        metrics_url: args.metrics_url,
        cluster_id: args.cluster,
        poll_interval: Duration::from_secs(args.poll_interval_secs.max(1)),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "WaveKit Lineage",
        options,
        Box::new(move |cc| Ok(Box::new(LineageApp::new(cc, config)))),
    )
}
