//! Spicerig - batch driver for the external SPICE simulator
//!
//! Takes a base netlist, applies parameter overrides, and either prints
//! the merged netlist or runs it through the simulator and summarizes
//! the result.
//!
//! # Usage
//!
//! ```bash
//! spicerig ndr_osc.net --set RL=75 --set TD=5n --timeout 120
//! spicerig ndr_osc.net --set RL=75 --dry-run
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use spicerig_core::{
    netlist::{param, Document},
    runner::{RunnerConfig, SpiceRunner},
    Result,
};

/// Batch driver for the external SPICE simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the base netlist file (.net)
    #[arg(value_name = "NETLIST_FILE")]
    netlist_file: PathBuf,

    /// Parameter override, NAME=VALUE (repeatable)
    #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_override)]
    set: Vec<(String, String)>,

    /// Path to the simulator executable
    #[arg(long, value_name = "PATH")]
    exe: Option<PathBuf>,

    /// Directory for netlists and output artifacts
    #[arg(long, value_name = "DIR")]
    sim_dir: Option<PathBuf>,

    /// Per-run deadline in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Print the merged netlist instead of running it
    #[arg(long)]
    dry_run: bool,
}

fn parse_override(text: &str) -> std::result::Result<(String, String), String> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", text)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load the base netlist and merge the overrides
    let base = Document::from_file(&args.netlist_file)?;
    let overrides: Vec<_> = args
        .set
        .iter()
        .map(|(name, value)| param(name, value))
        .collect();
    let document = base.insert_many(overrides);

    if args.dry_run {
        println!("{}", document);
        return Ok(());
    }

    let mut config = RunnerConfig::new();
    if let Some(exe) = args.exe {
        config = config.with_executable(exe);
    }
    if let Some(sim_dir) = args.sim_dir {
        config = config.with_sim_dir(sim_dir);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }

    let mut runner = SpiceRunner::new(config);
    let result = runner.execute(&document)?;

    println!("status: {}", result.status);
    if let Some(seconds) = result.total_seconds {
        println!("total: {:.3}s", seconds);
    }
    let mut names: Vec<&String> = result.fields.keys().collect();
    names.sort();
    for name in names {
        println!("{}: {}", name, result.fields[name]);
    }
    for line in &result.diagnostics {
        println!("log | {}", line);
    }

    Ok(())
}
