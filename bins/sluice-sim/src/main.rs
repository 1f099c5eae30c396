//! sluice-sim: Replay workloads against a Sluice reward pool.
//!
//! `run` replays a scripted scenario file; `random` generates a seeded
//! workload. Both print a JSON report with the final conservation audit.

mod random;
mod runner;
mod scenario;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use sluice_core::types::PoolKind;
use tracing::info;

use crate::random::Workload;
use crate::runner::{SimReport, Simulation};
use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(
    name = "sluice-sim",
    version,
    about = "Replay scripted or random workloads against a Sluice reward pool"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scenario file (TOML or JSON).
    Run {
        /// Scenario file
        #[arg(long)]
        scenario: PathBuf,

        /// Print every ledger event as a JSON line while replaying
        #[arg(long)]
        events: bool,

        /// Abort on the first rejected step
        #[arg(long)]
        strict: bool,
    },
    /// Run a seeded random workload and check the books balance.
    Random {
        #[arg(long, value_enum, default_value_t = KindArg::Stake)]
        kind: KindArg,

        #[arg(long, default_value_t = 8)]
        participants: usize,

        #[arg(long, default_value_t = 1_000)]
        steps: usize,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Stake,
    Headcount,
}

impl From<KindArg> for PoolKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Stake => PoolKind::Stake,
            KindArg::Headcount => PoolKind::Headcount,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, &cli.log_format);

    let report = match cli.command {
        Command::Run {
            scenario,
            events,
            strict,
        } => run_scenario(&scenario, events, strict)?,
        Command::Random {
            kind,
            participants,
            steps,
            seed,
        } => run_random(&Workload {
            kind: kind.into(),
            participants,
            steps,
            seed,
        })?,
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing report")?
    );
    if !report.balanced {
        bail!("conservation audit failed for pool {}", report.pool);
    }
    Ok(())
}

fn run_scenario(path: &Path, print_events: bool, strict: bool) -> Result<SimReport> {
    let scenario = Scenario::load(path)?;
    info!(path = %path.display(), steps = scenario.steps.len(), "sim: scenario loaded");

    let mut sim = Simulation::new(&scenario.pool, scenario.start, strict)?;
    for f in &scenario.funding {
        sim.fund(&f.who, f.amount);
    }
    for step in &scenario.steps {
        sim.apply(step)?;
        if print_events {
            for event in sim.drain_events() {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }
    sim.report()
}

fn run_random(w: &Workload) -> Result<SimReport> {
    let config = random::pool_config(w.kind);
    let mut sim = Simulation::new(&config, scenario::DEFAULT_START, false)?;
    for i in 0..w.participants {
        sim.fund(&random::participant_name(i), random::PARTICIPANT_FUNDS);
    }
    for step in random::generate(w) {
        sim.apply(&step)?;
    }
    let report = sim.report()?;
    info!(
        seed = w.seed,
        steps = report.steps,
        rejected = report.rejected.len(),
        "sim: random workload finished"
    );
    Ok(report)
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// Logs go to stderr so the JSON report on stdout stays machine-readable.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
