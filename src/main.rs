//! Noah Monitor
//!
//! Main entry point: the dashboard poll loop, the sensor feed simulator, or a
//! one-shot check of the snapshot directories.

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration as StdDuration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use noah_monitor::config::{self, MonitorConfig};
use noah_monitor::dashboard::{Dashboard, PollKind};
use noah_monitor::ehr::{OperatorCommand, PatientSession};
use noah_monitor::{feed, telemetry, ui};

#[derive(Parser)]
#[command(name = "noah-monitor", version, about = "Single-patient remote vital-signs monitor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Vitals snapshot directory; bed snapshots live in its bed_availability/ subdirectory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the snapshot files and print the dashboard after every poll.
    /// Reads operator input from stdin: `reset`, or a patient update as one JSON line.
    Monitor,
    /// Run the sensor feed simulator
    Feed,
    /// Reload every snapshot once and print the dashboard
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Load configuration
    let mut config = config::load_config().context("Failed to load configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data.bed_dir = dir.join("bed_availability");
        config.data.vitals_dir = dir;
    }

    // Initialize logging
    telemetry::init(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Monitor => monitor(config).await,
        Commands::Feed => feed::run(config.data, config.feed).await,
        Commands::Check => {
            check(config);
            Ok(())
        }
    }
}

fn check(config: MonitorConfig) {
    let now = Local::now().naive_local();
    let mut session = PatientSession::start(&config.data.vitals_dir, now);
    let mut dashboard = Dashboard::new(config);
    let view = dashboard.poll(PollKind::FullReload, &mut session, now);
    print!("{}", ui::render(&view));
}

async fn monitor(config: MonitorConfig) -> anyhow::Result<()> {
    let mut session = PatientSession::start(&config.data.vitals_dir, Local::now().naive_local());
    let mut ticker = tokio::time::interval(StdDuration::from_millis(config.polling.tick_millis.max(10)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut dashboard = Dashboard::new(config);

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    info!("monitor started");
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(view) = dashboard.tick(&mut session, Local::now().naive_local()) {
                    print!("{}", ui::render(&view));
                }
            }
            line = input.next_line(), if input_open => {
                let Some(line) = line.context("Failed to read operator input")? else {
                    input_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let now = Local::now().naive_local();
                match OperatorCommand::parse(&line).and_then(|command| session.apply(command, now)) {
                    Ok(next) => {
                        session = next;
                        print!("{}", ui::render(&dashboard.view(None, &session, now)));
                    }
                    Err(e) => warn!(error = %e, "operator input rejected"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("monitor stopped");
                return Ok(());
            }
        }
    }
}
