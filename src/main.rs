use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tokio::signal;
use tracing::{error, info};

use labsched_core::{init_logging, AppConfig};
use labsched_dispatcher::Trigger;

mod app;

use app::Application;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("labsched")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Device-lab test schedule and job scheduling service")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("schedule")
                .short('s')
                .long("schedule")
                .value_name("ID")
                .help("Run a single schedule manually, bypassing its suspended flag")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("interval-minutes")
                .short('i')
                .long("interval-minutes")
                .value_name("MINUTES")
                .help("Keep running a cycle every N minutes until interrupted")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config");
    let config = AppConfig::load(config_path.map(|s| s.as_str()))
        .with_context(|| "failed to load configuration")?;

    let log_level = matches
        .get_one::<String>("log-level")
        .unwrap_or(&config.log.level)
        .clone();
    let log_format = matches
        .get_one::<String>("log-format")
        .unwrap_or(&config.log.format)
        .clone();
    init_logging(&log_level, &log_format)?;

    info!("starting device-lab scheduler");

    let app = Application::new(&config).context("failed to initialize application")?;

    if let Some(schedule_id) = matches.get_one::<i64>("schedule") {
        app.run_once(Trigger::Manual(*schedule_id)).await?;
        return Ok(());
    }

    match matches.get_one::<u64>("interval-minutes") {
        None => app.run_once(Trigger::Automatic).await?,
        Some(minutes) => run_periodic(&app, *minutes).await,
    }

    info!("device-lab scheduler exiting");
    Ok(())
}

/// Run a cycle every `minutes` until ctrl-c. Cycles never overlap: the
/// next tick waits for the previous cycle to finish.
async fn run_periodic(app: &Application, minutes: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(minutes * 60));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = app.run_once(Trigger::Automatic).await {
                    error!("scheduling cycle failed: {e}");
                }
            }
            _ = signal::ctrl_c() => {
                info!("received ctrl-c, shutting down");
                break;
            }
        }
    }
}
