mod api_routes;
mod api_state;
mod models;
mod service;
mod utils;

use crate::models::config::{setup_config, Config};
use crate::service::backup::create_backup;
use crate::utils::progress::create_spinner;
use anyhow::{bail, Context, Result};
use api_state::AppState;
use clap::Parser;
use log::{debug, info, warn};
use std::path::Path;

#[macro_use]
extern crate rocket;

pub(crate) fn build_rocket(app_state: AppState) -> rocket::Rocket<rocket::Build> {
    rocket::build()
        .manage(app_state)
        .register("/api", catchers![api_routes::default_catcher])
        .mount(
            "/api",
            routes![
                api_routes::backup_now,
                api_routes::scan_backups_endpoint,
                api_routes::get_backup_lovelace,
                api_routes::get_backup_lovelace_file,
                api_routes::get_live_lovelace_file,
                api_routes::restore_lovelace_file,
                api_routes::get_live_items_endpoint,
                api_routes::reload_home_assistant,
                api_routes::restart_home_assistant,
                api_routes::health_check,
            ],
        )
}

#[rocket::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(parse_log_level(&args.log_level))
        .format_timestamp_secs()
        .init();

    if args.api_mode {
        let config = load_server_config(&args.config_file);
        let app_state = AppState::new(config).context("Failed to initialise application state")?;
        build_rocket(app_state).launch().await?;
        Ok(())
    } else {
        tokio::task::spawn_blocking(move || cli_main(args))
            .await
            .context("Backup task panicked")?
    }
}

#[derive(Parser)]
#[command(name = "ha-time-machine")]
#[command(about = "Snapshot, browse and restore Home Assistant configuration", long_about = None)]
struct Cli {
    #[arg(
        short = 'c',
        long = "config",
        default_value = "config.json",
        env = "TIME_MACHINE_CONFIG"
    )]
    config_file: String,

    #[arg(
        short = 'l',
        long = "log-level",
        default_value = "info",
        env = "LOG_LEVEL"
    )]
    log_level: String,

    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    #[arg(short = 'v', long = "validate-only")]
    validate_only: bool,

    #[arg(short = 'o', long = "once")]
    once: bool,

    #[arg(long = "api")]
    api_mode: bool,
}

fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    }
}

/// Strips any surrounding quotes from the config file path
fn config_file_path(config_file: &str) -> String {
    config_file
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// The server can run without a config file; every path then comes from the requests.
fn load_server_config(config_file: &str) -> Config {
    let path = config_file_path(config_file);

    match setup_config(path.clone()) {
        Ok(config) => {
            info!("Loaded configuration from: {}", path);
            config
        }
        Err(e) => {
            warn!(
                "Failed to load config from: {}. Error: {}",
                path, e
            );
            warn!("Starting with default configuration and environment overrides.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    }
}

fn cli_main(args: Cli) -> Result<()> {
    info!("ha-time-machine starting...");
    let config =
        setup_config(config_file_path(&args.config_file)).context("Failed to load configuration")?;
    debug!("Loaded config: {:?}", &config);

    if args.validate_only {
        info!("Configuration is valid. Exiting (--validate-only mode).");
        return Ok(());
    }

    let run_once = args.once || config.schedule.is_none();

    if run_once {
        run_backup(&config, args.quiet)
    } else {
        run_scheduled(&config, args.quiet)
    }
}

fn run_backup(config: &Config, quiet: bool) -> Result<()> {
    let (Some(live), Some(root)) = (
        config.live_config_path.as_deref(),
        config.backup_root_path.as_deref(),
    ) else {
        bail!("live_config_path and backup_root_path must be configured to run a backup");
    };

    let spinner = (!quiet).then(|| create_spinner(&format!("Backing up {}...", live)));

    let report = create_backup(Path::new(live), Path::new(root), &config.timezone)
        .with_context(|| format!("Failed to back up {}", live))?;

    for warning in &report.warnings {
        warn!("Skipped during backup: {}", warning);
    }
    if let Some(spinner) = spinner {
        spinner.finish_with_message(format!(
            "Backup created at {} ({} yaml, {} dashboard files)",
            report.backup_dir.display(),
            report.yaml_files.len(),
            report.dashboard_files.len()
        ));
    }
    Ok(())
}

fn run_scheduled(config: &Config, quiet: bool) -> Result<()> {
    use chrono::Utc;
    use cron::Schedule;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    let Some(schedule_str) = config.schedule.as_ref() else {
        bail!("No schedule configured");
    };
    let schedule = Schedule::from_str(schedule_str).context("Invalid cron expression")?;

    info!(
        "Starting scheduled backup mode with schedule: {}",
        schedule_str
    );

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping scheduler...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    if config.run_on_startup {
        info!("Running initial backup on startup...");
        if let Err(e) = run_backup(config, quiet) {
            warn!("Initial backup failed: {:#}", e);
        }
    }

    while running.load(Ordering::SeqCst) {
        let Some(next) = schedule.upcoming(Utc).next() else {
            warn!("No upcoming scheduled times found");
            break;
        };
        info!(
            "Next backup scheduled for: {}",
            next.format("%Y-%m-%d %H:%M:%S %Z")
        );

        // Check the shutdown flag every second until the next run is due
        while running.load(Ordering::SeqCst) && Utc::now() < next {
            let remaining = (next - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(0));
            std::thread::sleep(remaining.min(std::time::Duration::from_secs(1)));
        }

        if running.load(Ordering::SeqCst) {
            info!("Running scheduled backup...");
            if let Err(e) = run_backup(config, quiet) {
                warn!("Scheduled backup failed: {:#}", e);
            }
        }
    }

    info!("Scheduler stopped");
    Ok(())
}
