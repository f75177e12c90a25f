use crate::models::config::Config;
use crate::models::error::{Result, TimeMachineError};
use crate::service::backup::parse_timezone;
use log::{info, warn};
use std::path::Path;
use std::str::FromStr;

/// Validates the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    info!("Validating configuration...");

    validate_timezone(&config.timezone)?;
    validate_schedule(config)?;
    validate_home_assistant(config)?;
    validate_allowed_roots(&config.allowed_roots)?;
    warn_missing_paths(config);

    info!("Configuration validation passed");
    Ok(())
}

fn validate_timezone(timezone: &str) -> Result<()> {
    parse_timezone(timezone).map(|_| ()).map_err(|_| {
        TimeMachineError::InvalidConfig(format!(
            "Unknown timezone '{}'. Use an IANA name such as 'Europe/London' or 'UTC'",
            timezone
        ))
    })
}

/// Validate schedule configuration
fn validate_schedule(config: &Config) -> Result<()> {
    if let Some(schedule_str) = &config.schedule {
        match cron::Schedule::from_str(schedule_str) {
            Ok(_) => {
                info!("Schedule validated: {}", schedule_str);
            }
            Err(e) => {
                return Err(TimeMachineError::InvalidConfig(format!(
                    "Invalid cron expression in schedule: {}\nError: {}\nExample: '0 0 3 * * *' for daily at 3am",
                    schedule_str, e
                )));
            }
        }

        if config.live_config_path.is_none() || config.backup_root_path.is_none() {
            return Err(TimeMachineError::InvalidConfig(
                "A schedule requires both live_config_path and backup_root_path".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_home_assistant(config: &Config) -> Result<()> {
    if let Some(url) = &config.home_assistant.url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TimeMachineError::InvalidConfig(format!(
                "Home Assistant url must start with http:// or https://: {}",
                url
            )));
        }
        if config.home_assistant.token.is_none() {
            warn!("Home Assistant url is set without a token; requests must supply haToken");
        }
    }
    if config.home_assistant.timeout_secs == Some(0) {
        return Err(TimeMachineError::InvalidConfig(
            "home_assistant.timeout_secs must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_allowed_roots(roots: &[String]) -> Result<()> {
    for (idx, root) in roots.iter().enumerate() {
        let path = Path::new(root);
        if !path.is_dir() {
            return Err(TimeMachineError::InvalidConfig(format!(
                "Allowed root #{} is not an existing directory: {}",
                idx + 1,
                root
            )));
        }
    }
    Ok(())
}

fn warn_missing_paths(config: &Config) {
    if let Some(live) = &config.live_config_path {
        if !Path::new(live).is_dir() {
            warn!("Configured live_config_path does not exist yet: {}", live);
        }
    }
}
