use crate::models::config_validator::validate_config;
use crate::models::error::{Result, TimeMachineError};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;

pub const ENV_LIVE_CONFIG_PATH: &str = "LIVE_CONFIG_PATH";
pub const ENV_BACKUP_FOLDER_PATH: &str = "BACKUP_FOLDER_PATH";
pub const ENV_TIMEZONE: &str = "TZ_NAME";
pub const ENV_HA_URL: &str = "HA_URL";
pub const ENV_HA_TOKEN: &str = "HA_TOKEN";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub live_config_path: Option<String>,
    #[serde(default)]
    pub backup_root_path: Option<String>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub home_assistant: HomeAssistantConfig,
    /// Directories every user-supplied path must resolve inside. Empty disables the check.
    #[serde(default = "vec_default")]
    pub allowed_roots: Vec<String>,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "bool_false")]
    pub run_on_startup: bool,
}

#[derive(Clone, Default, Deserialize, Serialize)]
pub struct HomeAssistantConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// The loaded config is logged at debug level; keep the token out of it
impl fmt::Debug for HomeAssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}
const fn vec_default() -> Vec<String> {
    Vec::new()
}
const fn bool_false() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            live_config_path: None,
            backup_root_path: None,
            timezone: default_timezone(),
            home_assistant: HomeAssistantConfig::default(),
            allowed_roots: Vec::new(),
            schedule: None,
            run_on_startup: false,
        }
    }
}

impl Config {
    /// Environment variables win over values from the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = env_value(ENV_LIVE_CONFIG_PATH) {
            self.live_config_path = Some(value);
        }
        if let Some(value) = env_value(ENV_BACKUP_FOLDER_PATH) {
            self.backup_root_path = Some(value);
        }
        if let Some(value) = env_value(ENV_TIMEZONE) {
            self.timezone = value;
        }
        if let Some(value) = env_value(ENV_HA_URL) {
            self.home_assistant.url = Some(value);
        }
        if let Some(value) = env_value(ENV_HA_TOKEN) {
            self.home_assistant.token = Some(value);
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn setup_config(config_file: String) -> Result<Config> {
    let config_path = PathBuf::from(config_file);
    info!("Loading config from: {}", config_path.display());

    let config_str = fs::read_to_string(&config_path).map_err(|cause| {
        TimeMachineError::ConfigRead {
            path: config_path.clone(),
            cause,
        }
    })?;

    let mut config: Config = serde_json::from_str(&config_str).map_err(|cause| {
        TimeMachineError::ConfigParse {
            path: config_path,
            cause,
        }
    })?;

    config.apply_env_overrides();
    validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn clear_env() {
        for key in [
            ENV_LIVE_CONFIG_PATH,
            ENV_BACKUP_FOLDER_PATH,
            ENV_TIMEZONE,
            ENV_HA_URL,
            ENV_HA_TOKEN,
        ] {
            env::remove_var(key);
        }
    }

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    #[serial]
    fn test_load_valid_config_with_all_fields() {
        clear_env();
        let root = tempfile::TempDir::new().unwrap();
        let config_content = format!(
            r#"{{
            "live_config_path": "/config",
            "backup_root_path": "/media/timemachine",
            "timezone": "Europe/Berlin",
            "home_assistant": {{
                "url": "http://homeassistant.local:8123",
                "token": "abc",
                "timeout_secs": 30
            }},
            "allowed_roots": ["{}"],
            "schedule": "0 0 3 * * *",
            "run_on_startup": true
        }}"#,
            root.path().to_str().unwrap().replace('\\', "\\\\")
        );
        let temp_file = write_config(&config_content);

        let config = setup_config(temp_file.path().to_str().unwrap().to_string()).unwrap();

        assert_eq!(config.live_config_path.as_deref(), Some("/config"));
        assert_eq!(config.backup_root_path.as_deref(), Some("/media/timemachine"));
        assert_eq!(config.timezone, "Europe/Berlin");
        assert_eq!(config.home_assistant.timeout_secs, Some(30));
        assert_eq!(config.allowed_roots.len(), 1);
        assert_eq!(config.schedule.as_deref(), Some("0 0 3 * * *"));
        assert!(config.run_on_startup);
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();
        let temp_file = write_config("{}");

        let config = setup_config(temp_file.path().to_str().unwrap().to_string()).unwrap();

        assert_eq!(config.timezone, "UTC");
        assert!(config.live_config_path.is_none());
        assert!(config.home_assistant.url.is_none());
        assert!(config.allowed_roots.is_empty());
        assert!(!config.run_on_startup);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        clear_env();
        let temp_file = write_config(
            r#"{ "live_config_path": "/from/file", "home_assistant": { "url": "http://file:8123" } }"#,
        );
        env::set_var(ENV_LIVE_CONFIG_PATH, "/from/env");
        env::set_var(ENV_HA_TOKEN, "env-token");

        let config = setup_config(temp_file.path().to_str().unwrap().to_string()).unwrap();
        clear_env();

        assert_eq!(config.live_config_path.as_deref(), Some("/from/env"));
        assert_eq!(config.home_assistant.url.as_deref(), Some("http://file:8123"));
        assert_eq!(config.home_assistant.token.as_deref(), Some("env-token"));
    }

    #[test]
    #[serial]
    fn test_error_on_missing_config_file() {
        let result = setup_config("/this/does/not/exist/config.json".to_string());
        assert!(matches!(result, Err(TimeMachineError::ConfigRead { .. })));
    }

    #[test]
    #[serial]
    fn test_error_on_invalid_json() {
        let temp_file = write_config(r#"{ "timezone": "UTC", }"#);
        let result = setup_config(temp_file.path().to_str().unwrap().to_string());
        assert!(matches!(result, Err(TimeMachineError::ConfigParse { .. })));
    }

    #[test]
    #[serial]
    fn test_error_on_invalid_timezone() {
        clear_env();
        let temp_file = write_config(r#"{ "timezone": "Mars/Olympus_Mons" }"#);
        let result = setup_config(temp_file.path().to_str().unwrap().to_string());
        assert!(matches!(result, Err(TimeMachineError::InvalidConfig(_))));
    }

    #[test]
    fn test_debug_output_hides_token() {
        let config = Config {
            home_assistant: HomeAssistantConfig {
                url: Some("http://ha.local:8123".to_string()),
                token: Some("very-secret-token".to_string()),
                timeout_secs: None,
            },
            ..Config::default()
        };
        let printed = format!("{:?}", config);
        assert!(printed.contains("http://ha.local:8123"));
        assert!(!printed.contains("very-secret-token"));
    }
}
