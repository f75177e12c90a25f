use crate::models::config::Config;
use crate::models::error::{Result, TimeMachineError};
use crate::service::home_assistant::{build_http_client, HomeAssistantClient};
use crate::utils::path_guard::PathGuard;
use reqwest::Client;
use std::path::PathBuf;

/// Shared application state. Holds only startup configuration; requests keep nothing here.
#[derive(Clone)]
pub struct AppState {
    config: Config,
    guard: PathGuard,
    http: Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let guard = PathGuard::new(&config.allowed_roots)?;
        let http = build_http_client(config.home_assistant.timeout_secs)?;
        Ok(Self {
            config,
            guard,
            http,
        })
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Request value if given, otherwise the configured live config directory.
    pub fn live_config_path(&self, requested: Option<&str>, field: &str) -> Result<PathBuf> {
        let path = pick(requested, self.config.live_config_path.as_deref())
            .ok_or_else(|| missing(field))?;
        self.guard.check(path)
    }

    /// Request value if given, otherwise the configured backup root.
    pub fn backup_root_path(&self, requested: Option<&str>, field: &str) -> Result<PathBuf> {
        let path = pick(requested, self.config.backup_root_path.as_deref())
            .ok_or_else(|| missing(field))?;
        self.guard.check(path)
    }

    pub fn timezone(&self, requested: Option<&str>) -> String {
        pick(requested, Some(self.config.timezone.as_str()))
            .unwrap_or("UTC")
            .to_string()
    }

    pub fn home_assistant(
        &self,
        url: Option<&str>,
        token: Option<&str>,
    ) -> Result<HomeAssistantClient> {
        let url = pick(url, self.config.home_assistant.url.as_deref())
            .ok_or_else(|| missing("haUrl"))?;
        let token = pick(token, self.config.home_assistant.token.as_deref())
            .ok_or_else(|| missing("haToken"))?;
        Ok(HomeAssistantClient::new(self.http.clone(), url, token))
    }
}

fn pick<'a>(requested: Option<&'a str>, configured: Option<&'a str>) -> Option<&'a str> {
    requested
        .filter(|v| !v.trim().is_empty())
        .or(configured.filter(|v| !v.trim().is_empty()))
}

pub fn missing(field: &str) -> TimeMachineError {
    TimeMachineError::MissingParameters(format!("Missing required parameter: {}", field))
}
