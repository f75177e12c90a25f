use crate::models::error::{Result, TimeMachineError};
use log::{debug, error, info};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Service that restarts Home Assistant; it is always dispatched in the background.
pub const RESTART_SERVICE: &str = "homeassistant.restart";

/// Client for the service-call endpoint of the Home Assistant REST API.
#[derive(Clone)]
pub struct HomeAssistantClient {
    client: Client,
    base_url: String,
    token: String,
}

impl fmt::Debug for HomeAssistantClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// What happened to a service call from the caller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Completed,
    Background,
}

pub fn build_http_client(timeout_secs: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

/// `light.turn_on` -> `/api/services/light/turn_on`
pub fn service_path(service: &str) -> Result<String> {
    match service.split_once('.') {
        Some((domain, name)) if !domain.is_empty() && !name.is_empty() => {
            Ok(format!("/api/services/{}/{}", domain, name))
        }
        _ => Err(TimeMachineError::InvalidService(service.to_string())),
    }
}

impl HomeAssistantClient {
    pub fn new(client: Client, base_url: &str, token: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn endpoint(&self, service: &str) -> Result<String> {
        Ok(format!("{}{}", self.base_url, service_path(service)?))
    }

    /// Calls `service` and waits for Home Assistant to answer.
    pub async fn call_service(&self, service: &str) -> Result<()> {
        let url = self.endpoint(service)?;
        debug!("POST {}", url);

        let request = self.client.post(&url).bearer_auth(&self.token);
        let request = if service == RESTART_SERVICE {
            request
        } else {
            request.json(&serde_json::json!({}))
        };
        let response = request.send().await?;

        if response.status().is_success() {
            info!("Home Assistant accepted {}", service);
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(TimeMachineError::Upstream { status, body })
        }
    }

    /// Validates `service` and sends it from a detached task whose outcome is only logged.
    pub fn spawn_service(&self, service: &str) -> Result<()> {
        service_path(service)?;
        let client = self.clone();
        let service = service.to_string();
        tokio::spawn(async move {
            match client.call_service(&service).await {
                Ok(()) => info!("{} initiated successfully in background", service),
                Err(e) => error!("{} failed in background: {}", service, e),
            }
        });
        Ok(())
    }

    /// Restarts are never awaited; other services are unless `background` is set.
    pub async fn invoke(&self, service: &str, background: bool) -> Result<Dispatch> {
        if background || service == RESTART_SERVICE {
            self.spawn_service(service)?;
            Ok(Dispatch::Background)
        } else {
            self.call_service(service).await?;
            Ok(Dispatch::Completed)
        }
    }
}
