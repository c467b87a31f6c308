use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crewwatch_core::error::CrewError;
use crewwatch_core::gateway::CrewGateway;
use crewwatch_core::model::{Agent, CommandKind, CrewStats, CrewStatus, Endpoint};

use crate::config::HttpGatewayConfig;

/// Failure to construct an [`HttpGateway`].
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Crew engine gateway over JSON/HTTP.
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

/// Path of a polled endpoint relative to the base URL.
pub fn endpoint_path(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Agents => "/agents",
        Endpoint::CrewStatus => "/crew/status",
        Endpoint::CrewStats => "/crew/stats",
    }
}

/// Path of a command endpoint relative to the base URL.
pub fn command_path(kind: CommandKind) -> &'static str {
    match kind {
        CommandKind::Start => "/crew/start",
        CommandKind::Stop => "/crew/stop",
    }
}

impl HttpGateway {
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayBuildError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let parsed =
            reqwest::Url::parse(&base_url).map_err(|e| GatewayBuildError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayBuildError::InvalidBaseUrl {
                url: config.base_url,
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CrewError> {
        let resp = self
            .client
            .get(self.url(path))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(path, status = status.as_u16(), "crew engine returned error status");
            return Err(CrewError::ServerError(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(classify)?;
        serde_json::from_slice(&body).map_err(|e| CrewError::MalformedResponse(e.to_string()))
    }
}

impl CrewGateway for HttpGateway {
    async fn fetch_agents(&self) -> Result<Vec<Agent>, CrewError> {
        self.get_json(endpoint_path(Endpoint::Agents)).await
    }

    async fn fetch_crew_status(&self) -> Result<CrewStatus, CrewError> {
        self.get_json(endpoint_path(Endpoint::CrewStatus)).await
    }

    async fn fetch_crew_stats(&self) -> Result<CrewStats, CrewError> {
        self.get_json(endpoint_path(Endpoint::CrewStats)).await
    }

    async fn send_command(&self, kind: CommandKind) -> Result<(), CrewError> {
        let resp = self
            .client
            .post(self.url(command_path(kind)))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            tracing::debug!(command = %kind, status = status.as_u16(), detail, "command not acknowledged");
            return Err(CrewError::ServerError(status.as_u16()));
        }
        Ok(())
    }
}

/// Map a transport error onto the gateway failure taxonomy.
fn classify(err: reqwest::Error) -> CrewError {
    if err.is_timeout() {
        CrewError::Timeout
    } else if err.is_decode() {
        CrewError::MalformedResponse(err.to_string())
    } else if let Some(status) = err.status() {
        CrewError::ServerError(status.as_u16())
    } else {
        CrewError::NetworkUnreachable(err.to_string())
    }
}
