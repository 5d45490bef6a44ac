//! HTTP client for the measurement backend.
//!
//! The backend owns the serial device and the filter chain; this client only
//! relays operator commands and data. Four endpoints exist: port listing,
//! port selection, filter configuration, and data persistence. Payload shapes
//! mirror the backend exactly and are pinned by serde renames.

use crate::core::FilterConfig;
use serde::{Deserialize, Serialize};

/// Backend connection parameters.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend host (default: 127.0.0.1)
    pub host: String,
    /// Backend port
    pub port: u16,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Get the backend base URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Endpoint for the persistent sample stream.
    pub fn stream_url(&self) -> String {
        format!("{}/stream", self.url())
    }

    /// Endpoint listing available serial ports.
    pub fn list_ports_url(&self) -> String {
        format!("{}/list_ports", self.url())
    }

    /// Endpoint selecting the serial port to read from.
    pub fn select_port_url(&self) -> String {
        format!("{}/select_port", self.url())
    }

    /// Endpoint receiving filter configuration updates.
    pub fn update_filters_url(&self) -> String {
        format!("{}/update_filters", self.url())
    }

    /// Endpoint persisting the current window to a file.
    pub fn save_data_url(&self) -> String {
        format!("{}/save_data", self.url())
    }
}

/// Backend client error types.
#[derive(Debug)]
pub enum BackendError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Backend returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "Backend config error: {msg}"),
            BackendError::Network(msg) => write!(f, "Backend network error: {msg}"),
            BackendError::Server { status, message } => {
                write!(f, "Backend server error ({status}): {message}")
            }
            BackendError::Serialization(msg) => write!(f, "Backend serialization error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Body of `POST /select_port`.
#[derive(Debug, Clone, Serialize)]
struct SelectPortRequest<'a> {
    port: &'a str,
}

/// Response from `POST /select_port`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectPortResponse {
    /// Human-readable connection status
    pub status: String,
}

/// Body of `POST /save_data`: the window nested under `data`.
#[derive(Debug, Clone, Serialize)]
pub struct SaveDataRequest<'a> {
    pub data: SavePayload<'a>,
}

/// The persisted window contents.
#[derive(Debug, Clone, Serialize)]
pub struct SavePayload<'a> {
    pub raw: &'a [f64],
    pub filtered: &'a [f64],
}

/// Response from `POST /save_data`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveDataResponse {
    /// Human-readable outcome
    pub message: String,
}

/// Async client for the measurement backend.
pub struct BackendClient {
    config: BackendConfig,
    client: reqwest::Client,
}

impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// List the serial ports visible to the backend.
    pub async fn list_ports(&self) -> Result<Vec<String>, BackendError> {
        let response = self
            .client
            .get(self.config.list_ports_url())
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }

    /// Ask the backend to start reading from the given serial port.
    pub async fn select_port(&self, port: &str) -> Result<SelectPortResponse, BackendError> {
        let response = self
            .client
            .post(self.config.select_port_url())
            .json(&SelectPortRequest { port })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }

    /// Push a filter configuration. The response body is implementation
    /// defined; callers log it and move on.
    pub async fn update_filters(
        &self,
        filters: &FilterConfig,
    ) -> Result<serde_json::Value, BackendError> {
        let response = self
            .client
            .post(self.config.update_filters_url())
            .json(filters)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }

    /// Relay the current window to the backend for file persistence.
    pub async fn save_data(
        &self,
        raw: &[f64],
        filtered: &[f64],
    ) -> Result<SaveDataResponse, BackendError> {
        let response = self
            .client
            .post(self.config.save_data_url())
            .json(&SaveDataRequest {
                data: SavePayload { raw, filtered },
            })
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

/// Blocking backend client for use in synchronous contexts.
pub struct BlockingBackendClient {
    inner: BackendClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingBackendClient {
    /// Create a new blocking backend client.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: BackendClient::new(config)?,
            runtime,
        })
    }

    /// List the serial ports visible to the backend.
    pub fn list_ports(&self) -> Result<Vec<String>, BackendError> {
        self.runtime.block_on(self.inner.list_ports())
    }

    /// Ask the backend to start reading from the given serial port.
    pub fn select_port(&self, port: &str) -> Result<SelectPortResponse, BackendError> {
        self.runtime.block_on(self.inner.select_port(port))
    }

    /// Push a filter configuration.
    pub fn update_filters(&self, filters: &FilterConfig) -> Result<serde_json::Value, BackendError> {
        self.runtime.block_on(self.inner.update_filters(filters))
    }

    /// Relay the current window to the backend for file persistence.
    pub fn save_data(&self, raw: &[f64], filtered: &[f64]) -> Result<SaveDataResponse, BackendError> {
        self.runtime.block_on(self.inner.save_data(raw, filtered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_urls() {
        let config = BackendConfig::new("127.0.0.1", 5000);
        assert_eq!(config.url(), "http://127.0.0.1:5000");
        assert_eq!(config.stream_url(), "http://127.0.0.1:5000/stream");
        assert_eq!(config.list_ports_url(), "http://127.0.0.1:5000/list_ports");
        assert_eq!(config.select_port_url(), "http://127.0.0.1:5000/select_port");
        assert_eq!(
            config.update_filters_url(),
            "http://127.0.0.1:5000/update_filters"
        );
        assert_eq!(config.save_data_url(), "http://127.0.0.1:5000/save_data");
    }

    #[test]
    fn test_save_body_nests_under_data() {
        let raw = [1.0, 2.0];
        let filtered = [0.5, 1.5];
        let body = SaveDataRequest {
            data: SavePayload {
                raw: &raw,
                filtered: &filtered,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["data"]["raw"][1], 2.0);
        assert_eq!(json["data"]["filtered"][0], 0.5);
    }

    #[test]
    fn test_select_port_body_shape() {
        let json = serde_json::to_value(SelectPortRequest { port: "COM3" }).unwrap();
        assert_eq!(json, serde_json::json!({"port": "COM3"}));
    }
}
