use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::HttpConfig;
use crate::models::{
    GeneralStatistics, Station, StationsResponse, StatsResponse, Vehicle, VehiclesResponse,
    VersionResponse,
};

#[derive(Debug, Error)]
pub enum CpError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("API error: {0}")]
    ApiError(String),
}

/// Proxy API request log for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct ApiRequestLog {
    /// Unique request ID
    pub id: String,
    /// Timestamp when request was made
    pub timestamp: String,
    /// API endpoint called
    pub endpoint: String,
    /// Duration of request in milliseconds
    pub duration_ms: u64,
    /// HTTP status code (0 when the request never got a response)
    pub status: u16,
    /// Response size in bytes
    pub response_size: Option<usize>,
    /// Error message if request failed
    pub error: Option<String>,
}

/// Sender for proxy request diagnostics
pub type ApiRequestSender = broadcast::Sender<ApiRequestLog>;

/// Client for the live map proxy endpoints
pub struct CpClient {
    client: Client,
    base_url: String,
    /// Sender for request diagnostics
    diagnostics_tx: ApiRequestSender,
}

impl CpClient {
    pub fn new(
        base_url: String,
        http: &HttpConfig,
        diagnostics_tx: ApiRequestSender,
    ) -> Result<Self, CpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .build()
            .map_err(|e| CpError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            diagnostics_tx,
        })
    }

    /// Send a diagnostics log entry
    fn log_request(&self, log: ApiRequestLog) {
        // Ignore send errors - they just mean no one is listening
        let _ = self.diagnostics_tx.send(log);
    }

    /// Fetch the current vehicle snapshot
    pub async fn get_vehicles(&self) -> Result<Vec<Vehicle>, CpError> {
        let response: VehiclesResponse = self.get_json("/api/vehicles").await?;
        Ok(response.into_vehicles())
    }

    /// Fetch the station index
    pub async fn get_stations(&self) -> Result<Vec<Station>, CpError> {
        let response: StationsResponse = self.get_json("/api/stations").await?;
        Ok(response.stations)
    }

    /// Fetch aggregate network statistics
    pub async fn get_stats(&self) -> Result<GeneralStatistics, CpError> {
        let response: StatsResponse = self.get_json("/api/stats").await?;
        Ok(response.stats)
    }

    /// Fetch the version the server expects clients to run
    pub async fn get_version(&self) -> Result<String, CpError> {
        let response: VersionResponse = self.get_json("/api/version").await?;
        Ok(response.version)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CpError> {
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();
        let url = format!("{}{}", self.base_url, endpoint);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                self.log_request(ApiRequestLog {
                    id: request_id,
                    timestamp: Utc::now().to_rfc3339(),
                    endpoint: endpoint.to_string(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    status: 0,
                    response_size: None,
                    error: Some(e.to_string()),
                });
                return Err(CpError::NetworkError(e.to_string()));
            }
        };

        let status = response.status().as_u16();

        if !response.status().is_success() {
            self.log_request(ApiRequestLog {
                id: request_id,
                timestamp: Utc::now().to_rfc3339(),
                endpoint: endpoint.to_string(),
                duration_ms: start.elapsed().as_millis() as u64,
                status,
                response_size: None,
                error: Some(format!("HTTP error: {}", status)),
            });
            return Err(CpError::ApiError(format!("HTTP error: {}", status)));
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                self.log_request(ApiRequestLog {
                    id: request_id,
                    timestamp: Utc::now().to_rfc3339(),
                    endpoint: endpoint.to_string(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    status,
                    response_size: None,
                    error: Some(format!("Failed to read body: {}", e)),
                });
                return Err(CpError::NetworkError(e.to_string()));
            }
        };

        let response_size = body.len();
        let result: Result<T, _> = serde_json::from_str(&body);

        match &result {
            Ok(_) => {
                self.log_request(ApiRequestLog {
                    id: request_id,
                    timestamp: Utc::now().to_rfc3339(),
                    endpoint: endpoint.to_string(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    status,
                    response_size: Some(response_size),
                    error: None,
                });
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse response from {}: {} - body: {}",
                    endpoint,
                    e,
                    &body[..body.len().min(500)]
                );
                self.log_request(ApiRequestLog {
                    id: request_id,
                    timestamp: Utc::now().to_rfc3339(),
                    endpoint: endpoint.to_string(),
                    duration_ms: start.elapsed().as_millis() as u64,
                    status,
                    response_size: Some(response_size),
                    error: Some(format!("Parse error: {}", e)),
                });
            }
        }

        result.map_err(|e| CpError::ParseError(e.to_string()))
    }
}
