//! HTTP transport for reading status endpoints from the backend

use crate::errors::{PollerError, Result};
use crate::models::{HealthState, MetricsState, ServicesState};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of the three status resources a fetch cycle reads
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_health(&self) -> Result<HealthState>;
    async fn fetch_metrics(&self) -> Result<MetricsState>;
    async fn fetch_services(&self) -> Result<ServicesState>;
}

/// Backend resource polled by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Metrics,
    Services,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Health => "/health",
            Endpoint::Metrics => "/metrics",
            Endpoint::Services => "/services",
        }
    }

    /// Error reported when this endpoint answers badly
    pub fn check_failure(&self) -> PollerError {
        match self {
            Endpoint::Health => PollerError::HealthCheckFailed,
            Endpoint::Metrics => PollerError::MetricsCheckFailed,
            Endpoint::Services => PollerError::ServicesCheckFailed,
        }
    }
}

/// reqwest backed status source
#[derive(Debug, Clone)]
pub struct HttpStatusClient {
    client: Client,
    base_url: String,
}

impl HttpStatusClient {
    /// Create a client for endpoints under `base_url`
    pub fn new(base_url: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("status_poller/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(PollerError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| PollerError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} answered with status {}", url, status);
            return Err(endpoint.check_failure());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PollerError::NetworkFailure(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!("{} returned an unreadable body: {}", url, e);
            endpoint.check_failure()
        })
    }
}

#[async_trait]
impl StatusSource for HttpStatusClient {
    async fn fetch_health(&self) -> Result<HealthState> {
        self.get_json(Endpoint::Health).await
    }

    async fn fetch_metrics(&self) -> Result<MetricsState> {
        self.get_json(Endpoint::Metrics).await
    }

    async fn fetch_services(&self) -> Result<ServicesState> {
        self.get_json(Endpoint::Services).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpStatusClient {
        HttpStatusClient::new(format!("{}/api", server.uri()), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_client_creation_trims_trailing_slash() {
        let client =
            HttpStatusClient::new("http://localhost/api/".to_string(), Duration::from_secs(10))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost/api");
    }

    #[tokio::test]
    async fn test_fetch_sends_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .and(header("accept", "application/json"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy", "timestamp": 1700000000})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let health = client_for(&server).fetch_health().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.timestamp, Some(1700000000.0));
    }

    #[tokio::test]
    async fn test_non_success_maps_to_check_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/metrics"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_metrics().await.unwrap_err();
        assert!(matches!(err, PollerError::MetricsCheckFailed));
        let err = client.fetch_services().await.unwrap_err();
        assert!(matches!(err, PollerError::ServicesCheckFailed));
    }

    #[tokio::test]
    async fn test_malformed_json_maps_to_check_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_health().await.unwrap_err();
        assert!(matches!(err, PollerError::HealthCheckFailed));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        // Nothing listens on port 1.
        let client =
            HttpStatusClient::new("http://127.0.0.1:1/api".to_string(), Duration::from_secs(2))
                .unwrap();

        let err = client.fetch_health().await.unwrap_err();
        assert!(matches!(err, PollerError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out_as_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy"}))
                    .set_delay(Duration::from_millis(1500)),
            )
            .mount(&server)
            .await;

        let client =
            HttpStatusClient::new(format!("{}/api", server.uri()), Duration::from_millis(200))
                .unwrap();
        let err = client.fetch_health().await.unwrap_err();
        assert!(matches!(err, PollerError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn test_services_parsing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/services"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "services": {"web": "http://host:3000", "api": "http://host:8080"}
            })))
            .mount(&server)
            .await;

        let services = client_for(&server).fetch_services().await.unwrap();
        assert_eq!(services.services.len(), 2);
        assert_eq!(services.services["web"], "http://host:3000");
    }
}
