//! HTTP core of the Sandwich API client.
//!
//! One [`SandwichClient`] holds the reqwest client, the API server base URL
//! and the session token. Per-kind clients borrow it and express endpoints;
//! this module owns transport concerns: auth headers, bounded timeouts, a
//! retry loop for transient failures, and the mapping from HTTP statuses to
//! the error taxonomy.

use std::time::Duration;

use reqwest::{Client, Method, Response, header};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{ApiError, ProvisionError, Result};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Sandwich control-plane API client.
#[derive(Debug, Clone)]
pub struct SandwichClient {
    /// HTTP client.
    client: Client,
    /// API server base URL, without a trailing slash.
    api_server: String,
    /// Session token.
    token: String,
}

impl SandwichClient {
    /// Creates a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_server: &str, token: &str) -> Result<Self> {
        Self::with_timeout(api_server, token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(api_server: &str, token: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_server: api_server.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Returns the configured API server base URL.
    #[must_use]
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// Issues a GET and decodes the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        let response = self.execute(&Method::GET, path, None, kind, id).await?;
        Self::decode(response).await
    }

    /// Issues a POST with a JSON body and decodes the JSON response.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        let response = self
            .execute(&Method::POST, path, Some(body), kind, id)
            .await?;
        Self::decode(response).await
    }

    /// Issues a POST with a JSON body, ignoring the response body.
    pub(crate) async fn post_empty(
        &self,
        path: &str,
        body: &serde_json::Value,
        kind: &'static str,
        id: &str,
    ) -> Result<()> {
        self.execute(&Method::POST, path, Some(body), kind, id)
            .await?;
        Ok(())
    }

    /// Issues a PUT with a JSON body, ignoring the response body.
    pub(crate) async fn put_empty(
        &self,
        path: &str,
        body: &serde_json::Value,
        kind: &'static str,
        id: &str,
    ) -> Result<()> {
        self.execute(&Method::PUT, path, Some(body), kind, id)
            .await?;
        Ok(())
    }

    /// Issues a DELETE, ignoring the response body.
    pub(crate) async fn delete(&self, path: &str, kind: &'static str, id: &str) -> Result<()> {
        self.execute(&Method::DELETE, path, None, kind, id).await?;
        Ok(())
    }

    /// Executes a request, retrying transient failures.
    async fn execute(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        kind: &'static str,
        id: &str,
    ) -> Result<Response> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                debug!("Retry attempt {attempt} of {MAX_RETRIES} for {method} {path}");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)))
                    .await;
            }

            match self.execute_once(method, path, body, kind, id).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ProvisionError::Api(ApiError::network(String::from("Max retries exceeded")))
        }))
    }

    /// Executes a single request and classifies the response status.
    async fn execute_once(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        kind: &'static str,
        id: &str,
    ) -> Result<Response> {
        trace!("Executing {method} {path}");

        let mut request = self
            .client
            .request(method.clone(), format!("{}{path}", self.api_server))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            ProvisionError::Api(ApiError::network(format!("Request failed: {e}")))
        })?;

        let status = response.status();

        if status.as_u16() == 404 {
            return Err(ApiError::not_found(kind, id).into());
        }

        if status.as_u16() == 409 {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Conflict { message }.into());
        }

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let retry_after = if retry_after == 0 { 60 } else { retry_after };

            return Err(ApiError::RateLimited {
                retry_after_secs: retry_after,
            }
            .into());
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApiError::AuthenticationFailed {
                message: String::from("Invalid or expired token"),
            }
            .into());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::request_failed(status.as_u16(), body).into());
        }

        Ok(response)
    }

    /// Decodes a JSON response body.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json().await.map_err(|e| {
            ProvisionError::Api(ApiError::invalid_response(format!(
                "Failed to parse response: {e}"
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::types::VolumeSnapshot;

    async fn client_for(server: &MockServer) -> SandwichClient {
        SandwichClient::new(&server.uri(), "test-token").unwrap()
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/volumes/v1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1f0e938e-9e43-4e6c-a2b5-14f79b1cb5a1",
                "name": "data",
                "zone_id": "74a9b5f1-5d77-4b63-9bb4-9d8f7b9f3f01",
                "size": 10,
                "state": "Created",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let volume: VolumeSnapshot = client
            .get_json("/v1/volumes/v1", "volume", "v1")
            .await
            .unwrap();

        assert_eq!(volume.name, "data");
        assert_eq!(volume.size, 10);
        assert_eq!(volume.state, "Created");
        assert_eq!(volume.attached_to, None);
    }

    #[tokio::test]
    async fn test_404_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .get_json::<VolumeSnapshot>("/v1/volumes/gone", "volume", "gone")
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("gone"));
    }

    #[tokio::test]
    async fn test_409_maps_to_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_string("volume already detached"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .post_empty("/v1/volumes/v1/action/detach", &json!({}), "volume", "v1")
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_401_maps_to_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .get_json::<VolumeSnapshot>("/v1/volumes/v1", "volume", "v1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Api(ApiError::AuthenticationFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .get_json::<VolumeSnapshot>("/v1/volumes/v1", "volume", "v1")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Api(ApiError::RequestFailed { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", "0"),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1f0e938e-9e43-4e6c-a2b5-14f79b1cb5a1",
                "name": "data",
                "zone_id": "74a9b5f1-5d77-4b63-9bb4-9d8f7b9f3f01",
                "size": 10,
                "state": "Created",
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let volume: VolumeSnapshot = client
            .get_json("/v1/volumes/v1", "volume", "v1")
            .await
            .unwrap();

        assert_eq!(volume.name, "data");
    }
}
