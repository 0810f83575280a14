//! HTTP transport for queued and direct requests.
//!
//! The queue, facade and worker all send through the `RequestTransport`
//! trait; `HttpTransport` is the reqwest-backed production implementation.
//! Tests substitute scripted fakes.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONTENT_TYPE;

use sokoni_core::sync::{HttpMethod, SyncPriority};

use crate::error::TransportError;

const MAX_LOG_BODY_CHARS: usize = 512;

/// Header carrying the originating priority for server-side triage.
pub const PRIORITY_HEADER: &str = "X-Request-Priority";

/// One outbound API request. The timeout is enforced per request, derived
/// from the current connection tier by the caller.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<serde_json::Value>,
    pub priority: SyncPriority,
    pub timeout: Duration,
}

/// Parsed response to an `OutboundRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

#[async_trait]
pub trait RequestTransport: Send + Sync {
    /// Send one request. Non-2xx responses surface as `TransportError::Api`.
    async fn send(
        &self,
        request: OutboundRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// A fetched static resource (page, asset), body kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedResource {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchedResource {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw resource fetching for the worker's response cache. HTTP error
/// statuses come back as `Ok`; only transport-level failures are `Err`.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> std::result::Result<FetchedResource, TransportError>;
}

/// reqwest-backed transport. No client-wide timeout; every request carries
/// its own tier-derived one.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> std::result::Result<Self, TransportError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn log_response(method: HttpMethod, path: &str, status: u16, body: &str) {
        if (200..300).contains(&status) {
            debug!("[Transport] {} {} -> {}", method, path, status);
            return;
        }
        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[Transport] {} {} -> {}: {}", method, path, status, preview);
    }

    fn method_for(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }

    fn map_send_error(err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            TransportError::Http(err)
        }
    }
}

#[async_trait]
impl RequestTransport for HttpTransport {
    async fn send(
        &self,
        request: OutboundRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(Self::method_for(request.method), self.url(&request.path))
            .timeout(request.timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(PRIORITY_HEADER, i32::from(request.priority).to_string());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| Self::map_send_error(err, request.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| Self::map_send_error(err, request.timeout))?;
        Self::log_response(request.method, &request.path, status, &body);

        if !(200..300).contains(&status) {
            return Err(TransportError::api(
                status,
                format!("Request failed: {}", body),
            ));
        }

        let parsed = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        Ok(TransportResponse {
            status,
            body: parsed,
        })
    }
}

#[async_trait]
impl ResourceFetcher for HttpTransport {
    async fn fetch(&self, path: &str) -> std::result::Result<FetchedResource, TransportError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response.bytes().await?.to_vec();
        debug!("[Transport] GET {} -> {} ({} bytes)", path, status, body.len());
        Ok(FetchedResource {
            status,
            content_type,
            body,
        })
    }
}
