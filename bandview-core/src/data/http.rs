//! HTTP transport shared by the provider adapters.
//!
//! Adapters build an [`HttpRequest`] and interpret the body; the transport owns
//! timeouts, the user agent and the circuit breaker. Tests substitute a canned
//! transport.

use super::circuit_breaker::CircuitBreaker;
use crate::config::HttpSettings;
use crate::error::FetchError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Params go in the query string.
    Get,
    /// Params go in an `application/x-www-form-urlencoded` body.
    PostForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn post_form(url: impl Into<String>) -> Self {
        Self {
            method: Method::PostForm,
            ..Self::get(url)
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.push((key.to_string(), value.into()));
        self
    }

    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Returns the response for success and for client errors
/// the adapter should interpret itself (e.g. 404 with a JSON error body).
pub trait HttpTransport: Send + Sync {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Blocking reqwest transport behind a circuit breaker.
///
/// Each request is sent exactly once. Failures are mapped to a [`FetchError`]
/// and returned; retrying is the caller's decision.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
        })
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.circuit_breaker
    }

    fn build(&self, request: &HttpRequest) -> reqwest::blocking::RequestBuilder {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::PostForm => self.client.post(&request.url).form(&request.params),
        };
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(FetchError::CircuitBreakerTripped);
        }

        tracing::debug!(url = %request.url, method = ?request.method, "sending request");
        let resp = match self.build(request).send() {
            Ok(resp) => resp,
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    self.circuit_breaker.record_failure();
                }
                return Err(FetchError::NetworkUnreachable(e.to_string()));
            }
        };

        let status = resp.status();

        if status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(FetchError::CircuitBreakerTripped);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            self.circuit_breaker.record_failure();
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status.is_server_error() {
            self.circuit_breaker.record_failure();
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: request.url.clone(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;
        if status.is_success() {
            self.circuit_breaker.record_success();
        }
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
