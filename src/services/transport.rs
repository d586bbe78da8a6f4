use futures::FutureExt;
use futures::future::LocalBoxFuture;
use reqwest::Method;
use serde_json::Value;

use crate::models::error::AppError;

/// A fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and raw body of a response; interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves bytes to the backend and back.
///
/// Only failures to obtain a response are errors here; every HTTP status,
/// including 4xx/5xx, comes back as an `HttpResponse`.
pub trait Transport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, AppError>>;
}

/// `reqwest`-backed transport (browser `fetch` on wasm32).
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http })
    }

    /// Converts a reqwest error into an appropriate `AppError`
    fn classify_error(error: &reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::Network(format!("Request timeout: {error}"))
        } else if error.is_request() {
            AppError::Network(format!("Request error: {error}"))
        } else {
            AppError::Network(format!("Network error: {error}"))
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, AppError>> {
        async move {
            let mut builder = self.http.request(request.method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| Self::classify_error(&e))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| Self::classify_error(&e))?;

            Ok(HttpResponse { status, body })
        }
        .boxed_local()
    }
}
