use std::rc::Rc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::models::error::AppError;
use crate::services::credentials::CredentialStore;
use crate::services::errors::error_for_status;
use crate::services::transport::{HttpRequest, Transport};

/// Sends the user to the login view.
pub trait Navigator {
    fn redirect_to_login(&self);
}

/// Navigates the browser window to [`Config::LOGIN_PATH`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn redirect_to_login(&self) {
        let Some(window) = web_sys::window() else {
            tracing::warn!("no window available, cannot redirect to login");
            return;
        };

        let location = window.location();
        if location.pathname().ok().as_deref() == Some(Config::LOGIN_PATH) {
            return;
        }
        if let Err(e) = location.set_href(Config::LOGIN_PATH) {
            tracing::error!("failed to redirect to login: {e:?}");
        }
    }
}

/// Authenticated JSON client for the gateway backend.
///
/// Every request carries the current credential. A 401 from any request,
/// whichever component issued it, clears the credential and redirects to
/// the login view before the error reaches the caller.
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    transport: Rc<dyn Transport>,
    credentials: Rc<CredentialStore>,
    navigator: Rc<dyn Navigator>,
}

impl HttpClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Rc<dyn Transport>,
        credentials: Rc<CredentialStore>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            credentials,
            navigator,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Rc<CredentialStore> {
        &self.credentials
    }

    /// Attaches `token` to all subsequent requests and persists it.
    pub fn set_credential(&self, token: impl Into<String>) -> Result<(), AppError> {
        self.credentials.set(token)
    }

    /// Subsequent requests go out unauthenticated.
    pub fn clear_credential(&self) {
        self.credentials.clear();
    }

    /// Performs one call and decodes the JSON body; an empty body is `null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let request = self.build_request(method, path, body);
        tracing::debug!(method = %request.method, url = %request.url, "sending request");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!("transport failure: {e}");
            e
        })?;

        if response.status == 401 {
            tracing::warn!(path, "credential rejected, logging out");
            self.credentials.clear();
            self.navigator.redirect_to_login();
            return Err(error_for_status(response.status, &response.body));
        }

        if !response.is_success() {
            return Err(error_for_status(response.status, &response.body));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response.body)
            .map_err(|e| AppError::DataError(format!("Failed to parse response: {e}")))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let value = self.request(Method::GET, path, None).await?;
        decode(value)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let body = serde_json::to_value(body)
            .map_err(|e| AppError::DataError(format!("Failed to encode request: {e}")))?;
        let value = self.request(Method::POST, path, Some(body)).await?;
        decode(value)
    }

    fn build_request(&self, method: Method, path: &str, body: Option<Value>) -> HttpRequest {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        if let Some(token) = self.credentials.token() {
            headers.push((Config::API_KEY_HEADER.to_string(), token));
        }

        HttpRequest {
            method,
            url: format!("{}/{}", self.base_url, path.trim_start_matches('/')),
            headers,
            body,
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::DataError(format!("Unexpected response shape: {e}")))
}
