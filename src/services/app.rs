use std::rc::Rc;

use crate::config::AppConfig;
use crate::models::{
    auth::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
    error::AppError,
};
use crate::services::api::{GatewayApi, select_api};
use crate::services::credentials::{
    CredentialStorage, CredentialStore, CredentialSubscription, LocalStorageBackend,
};
use crate::services::http::{BrowserNavigator, HttpClient, Navigator};
use crate::services::queries;
use crate::services::query::QueryClient;
use crate::services::transport::{ReqwestTransport, Transport};

/// The data layer, wired once at startup and shared by every view.
#[derive(Clone)]
pub struct AppServices {
    pub config: AppConfig,
    pub api: Rc<dyn GatewayApi>,
    pub queries: QueryClient,
    credentials: Rc<CredentialStore>,
}

impl AppServices {
    /// Wires the browser stack: `localStorage`, `reqwest` and window navigation.
    pub fn from_env() -> Result<Self, AppError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::build(
            AppConfig::from_env(),
            LocalStorageBackend,
            Rc::new(transport),
            Rc::new(BrowserNavigator),
        ))
    }

    pub fn build(
        config: AppConfig,
        storage: impl CredentialStorage + 'static,
        transport: Rc<dyn Transport>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        let credentials = Rc::new(CredentialStore::load(storage));
        let http = HttpClient::new(
            config.api_url.clone(),
            transport,
            credentials.clone(),
            navigator,
        );
        let api = select_api(&config, http);

        Self {
            config,
            api,
            queries: QueryClient::new(),
            credentials,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    /// Reports every change of the authenticated flag, including the forced
    /// logout after a 401 from any request.
    pub fn on_auth_change(&self, listener: impl Fn(bool) + 'static) -> CredentialSubscription {
        self.credentials.subscribe(listener)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<UserProfile, AppError> {
        let response = self.api.login(request).await?;
        Ok(self.start_session(response))
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserProfile, AppError> {
        let response = self.api.register(request).await?;
        Ok(self.start_session(response))
    }

    /// Forgets the credential and everything cached under it.
    pub fn logout(&self) {
        tracing::info!("logging out");
        self.credentials.clear();
        self.queries.clear();
    }

    fn start_session(&self, response: AuthResponse) -> UserProfile {
        self.queries.clear();
        if let Err(e) = self.credentials.set(response.api_key) {
            // The session still works; it just won't survive a reload.
            tracing::warn!("{e}");
        }
        self.queries
            .set_data(&queries::current_user_key(), response.user.clone());
        response.user
    }
}

impl PartialEq for AppServices {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.api, &other.api)
            && self.queries == other.queries
            && Rc::ptr_eq(&self.credentials, &other.credentials)
    }
}
