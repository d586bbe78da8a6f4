use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde::de::DeserializeOwned;

use crate::models::{
    auth::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
    error::AppError,
    metrics::{
        CacheStats, DriftReport, RoutingStats, SavingsSummary, UsageTimeseries, ValidationSummary,
    },
};
use crate::services::api::{GatewayApi, TimeRange};

/// Logical resources with a canned fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Auth,
    CurrentUser,
    Savings,
    Usage,
    Cache,
    Routing,
    Drift,
    Validation,
}

impl Resource {
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Auth => "auth",
            Resource::CurrentUser => "me",
            Resource::Savings => "savings",
            Resource::Usage => "usage",
            Resource::Cache => "cache",
            Resource::Routing => "routing",
            Resource::Drift => "drift",
            Resource::Validation => "validation",
        }
    }

    /// Raw fixture JSON, embedded at build time.
    pub fn fixture(&self) -> &'static str {
        match self {
            Resource::Auth => include_str!("../../fixtures/auth.json"),
            Resource::CurrentUser => include_str!("../../fixtures/me.json"),
            Resource::Savings => include_str!("../../fixtures/savings.json"),
            Resource::Usage => include_str!("../../fixtures/usage.json"),
            Resource::Cache => include_str!("../../fixtures/cache.json"),
            Resource::Routing => include_str!("../../fixtures/routing.json"),
            Resource::Drift => include_str!("../../fixtures/drift.json"),
            Resource::Validation => include_str!("../../fixtures/validation.json"),
        }
    }

    pub fn all() -> &'static [Resource] {
        &[
            Resource::Auth,
            Resource::CurrentUser,
            Resource::Savings,
            Resource::Usage,
            Resource::Cache,
            Resource::Routing,
            Resource::Drift,
            Resource::Validation,
        ]
    }
}

/// Stand-in backend answering every call from static fixtures.
///
/// Request parameters are ignored and nothing leaves the process; results
/// are delivered through the same future-returning interface as the live
/// client.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockApi;

impl MockApi {
    pub fn new() -> Self {
        Self
    }

    fn respond<T: DeserializeOwned + 'static>(
        resource: Resource,
    ) -> LocalBoxFuture<'static, Result<T, AppError>> {
        tracing::debug!(resource = resource.name(), "serving fixture");
        future::ready(load(resource)).boxed_local()
    }
}

/// Decodes the fixture for `resource`.
pub fn load<T: DeserializeOwned>(resource: Resource) -> Result<T, AppError> {
    serde_json::from_str(resource.fixture()).map_err(|e| {
        AppError::DataError(format!("Invalid {} fixture: {e}", resource.name()))
    })
}

impl GatewayApi for MockApi {
    fn login(&self, _request: LoginRequest) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>> {
        Self::respond(Resource::Auth)
    }

    fn register(
        &self,
        _request: RegisterRequest,
    ) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>> {
        Self::respond(Resource::Auth)
    }

    fn current_user(&self) -> LocalBoxFuture<'_, Result<UserProfile, AppError>> {
        Self::respond(Resource::CurrentUser)
    }

    fn savings_summary(
        &self,
        _range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<SavingsSummary, AppError>> {
        Self::respond(Resource::Savings)
    }

    fn usage_timeseries(
        &self,
        _range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<UsageTimeseries, AppError>> {
        Self::respond(Resource::Usage)
    }

    fn cache_stats(&self) -> LocalBoxFuture<'_, Result<CacheStats, AppError>> {
        Self::respond(Resource::Cache)
    }

    fn routing_stats(&self) -> LocalBoxFuture<'_, Result<RoutingStats, AppError>> {
        Self::respond(Resource::Routing)
    }

    fn drift_report(&self) -> LocalBoxFuture<'_, Result<DriftReport, AppError>> {
        Self::respond(Resource::Drift)
    }

    fn validation_summary(&self) -> LocalBoxFuture<'_, Result<ValidationSummary, AppError>> {
        Self::respond(Resource::Validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_every_fixture_is_json() {
        for resource in Resource::all() {
            let parsed: Result<serde_json::Value, _> = load(*resource);
            assert!(parsed.is_ok(), "{} fixture does not parse", resource.name());
        }
    }

    #[test]
    fn test_fixtures_match_models() {
        let api = MockApi::new();

        let savings = block_on(api.savings_summary(TimeRange::Day)).unwrap();
        assert!(savings.could_have_spent > savings.actually_spent);

        let usage = block_on(api.usage_timeseries(TimeRange::Month)).unwrap();
        assert!(!usage.is_empty());
        assert!(usage.series.iter().all(|s| s.values.len() == usage.labels.len()));

        assert!(block_on(api.cache_stats()).unwrap().hits > 0);
        assert!(!block_on(api.routing_stats()).unwrap().routes.is_empty());
        assert!(!block_on(api.drift_report()).unwrap().alerts.is_empty());
        assert!(block_on(api.validation_summary()).unwrap().total > 0);
        assert!(!block_on(api.current_user()).unwrap().email.is_empty());
    }

    #[test]
    fn test_login_ignores_credentials() {
        let api = MockApi::new();
        let request = LoginRequest {
            email: "anyone@example.com".into(),
            password: "wrong".into(),
        };
        let auth = block_on(api.login(request)).unwrap();
        assert!(!auth.api_key.is_empty());
    }
}
