use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::config::AppConfig;
use crate::models::{
    auth::{AuthResponse, LoginRequest, RegisterRequest, UserProfile},
    error::AppError,
    metrics::{
        CacheStats, DriftReport, RoutingStats, SavingsSummary, UsageTimeseries, ValidationSummary,
    },
};
use crate::services::http::HttpClient;
use crate::services::mock::MockApi;

/// Reporting window for time-bounded metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeRange {
    /// Last 24 hours
    Day,
    /// Last 7 days
    #[default]
    Week,
    /// Last 30 days
    Month,
}

impl TimeRange {
    /// Returns the code used in API query strings.
    pub fn code(&self) -> &'static str {
        match self {
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
        }
    }

    /// Returns a human-readable description of the range.
    pub fn description(&self) -> &'static str {
        match self {
            TimeRange::Day => "Last 24 hours",
            TimeRange::Week => "Last 7 days",
            TimeRange::Month => "Last 30 days",
        }
    }

    /// All available ranges.
    pub fn all() -> &'static [TimeRange] {
        &[TimeRange::Day, TimeRange::Week, TimeRange::Month]
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "1d" | "day" => Ok(TimeRange::Day),
            "7d" | "week" => Ok(TimeRange::Week),
            "30d" | "month" => Ok(TimeRange::Month),
            _ => Err(AppError::ConfigError(format!("Invalid time range: {s}"))),
        }
    }
}

/// Everything the dashboard can ask of the gateway backend.
///
/// Implemented by [`LiveApi`] (HTTP) and [`MockApi`] (static fixtures); the
/// rest of the crate only ever sees `Rc<dyn GatewayApi>`.
pub trait GatewayApi {
    fn login(&self, request: LoginRequest) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>>;

    fn register(
        &self,
        request: RegisterRequest,
    ) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>>;

    fn current_user(&self) -> LocalBoxFuture<'_, Result<UserProfile, AppError>>;

    fn savings_summary(
        &self,
        range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<SavingsSummary, AppError>>;

    fn usage_timeseries(
        &self,
        range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<UsageTimeseries, AppError>>;

    fn cache_stats(&self) -> LocalBoxFuture<'_, Result<CacheStats, AppError>>;

    fn routing_stats(&self) -> LocalBoxFuture<'_, Result<RoutingStats, AppError>>;

    fn drift_report(&self) -> LocalBoxFuture<'_, Result<DriftReport, AppError>>;

    fn validation_summary(&self) -> LocalBoxFuture<'_, Result<ValidationSummary, AppError>>;
}

/// Talks to the real backend.
#[derive(Clone)]
pub struct LiveApi {
    http: HttpClient,
}

impl LiveApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

impl GatewayApi for LiveApi {
    fn login(&self, request: LoginRequest) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>> {
        async move { self.http.post("auth/login", &request).await }.boxed_local()
    }

    fn register(
        &self,
        request: RegisterRequest,
    ) -> LocalBoxFuture<'_, Result<AuthResponse, AppError>> {
        async move { self.http.post("auth/register", &request).await }.boxed_local()
    }

    fn current_user(&self) -> LocalBoxFuture<'_, Result<UserProfile, AppError>> {
        self.http.get("auth/me").boxed_local()
    }

    fn savings_summary(
        &self,
        range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<SavingsSummary, AppError>> {
        async move {
            let path = format!("metrics/savings?range={}", range.code());
            self.http.get(&path).await
        }
        .boxed_local()
    }

    fn usage_timeseries(
        &self,
        range: TimeRange,
    ) -> LocalBoxFuture<'_, Result<UsageTimeseries, AppError>> {
        async move {
            let path = format!("metrics/usage?range={}", range.code());
            self.http.get(&path).await
        }
        .boxed_local()
    }

    fn cache_stats(&self) -> LocalBoxFuture<'_, Result<CacheStats, AppError>> {
        self.http.get("metrics/cache").boxed_local()
    }

    fn routing_stats(&self) -> LocalBoxFuture<'_, Result<RoutingStats, AppError>> {
        self.http.get("metrics/routing").boxed_local()
    }

    fn drift_report(&self) -> LocalBoxFuture<'_, Result<DriftReport, AppError>> {
        self.http.get("metrics/drift").boxed_local()
    }

    fn validation_summary(&self) -> LocalBoxFuture<'_, Result<ValidationSummary, AppError>> {
        self.http.get("metrics/validation").boxed_local()
    }
}

/// Picks the backend once, at startup. The choice never changes afterwards.
pub fn select_api(config: &AppConfig, http: HttpClient) -> Rc<dyn GatewayApi> {
    if config.use_mock {
        tracing::info!("using static fixtures instead of the gateway backend");
        Rc::new(MockApi::new())
    } else {
        tracing::info!(api_url = %config.api_url, "using gateway backend");
        Rc::new(LiveApi::new(http))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_parsing() {
        assert_eq!("7d".parse::<TimeRange>().unwrap(), TimeRange::Week);
        assert_eq!("24H".parse::<TimeRange>().unwrap(), TimeRange::Day);
        assert_eq!("month".parse::<TimeRange>().unwrap(), TimeRange::Month);
        assert!("90d".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_range_codes_round_trip() {
        for range in TimeRange::all() {
            assert_eq!(range.code().parse::<TimeRange>().unwrap(), *range);
        }
        assert_eq!(TimeRange::default(), TimeRange::Week);
    }
}
