//! Query descriptors for every backend resource.
//!
//! Keys are rooted at `"metrics"` or `"auth"` and carry every parameter the
//! fetch uses, so two descriptors share a cache entry only when they would
//! fetch the same thing. Time-bounded resources fall back to an empty
//! zero-state when the backend has nothing for the account yet.

use std::rc::Rc;

use crate::models::{
    auth::UserProfile,
    metrics::{
        CacheStats, DriftReport, RoutingStats, SavingsSummary, UsageTimeseries, ValidationSummary,
    },
};
use crate::services::api::{GatewayApi, TimeRange};
use crate::services::query::{Query, QueryKey};

pub fn metrics_root() -> QueryKey {
    QueryKey::new("metrics")
}

pub fn current_user_key() -> QueryKey {
    QueryKey::new("auth").with("me")
}

pub fn savings(api: Rc<dyn GatewayApi>, range: TimeRange) -> Query<SavingsSummary> {
    Query::new(metrics_root().with("savings").with(range.code()), move || {
        let api = api.clone();
        async move { api.savings_summary(range).await }
    })
    .zero_state(SavingsSummary::default())
}

pub fn usage(api: Rc<dyn GatewayApi>, range: TimeRange) -> Query<UsageTimeseries> {
    Query::new(metrics_root().with("usage").with(range.code()), move || {
        let api = api.clone();
        async move { api.usage_timeseries(range).await }
    })
    .zero_state(UsageTimeseries::default())
}

pub fn cache_stats(api: Rc<dyn GatewayApi>) -> Query<CacheStats> {
    Query::new(metrics_root().with("cache"), move || {
        let api = api.clone();
        async move { api.cache_stats().await }
    })
    .zero_state(CacheStats::default())
}

pub fn routing_stats(api: Rc<dyn GatewayApi>) -> Query<RoutingStats> {
    Query::new(metrics_root().with("routing"), move || {
        let api = api.clone();
        async move { api.routing_stats().await }
    })
    .zero_state(RoutingStats::default())
}

pub fn drift_report(api: Rc<dyn GatewayApi>) -> Query<DriftReport> {
    Query::new(metrics_root().with("drift"), move || {
        let api = api.clone();
        async move { api.drift_report().await }
    })
    .zero_state(DriftReport::default())
}

pub fn validation_summary(api: Rc<dyn GatewayApi>) -> Query<ValidationSummary> {
    Query::new(metrics_root().with("validation"), move || {
        let api = api.clone();
        async move { api.validation_summary().await }
    })
    .zero_state(ValidationSummary::default())
}

/// The signed-in user; a 404 here is a real error, so no zero-state.
pub fn current_user(api: Rc<dyn GatewayApi>) -> Query<UserProfile> {
    Query::new(current_user_key(), move || {
        let api = api.clone();
        async move { api.current_user().await }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::MockApi;

    #[test]
    fn test_keys_carry_parameters() {
        let api: Rc<dyn GatewayApi> = Rc::new(MockApi::new());

        let week = savings(api.clone(), TimeRange::Week);
        let month = savings(api.clone(), TimeRange::Month);
        let usage_week = usage(api.clone(), TimeRange::Week);

        assert_ne!(week.key(), month.key());
        assert_ne!(week.key(), usage_week.key());
        assert_eq!(week.key(), savings(api.clone(), TimeRange::Week).key());
        assert!(week.key().starts_with(&metrics_root()));
        assert!(!current_user(api).key().starts_with(&metrics_root()));
    }
}
