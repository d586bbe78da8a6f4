use yew::prelude::*;

use super::use_query::{QueryHandle, use_query};
use crate::models::{
    auth::UserProfile,
    metrics::{
        CacheStats, DriftReport, RoutingStats, SavingsSummary, UsageTimeseries, ValidationSummary,
    },
};
use crate::services::api::TimeRange;
use crate::services::app::AppServices;
use crate::services::queries;

#[hook]
pub fn use_savings(services: AppServices, range: TimeRange) -> QueryHandle<SavingsSummary> {
    let query = queries::savings(services.api.clone(), range);
    use_query(services.queries, query)
}

#[hook]
pub fn use_usage(services: AppServices, range: TimeRange) -> QueryHandle<UsageTimeseries> {
    let query = queries::usage(services.api.clone(), range);
    use_query(services.queries, query)
}

#[hook]
pub fn use_cache_stats(services: AppServices) -> QueryHandle<CacheStats> {
    let query = queries::cache_stats(services.api.clone());
    use_query(services.queries, query)
}

#[hook]
pub fn use_routing_stats(services: AppServices) -> QueryHandle<RoutingStats> {
    let query = queries::routing_stats(services.api.clone());
    use_query(services.queries, query)
}

#[hook]
pub fn use_drift_report(services: AppServices) -> QueryHandle<DriftReport> {
    let query = queries::drift_report(services.api.clone());
    use_query(services.queries, query)
}

#[hook]
pub fn use_validation_summary(services: AppServices) -> QueryHandle<ValidationSummary> {
    let query = queries::validation_summary(services.api.clone());
    use_query(services.queries, query)
}

#[hook]
pub fn use_current_user(services: AppServices) -> QueryHandle<UserProfile> {
    let query = queries::current_user(services.api.clone());
    use_query(services.queries, query)
}
