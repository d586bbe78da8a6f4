pub mod use_auth;
pub mod use_metrics;
pub mod use_query;
