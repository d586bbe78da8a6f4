use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::metrics::{self, ChartRow};

/// Spend with and without the gateway over a time range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSummary {
    pub could_have_spent: f64,
    pub actually_spent: f64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub cached_requests: u64,
}

impl SavingsSummary {
    pub fn savings_amount(&self) -> f64 {
        metrics::savings_amount(self.could_have_spent, self.actually_spent)
    }

    pub fn savings_percentage(&self) -> f64 {
        metrics::savings_percentage(self.could_have_spent, self.actually_spent)
    }
}

/// One named series of a usage time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Columnar usage buckets: one label per bucket, one value array per series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTimeseries {
    pub labels: Vec<String>,
    #[serde(default)]
    pub series: Vec<UsageSeries>,
}

impl UsageTimeseries {
    /// Row-oriented view for the charting layer.
    pub fn rows(&self) -> Vec<ChartRow> {
        let columns: Vec<(&str, &[f64])> = self
            .series
            .iter()
            .map(|s| (s.name.as_str(), s.values.as_slice()))
            .collect();
        metrics::reshape_series(&self.labels, &columns)
    }

    pub fn series_names(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Response cache counters reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    #[serde(default)]
    pub entries: u64,
    #[serde(default)]
    pub tokens_saved: u64,
    #[serde(default)]
    pub cost_saved: f64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        metrics::hit_rate(self.hits, self.misses)
    }

    pub fn total_lookups(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }
}

/// Traffic and spend for one provider/model route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStat {
    pub provider: String,
    pub model: String,
    pub requests: u64,
    pub cost: f64,
    #[serde(default)]
    pub avg_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingStats {
    #[serde(default)]
    pub routes: Vec<RouteStat>,
}

impl RoutingStats {
    pub fn total_cost(&self) -> f64 {
        self.routes.iter().map(|r| r.cost).sum()
    }

    pub fn total_requests(&self) -> u64 {
        self.routes
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.requests))
    }

    /// Percentage of total spend attributed to `route`.
    pub fn cost_share(&self, route: &RouteStat) -> f64 {
        metrics::cost_share(route.cost, self.total_cost())
    }

    /// Routes ordered from most to least expensive.
    pub fn by_cost(&self) -> Vec<&RouteStat> {
        let mut routes: Vec<&RouteStat> = self.routes.iter().collect();
        routes.sort_by(|a, b| b.cost.total_cmp(&a.cost));
        routes
    }
}

/// How far a monitored metric has drifted from its baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DriftSeverity {
    /// Returns CSS class name for color coding
    pub fn css_class(&self) -> &'static str {
        match self {
            DriftSeverity::Low => "drift-low",
            DriftSeverity::Medium => "drift-medium",
            DriftSeverity::High => "drift-high",
            DriftSeverity::Critical => "drift-critical",
        }
    }

    /// Returns human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            DriftSeverity::Low => "Low",
            DriftSeverity::Medium => "Medium",
            DriftSeverity::High => "High",
            DriftSeverity::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftAlert {
    pub id: String,
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    pub severity: DriftSeverity,
    pub detected_at: DateTime<Utc>,
}

impl DriftAlert {
    pub fn change_percentage(&self) -> f64 {
        metrics::percent_change(self.baseline, self.current)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    #[serde(default)]
    pub alerts: Vec<DriftAlert>,
}

impl DriftReport {
    pub fn count_at_least(&self, severity: DriftSeverity) -> usize {
        self.alerts.iter().filter(|a| a.severity >= severity).count()
    }

    /// Alerts ordered by severity, most severe first, then most recent.
    pub fn sorted(&self) -> Vec<&DriftAlert> {
        let mut alerts: Vec<&DriftAlert> = self.alerts.iter().collect();
        alerts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then_with(|| b.detected_at.cmp(&a.detected_at))
        });
        alerts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub request_id: String,
    pub rule: String,
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Response validation outcomes over the reporting window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    #[serde(default)]
    pub recent_failures: Vec<ValidationFailure>,
}

impl ValidationSummary {
    pub fn pass_rate(&self) -> f64 {
        metrics::pass_rate(self.passed, self.total)
    }
}
