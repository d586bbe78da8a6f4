//! Pure calculators turning raw metric records into display-ready values.
//!
//! Nothing in here performs I/O or touches shared state; every function is
//! total over its inputs, with ratios guarded against a zero denominator.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Amount saved relative to what the traffic would have cost without the gateway.
pub fn savings_amount(could_have_spent: f64, actually_spent: f64) -> f64 {
    could_have_spent - actually_spent
}

/// Percentage saved: `(could - actual) / could * 100`, or `0` when nothing could have been spent.
pub fn savings_percentage(could_have_spent: f64, actually_spent: f64) -> f64 {
    if could_have_spent == 0.0 {
        return 0.0;
    }
    (could_have_spent - actually_spent) / could_have_spent * 100.0
}

/// Share of requests answered from cache, as a percentage.
pub fn hit_rate(hits: u64, misses: u64) -> f64 {
    ratio_percent(hits as f64, hits as f64 + misses as f64)
}

/// Share of validated requests that passed, as a percentage.
pub fn pass_rate(passed: u64, total: u64) -> f64 {
    ratio_percent(passed as f64, total as f64)
}

/// Share of `total` contributed by `part`, as a percentage.
pub fn cost_share(part: f64, total: f64) -> f64 {
    ratio_percent(part, total)
}

/// Relative change from `baseline` to `current`, as a percentage.
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    (current - baseline) / baseline.abs() * 100.0
}

fn ratio_percent(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals.cast_signed());
    (value * factor).round() / factor
}

/// Formats an amount as US dollars: `$1,234.50`, `-$0.75`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    format!(
        "{sign}${}.{:02}",
        group_thousands(cents / 100),
        cents % 100
    )
}

/// Formats a percentage with a fixed number of decimals: `33.1%`.
pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{:.decimals$}%", 0.0);
    }
    format!("{value:.decimals$}%")
}

/// Formats a whole count with thousands separators: `12,345`.
pub fn format_count(value: u64) -> String {
    group_thousands(value)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

/// Name of the label field in every [`ChartRow`].
pub const LABEL_FIELD: &str = "date";

/// One row of a row-oriented chart dataset: the bucket label plus one value per series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub date: String,
    /// Keyed by [`series_field`], so no key collides with the label.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl ChartRow {
    pub fn get(&self, series: &str) -> Option<f64> {
        self.values.get(series_field(series).as_ref()).copied()
    }
}

/// Field a series is stored under in a row: its own name, except that a
/// series called `date` becomes `date_series`.
pub fn series_field(name: &str) -> Cow<'_, str> {
    if name == LABEL_FIELD {
        Cow::Owned(format!("{name}_series"))
    } else {
        Cow::Borrowed(name)
    }
}

/// Converts columnar buckets (labels + parallel value arrays) into one row per label.
///
/// A series shorter than `labels` leaves its field out of the trailing rows;
/// values beyond the last label are ignored. A series named like the label
/// field is renamed by [`series_field`].
pub fn reshape_series<L, N, V>(labels: &[L], series: &[(N, V)]) -> Vec<ChartRow>
where
    L: AsRef<str>,
    N: AsRef<str>,
    V: AsRef<[f64]>,
{
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| ChartRow {
            date: label.as_ref().to_string(),
            values: series
                .iter()
                .filter_map(|(name, values)| {
                    values
                        .as_ref()
                        .get(i)
                        .map(|value| (series_field(name.as_ref()).into_owned(), *value))
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_savings_percentage_zero_baseline() {
        assert_eq!(savings_percentage(0.0, 0.0), 0.0);
        assert_eq!(savings_percentage(0.0, 12.5), 0.0);
    }

    #[test]
    fn test_savings_percentage_formula() {
        let pairs = [(100.0, 25.0), (3.0, 1.0), (0.07, 0.05), (10.0, 12.0)];
        for (could, actual) in pairs {
            assert_eq!(
                savings_percentage(could, actual),
                (could - actual) / could * 100.0
            );
        }
    }

    #[test]
    fn test_savings_scenario() {
        assert_eq!(savings_amount(500.0, 334.5), 165.5);
        assert_eq!(round_to(savings_percentage(500.0, 334.5), 1), 33.1);
    }

    #[test]
    fn test_format_currency() {
        let formatted = format_currency(1234.5);
        assert!(formatted.contains("1,234.50"));
        assert!(formatted.starts_with('$'));

        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(-0.75), "-$0.75");
        assert_eq!(format_currency(-0.001), "$0.00");
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(f64::NAN), "$0.00");
    }

    #[test]
    fn test_format_percent_and_count() {
        assert_eq!(format_percent(33.1, 1), "33.1%");
        assert_eq!(format_percent(12.0, 0), "12%");
        assert_eq!(format_percent(f64::INFINITY, 1), "0.0%");
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(12_345), "12,345");
        assert_eq!(format_count(100), "100");
    }

    #[test]
    fn test_ratios_guard_zero() {
        assert_eq!(hit_rate(0, 0), 0.0);
        assert_eq!(hit_rate(3, 1), 75.0);
        assert_eq!(pass_rate(0, 0), 0.0);
        assert_eq!(pass_rate(9, 10), 90.0);
        assert_eq!(cost_share(5.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 4.0), 0.0);
        assert_eq!(percent_change(200.0, 150.0), -25.0);
    }

    #[test]
    fn test_reshape_series_scenario() {
        let rows = reshape_series(
            &["Jan", "Feb"],
            &[("seriesA", vec![10.0, 20.0]), ("seriesB", vec![1.0, 2.0])],
        );

        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([
                {"date": "Jan", "seriesA": 10.0, "seriesB": 1.0},
                {"date": "Feb", "seriesA": 20.0, "seriesB": 2.0}
            ])
        );
    }

    #[test]
    fn test_reshape_series_short_series() {
        let rows = reshape_series(&["a", "b", "c"], &[("cost", vec![1.0, 2.0])]);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].get("cost"), Some(2.0));
        assert_eq!(rows[2].get("cost"), None);
    }

    #[test]
    fn test_hit_rate_huge_counts() {
        assert_eq!(hit_rate(u64::MAX, u64::MAX), 50.0);
        assert_eq!(hit_rate(u64::MAX, 0), 100.0);
    }

    #[test]
    fn test_reshape_series_named_like_label() {
        let rows = reshape_series(&["Jan"], &[("date", vec![3.0]), ("cost", vec![1.0])]);

        assert_eq!(
            serde_json::to_value(&rows).unwrap(),
            json!([{"date": "Jan", "date_series": 3.0, "cost": 1.0}])
        );
        assert_eq!(rows[0].get("date"), Some(3.0));
        assert_eq!(rows[0].get("cost"), Some(1.0));
    }

    #[test]
    fn test_reshape_series_empty() {
        let labels: [&str; 0] = [];
        let series: [(&str, Vec<f64>); 0] = [];
        assert!(reshape_series(&labels, &series).is_empty());
    }
}
