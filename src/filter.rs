use chrono::{DateTime, Utc};

use crate::model::TransactionRecord;
use crate::parse::days_ago;

/// Immutable threshold snapshot for one run.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Allowed trade-type codes, upper-cased. Empty disables the check.
    pub types: Vec<String>,
    pub max_days_filed: f64,
    pub max_days_trade: f64,
    pub min_price: f64,
    /// Minimum |transaction value| in thousands of dollars; 0 disables.
    pub min_value_k: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            types: vec!["P".to_string(), "S".to_string()],
            max_days_filed: 3.0,
            max_days_trade: 365.0,
            min_price: 5.0,
            min_value_k: 0.0,
        }
    }
}

impl FilterConfig {
    /// Parse a comma-separated allow-list ("p, s") into normalized codes.
    pub fn parse_types(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Does `record` pass every configured predicate, evaluated at `now`?
/// Checks short-circuit in the order below; order only affects efficiency,
/// not the result set.
pub fn accepts(config: &FilterConfig, record: &TransactionRecord, now: DateTime<Utc>) -> bool {
    if !config.types.is_empty() && !config.types.iter().any(|t| *t == record.trade_code) {
        return false;
    }

    // Recency. days_ago returns INFINITY for garbled timestamps, so those
    // rows fall out here rather than slipping through.
    if !(days_ago(&record.filing_datetime, now) <= config.max_days_filed) {
        return false;
    }
    if !(days_ago(&record.trade_date, now) <= config.max_days_trade) {
        return false;
    }

    // NAN fails both comparisons, which is what excludes unparseable prices.
    if !(record.price.is_finite() && record.price >= config.min_price) {
        return false;
    }

    if config.min_value_k > 0.0 {
        let abs_value = record.value.abs();
        if !(abs_value.is_finite() && abs_value >= config.min_value_k * 1000.0) {
            return false;
        }
    }

    true
}

/// Surviving subsequence, original relative order preserved.
pub fn apply<'a>(
    config: &FilterConfig,
    records: &'a [TransactionRecord],
    now: DateTime<Utc>,
) -> Vec<&'a TransactionRecord> {
    records.iter().filter(|r| accepts(config, r, now)).collect()
}
