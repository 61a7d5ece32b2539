//! Aggregation of logged routing decisions for one merchant.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::RoutingDecision;
use crate::error::RoutingError;
use crate::scoring::LARGE_PAYMENT_THRESHOLD;

/// Share of payments on expensive networks above which cost priority is suggested.
pub const EXPENSIVE_SHARE_THRESHOLD: f64 = 0.30;

/// Share of fallback decisions above which a monitoring warning is raised.
pub const FALLBACK_SHARE_THRESHOLD: f64 = 0.10;

/// Share of large payments above which a reliability suggestion is made.
pub const HIGH_VALUE_SHARE_THRESHOLD: f64 = 0.50;

/// Networks considered expensive unless configured otherwise.
pub fn default_expensive_networks() -> Vec<String> {
    vec!["ethereum".to_string()]
}

/// The look-back window of an analytics query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        match self {
            Self::Day => Duration::hours(24),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "30d" => Ok(Self::Month),
            other => Err(RoutingError::InvalidInput(format!(
                "unknown time range '{other}', expected 24h, 7d or 30d"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub merchant_id: String,
    pub time_range: TimeRange,
    pub total_payments: usize,
    pub total_savings_usd: f64,
    pub average_savings_usd: f64,
    /// Decisions per selected network.
    pub network_usage: BTreeMap<String, usize>,
    pub fallback_count: usize,
    pub recommendations: Vec<String>,
}

/// Summarize `decisions` (already filtered to one merchant and window).
pub fn summarize(
    merchant_id: &str,
    time_range: TimeRange,
    decisions: &[RoutingDecision],
    expensive_networks: &BTreeSet<String>,
) -> AnalyticsSummary {
    let total_payments = decisions.len();
    let total_savings_usd: f64 = decisions.iter().map(|d| d.estimated_savings_usd).sum();
    let average_savings_usd = if total_payments == 0 {
        0.0
    } else {
        total_savings_usd / total_payments as f64
    };

    let mut network_usage: BTreeMap<String, usize> = BTreeMap::new();
    for d in decisions {
        *network_usage.entry(d.selected_network.clone()).or_default() += 1;
    }
    let fallback_count = decisions.iter().filter(|d| d.fallback).count();

    let recommendations = recommend(
        time_range,
        decisions,
        &network_usage,
        fallback_count,
        expensive_networks,
    );

    AnalyticsSummary {
        merchant_id: merchant_id.to_string(),
        time_range,
        total_payments,
        total_savings_usd,
        average_savings_usd,
        network_usage,
        fallback_count,
        recommendations,
    }
}

fn recommend(
    time_range: TimeRange,
    decisions: &[RoutingDecision],
    network_usage: &BTreeMap<String, usize>,
    fallback_count: usize,
    expensive_networks: &BTreeSet<String>,
) -> Vec<String> {
    let total = decisions.len();
    if total == 0 {
        return vec![format!(
            "No routed payments in the last {time_range}; recommendations will appear once payments are routed."
        )];
    }
    let share = |count: usize| count as f64 / total as f64;
    let mut out = Vec::new();

    let expensive: usize = network_usage
        .iter()
        .filter(|(network, _)| expensive_networks.contains(*network))
        .map(|(_, count)| *count)
        .sum();
    if share(expensive) > EXPENSIVE_SHARE_THRESHOLD {
        out.push(format!(
            "More than 30% of routed payments ({:.0}%) used a known-expensive network. Consider switching the default priority to cost.",
            share(expensive) * 100.0
        ));
    }

    if share(fallback_count) > FALLBACK_SHARE_THRESHOLD {
        out.push(format!(
            "{fallback_count} of {total} payments were routed to the fallback network because no network had fresh data. Check network monitor health."
        ));
    }

    let high_value = decisions
        .iter()
        .filter(|d| d.payment_amount > LARGE_PAYMENT_THRESHOLD)
        .count();
    if share(high_value) > HIGH_VALUE_SHARE_THRESHOLD {
        out.push(
            "Most payments are high-value. Consider listing a highly reliable network first in preferred networks."
                .to_string(),
        );
    }

    if out.is_empty() {
        out.push("Routing is performing well. No changes recommended.".to_string());
    }
    out
}
