use std::collections::VecDeque;
use std::fmt;

use chainroute_core::{PaymentCurrency, Urgency};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preferences::AppliedPreferences;

/// Default number of decisions kept in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 1000;

/// Which precedence level chose the selected network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// No network was fresh; the configured fallback was used unscored.
    Fallback,
    BestScore,
    MerchantPreferredNetwork,
    MerchantPriorityCost,
    MerchantPrioritySpeed,
    CustomerOverride,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::BestScore => "best_score",
            Self::MerchantPreferredNetwork => "merchant_preferred_network",
            Self::MerchantPriorityCost => "merchant_priority_cost",
            Self::MerchantPrioritySpeed => "merchant_priority_speed",
            Self::CustomerOverride => "customer_override",
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The recorded outcome of one routing request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub routing_id: Uuid,
    pub merchant_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub payment_amount: f64,
    pub currency: PaymentCurrency,
    pub urgency: Urgency,
    pub selected_network: String,
    /// Other fresh networks, cheapest first, at most three.
    pub alternative_networks: Vec<String>,
    /// Cost of one transfer on the selected network. On fallback, the last
    /// known cost (zero if never polled).
    pub estimated_cost_usd: f64,
    pub estimated_savings_usd: f64,
    pub estimated_savings_percent: f64,
    pub applied_preferences: AppliedPreferences,
    pub selection_reason: SelectionReason,
    pub fallback: bool,
    pub recommendation: String,
}

/// Bounded FIFO of the most recent routing decisions across all merchants.
///
/// Append and eviction happen under one lock, so concurrent `record` calls
/// never lose entries or overshoot the capacity.
pub struct DecisionLog {
    capacity: usize,
    entries: Mutex<VecDeque<RoutingDecision>>,
}

impl DecisionLog {
    /// A log holding at most `capacity` decisions (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn record(&self, decision: RoutingDecision) {
        let mut entries = self.entries.lock();
        entries.push_back(decision);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<RoutingDecision> {
        self.entries.lock().iter().cloned().collect()
    }

    /// A merchant's entries at or after `since`, oldest first.
    pub fn for_merchant_since(
        &self,
        merchant_id: &str,
        since: DateTime<Utc>,
    ) -> Vec<RoutingDecision> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.merchant_id.as_deref() == Some(merchant_id) && d.timestamp >= since)
            .cloned()
            .collect()
    }
}

impl Default for DecisionLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl fmt::Debug for DecisionLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecisionLog")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish()
    }
}
