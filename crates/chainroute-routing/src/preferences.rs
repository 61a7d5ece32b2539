use std::fmt;
use std::str::FromStr;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// Default merchant reliability floor for override candidates.
pub const DEFAULT_MIN_RELIABILITY: f64 = 0.8;

/// What a merchant wants the engine to favour when it overrides the base ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Cost,
    Speed,
    #[default]
    Balanced,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cost => "cost",
            Self::Speed => "speed",
            Self::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cost" => Ok(Self::Cost),
            "speed" => Ok(Self::Speed),
            "balanced" => Ok(Self::Balanced),
            other => Err(RoutingError::InvalidInput(format!(
                "unknown priority '{other}'"
            ))),
        }
    }
}

fn default_min_reliability() -> f64 {
    DEFAULT_MIN_RELIABILITY
}

/// A merchant's stored routing preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingPreferences {
    #[serde(default)]
    pub priority: Priority,
    /// Ordered network keys; only the first entry is ever considered.
    #[serde(default)]
    pub preferred_networks: Vec<String>,
    #[serde(default)]
    pub max_gas_price_gwei: Option<f64>,
    #[serde(default = "default_min_reliability")]
    pub min_reliability: f64,
}

impl Default for RoutingPreferences {
    fn default() -> Self {
        Self {
            priority: Priority::default(),
            preferred_networks: Vec::new(),
            max_gas_price_gwei: None,
            min_reliability: DEFAULT_MIN_RELIABILITY,
        }
    }
}

impl RoutingPreferences {
    /// Overlay the fields present in `update`.
    pub fn merge(&mut self, update: PreferencesUpdate) {
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(networks) = update.preferred_networks {
            self.preferred_networks = networks;
        }
        if update.clear_max_gas_price {
            self.max_gas_price_gwei = None;
        }
        if let Some(ceiling) = update.max_gas_price_gwei {
            self.max_gas_price_gwei = Some(ceiling);
        }
        if let Some(min) = update.min_reliability {
            self.min_reliability = min;
        }
    }

    /// Whether a network with these metrics passes the merchant's ceiling
    /// and reliability floor.
    pub fn admits(&self, gas_price_gwei: f64, reliability: f64) -> bool {
        let under_ceiling = self
            .max_gas_price_gwei
            .map_or(true, |ceiling| gas_price_gwei <= ceiling);
        under_ceiling && reliability >= self.min_reliability
    }
}

/// A partial preference write. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub preferred_networks: Option<Vec<String>>,
    #[serde(default)]
    pub max_gas_price_gwei: Option<f64>,
    /// Remove the stored gas price ceiling.
    #[serde(default)]
    pub clear_max_gas_price: bool,
    #[serde(default)]
    pub min_reliability: Option<f64>,
}

impl PreferencesUpdate {
    /// Reject values that could never be satisfied.
    pub fn validate(&self) -> Result<(), RoutingError> {
        if let Some(min) = self.min_reliability {
            if !(0.0..=1.0).contains(&min) {
                return Err(RoutingError::InvalidInput(format!(
                    "min_reliability must be in [0, 1], got {min}"
                )));
            }
        }
        if self.clear_max_gas_price && self.max_gas_price_gwei.is_some() {
            return Err(RoutingError::InvalidInput(
                "max_gas_price_gwei cannot be set and cleared in one update".into(),
            ));
        }
        if let Some(ceiling) = self.max_gas_price_gwei {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(RoutingError::InvalidInput(format!(
                    "max_gas_price_gwei must be a non-negative number, got {ceiling}"
                )));
            }
        }
        if let Some(networks) = &self.preferred_networks {
            if networks.iter().any(|n| n.trim().is_empty()) {
                return Err(RoutingError::InvalidInput(
                    "preferred_networks entries must be non-empty".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Per-call customer preferences. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerPreferences {
    #[serde(default)]
    pub network: Option<String>,
}

/// The preferences in effect for one routing decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppliedPreferences {
    /// `None` when the merchant had no stored record.
    pub merchant: Option<RoutingPreferences>,
    pub customer: Option<CustomerPreferences>,
}

/// Keyed store of merchant routing preferences.
///
/// Writes merge over the existing record (or the defaults) atomically per
/// merchant. Records are never deleted.
pub trait PreferenceStore: Send + Sync {
    /// Stored preferences or the defaults. Never creates a record.
    fn get(&self, merchant_id: &str) -> RoutingPreferences;

    /// The stored record, if any.
    fn find(&self, merchant_id: &str) -> Option<RoutingPreferences>;

    /// Merge `update` into the record and return the result.
    fn set(&self, merchant_id: &str, update: PreferencesUpdate) -> RoutingPreferences;

    fn contains(&self, merchant_id: &str) -> bool {
        self.find(merchant_id).is_some()
    }
}

/// Process-lifetime preference store.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    records: DashMap<String, RoutingPreferences>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, merchant_id: &str) -> RoutingPreferences {
        self.find(merchant_id).unwrap_or_default()
    }

    fn find(&self, merchant_id: &str) -> Option<RoutingPreferences> {
        self.records.get(merchant_id).map(|r| r.value().clone())
    }

    fn set(&self, merchant_id: &str, update: PreferencesUpdate) -> RoutingPreferences {
        let mut record = self.records.entry(merchant_id.to_string()).or_default();
        record.merge(update);
        tracing::debug!(
            merchant = %merchant_id,
            priority = %record.priority,
            preferred = ?record.preferred_networks,
            "Merchant preferences updated"
        );
        record.clone()
    }
}
