use std::cmp::Ordering;

use chainroute_core::{NetworkState, SpeedClass, Urgency};
use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

/// Payments strictly below this amount lean further towards cost.
pub const SMALL_PAYMENT_THRESHOLD: f64 = 100.0;

/// Payments strictly above this amount lean further towards reliability.
pub const LARGE_PAYMENT_THRESHOLD: f64 = 1000.0;

/// Configurable weights for the network scoring formula.
///
/// The score is computed as:
///   `score = cost * c + speed * s + reliability * r`
///   `      + urgency * s                 (urgency == high)`
///   `      + small_payment_cost * c      (amount < 100)`
///   `      + large_payment_reliability * r (amount > 1000)`
///
/// where `c = max(0, 100 - cost_usd * 1000)`, `s` is the speed class score
/// and `r = reliability * 100`. All weights must be in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub cost: f64,
    pub speed: f64,
    pub reliability: f64,
    pub urgency: f64,
    pub small_payment_cost: f64,
    pub large_payment_reliability: f64,
}

impl ScoringWeights {
    /// Validate that every weight is in [0, 1].
    pub fn validate(&self) -> Result<(), RoutingError> {
        let weights = [
            ("cost", self.cost),
            ("speed", self.speed),
            ("reliability", self.reliability),
            ("urgency", self.urgency),
            ("small_payment_cost", self.small_payment_cost),
            ("large_payment_reliability", self.large_payment_reliability),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(RoutingError::InvalidScoringWeight { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cost: 0.4,
            speed: 0.3,
            reliability: 0.2,
            urgency: 0.1,
            small_payment_cost: 0.2,
            large_payment_reliability: 0.2,
        }
    }
}

/// The score of one network for one payment, with its inputs kept for
/// transparency and for the preference overrides that need them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkScore {
    pub network: String,
    /// The composite score value. Higher is better.
    pub value: f64,
    pub cost_component: f64,
    pub speed_component: f64,
    pub reliability_component: f64,
    pub estimated_cost_usd: f64,
    pub gas_price_gwei: f64,
    pub speed_class: SpeedClass,
    pub reliability: f64,
}

impl NetworkScore {
    /// Score a network state for a payment of `amount` at `urgency`.
    pub fn compute(
        state: &NetworkState,
        amount: f64,
        urgency: Urgency,
        weights: &ScoringWeights,
    ) -> Self {
        let cost_component = cost_score(state.estimated_cost_usd);
        let speed_component = state.speed_class.score();
        let reliability_component = state.reliability * 100.0;

        let mut value = weights.cost * cost_component
            + weights.speed * speed_component
            + weights.reliability * reliability_component;
        if urgency == Urgency::High {
            value += weights.urgency * speed_component;
        }
        if amount < SMALL_PAYMENT_THRESHOLD {
            value += weights.small_payment_cost * cost_component;
        }
        if amount > LARGE_PAYMENT_THRESHOLD {
            value += weights.large_payment_reliability * reliability_component;
        }

        Self {
            network: state.key.clone(),
            value,
            cost_component,
            speed_component,
            reliability_component,
            estimated_cost_usd: state.estimated_cost_usd,
            gas_price_gwei: state.gas_price_gwei,
            speed_class: state.speed_class,
            reliability: state.reliability,
        }
    }
}

/// `max(0, 100 - cost_usd * 1000)`: anything above $0.10 earns nothing.
pub fn cost_score(cost_usd: f64) -> f64 {
    (100.0 - cost_usd * 1000.0).max(0.0)
}

/// Score every state and sort best-first. Equal scores are ordered by
/// network key so the ranking is reproducible.
pub fn rank_networks(
    states: &[NetworkState],
    amount: f64,
    urgency: Urgency,
    weights: &ScoringWeights,
) -> Vec<NetworkScore> {
    let mut ranking: Vec<NetworkScore> = states
        .iter()
        .map(|state| NetworkScore::compute(state, amount, urgency, weights))
        .collect();
    ranking.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.network.cmp(&b.network))
    });
    ranking
}
