use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use chainroute_core::{
    fresh_subset, is_recent, CoreConfig, NetworkSnapshot, NetworkState, NetworkStateSource,
    PaymentCurrency, SpeedClass, Urgency,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::{self, default_expensive_networks, AnalyticsSummary, TimeRange};
use crate::decision::{DecisionLog, RoutingDecision, SelectionReason};
use crate::error::RoutingError;
use crate::preferences::{
    AppliedPreferences, CustomerPreferences, PreferenceStore, PreferencesUpdate, Priority,
    RoutingPreferences,
};
use crate::scoring::{
    rank_networks, NetworkScore, ScoringWeights, LARGE_PAYMENT_THRESHOLD, SMALL_PAYMENT_THRESHOLD,
};

/// A customer-named network must be strictly more reliable than this.
pub const CUSTOMER_MIN_RELIABILITY: f64 = 0.7;

/// A merchant's first preferred network must be strictly more reliable than this.
pub const PREFERRED_MIN_RELIABILITY: f64 = 0.8;

/// Maximum number of alternatives reported with a decision.
pub const MAX_ALTERNATIVES: usize = 3;

/// Tunables of the routing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Networks the analytics rules treat as expensive.
    #[serde(default = "default_expensive_networks")]
    pub expensive_networks: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            expensive_networks: default_expensive_networks(),
        }
    }
}

/// One payment to route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub amount: f64,
    pub currency: PaymentCurrency,
    pub urgency: Urgency,
    pub merchant_id: Option<String>,
    pub customer: Option<CustomerPreferences>,
}

impl RouteRequest {
    pub fn new(amount: f64, currency: PaymentCurrency) -> Self {
        Self {
            amount,
            currency,
            urgency: Urgency::default(),
            merchant_id: None,
            customer: None,
        }
    }

    pub fn urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    pub fn customer_network(mut self, network: impl Into<String>) -> Self {
        self.customer = Some(CustomerPreferences {
            network: Some(network.into()),
        });
        self
    }

    /// Build a request from loosely typed caller input.
    ///
    /// Currency and urgency are parsed case-insensitively; an absent urgency
    /// means `normal`.
    pub fn parse(
        amount: f64,
        currency: &str,
        urgency: Option<&str>,
        merchant_id: Option<String>,
        customer: Option<CustomerPreferences>,
    ) -> Result<Self, RoutingError> {
        let currency: PaymentCurrency = currency.parse()?;
        let urgency = match urgency {
            Some(u) => u.parse()?,
            None => Urgency::default(),
        };
        Ok(Self {
            amount,
            currency,
            urgency,
            merchant_id,
            customer,
        })
    }
}

/// One `{amount, urgency}` what-if query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationScenario {
    pub amount: f64,
    #[serde(default)]
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub amount: f64,
    pub urgency: Urgency,
    pub optimal_network: String,
    pub estimated_cost_usd: f64,
    /// `None` for a fallback result, which is never scored.
    pub score: Option<f64>,
    pub estimated_confirmation_time: String,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub amount: f64,
    pub urgency: Urgency,
    pub optimal_network: String,
    pub estimated_cost_usd: f64,
    pub alternatives: Vec<AlternativeNetwork>,
    pub estimated_savings_usd: f64,
    pub estimated_savings_percent: f64,
    pub recommendation: String,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeNetwork {
    pub network: String,
    pub estimated_cost_usd: f64,
    pub speed_class: SpeedClass,
    pub reliability: f64,
}

/// What the pipeline picked before anything is recorded.
struct Selection {
    network: String,
    estimated_cost_usd: f64,
    speed_class: Option<SpeedClass>,
    reliability: Option<f64>,
    score: Option<f64>,
    alternatives: Vec<NetworkState>,
    savings_usd: f64,
    savings_percent: f64,
    reason: SelectionReason,
}

impl Selection {
    fn is_fallback(&self) -> bool {
        self.reason == SelectionReason::Fallback
    }
}

/// Turns payment intents into network choices.
///
/// Reads network conditions from a [`NetworkStateSource`], merchant
/// preferences from a [`PreferenceStore`], and appends every routed decision
/// to a [`DecisionLog`]. Never waits on the monitor.
pub struct RoutingEngine {
    fallback_network: String,
    networks: BTreeSet<String>,
    source: Arc<dyn NetworkStateSource>,
    preferences: Arc<dyn PreferenceStore>,
    log: Arc<DecisionLog>,
    weights: ScoringWeights,
    expensive_networks: BTreeSet<String>,
}

impl RoutingEngine {
    /// Validates the catalog (including the fallback network) and weights.
    pub fn new(
        catalog: &CoreConfig,
        source: Arc<dyn NetworkStateSource>,
        preferences: Arc<dyn PreferenceStore>,
        log: Arc<DecisionLog>,
        settings: EngineSettings,
    ) -> Result<Self, RoutingError> {
        catalog.validate()?;
        settings.weights.validate()?;
        Ok(Self {
            fallback_network: catalog.fallback_network.clone(),
            networks: catalog.networks.iter().map(|d| d.key.clone()).collect(),
            source,
            preferences,
            log,
            weights: settings.weights,
            expensive_networks: settings.expensive_networks.into_iter().collect(),
        })
    }

    pub fn fallback_network(&self) -> &str {
        &self.fallback_network
    }

    pub fn decision_log(&self) -> &Arc<DecisionLog> {
        &self.log
    }

    /// Route one payment and record the decision.
    pub fn route(&self, request: RouteRequest) -> Result<RoutingDecision, RoutingError> {
        self.validate_request(&request)?;

        let now = Utc::now();
        let snapshot = self.source.snapshot();
        let merchant_prefs = request
            .merchant_id
            .as_deref()
            .and_then(|m| self.preferences.find(m));

        let selection = self.select(
            &snapshot,
            now,
            request.amount,
            request.urgency,
            merchant_prefs.as_ref(),
            request.customer.as_ref(),
        );

        let recommendation = self.recommendation_text(request.amount, &selection);
        let decision = RoutingDecision {
            routing_id: Uuid::now_v7(),
            merchant_id: request.merchant_id,
            timestamp: now,
            payment_amount: request.amount,
            currency: request.currency,
            urgency: request.urgency,
            selected_network: selection.network.clone(),
            alternative_networks: selection.alternatives.iter().map(|s| s.key.clone()).collect(),
            estimated_cost_usd: selection.estimated_cost_usd,
            estimated_savings_usd: selection.savings_usd,
            estimated_savings_percent: selection.savings_percent,
            applied_preferences: AppliedPreferences {
                merchant: merchant_prefs,
                customer: request.customer,
            },
            selection_reason: selection.reason,
            fallback: selection.is_fallback(),
            recommendation,
        };

        self.log.record(decision.clone());

        if decision.fallback {
            tracing::warn!(
                routing_id = %decision.routing_id,
                fallback = %decision.selected_network,
                "No fresh network data, routed to fallback network"
            );
        } else {
            tracing::info!(
                routing_id = %decision.routing_id,
                network = %decision.selected_network,
                reason = %decision.selection_reason,
                amount = decision.payment_amount,
                savings_usd = decision.estimated_savings_usd,
                "Payment routed"
            );
        }

        Ok(decision)
    }

    /// Score each scenario without preferences and without logging.
    pub fn simulate(
        &self,
        scenarios: &[SimulationScenario],
    ) -> Result<Vec<SimulationResult>, RoutingError> {
        for scenario in scenarios {
            validate_amount(scenario.amount)?;
        }
        let now = Utc::now();
        let snapshot = self.source.snapshot();

        Ok(scenarios
            .iter()
            .map(|scenario| {
                let selection =
                    self.select(&snapshot, now, scenario.amount, scenario.urgency, None, None);
                SimulationResult {
                    amount: scenario.amount,
                    urgency: scenario.urgency,
                    estimated_confirmation_time: selection
                        .speed_class
                        .map(|c| c.confirmation_time().to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                    optimal_network: selection.network,
                    estimated_cost_usd: selection.estimated_cost_usd,
                    score: selection.score,
                    fallback: selection.reason == SelectionReason::Fallback,
                }
            })
            .collect())
    }

    /// The unbiased best network for a payment, with alternatives and
    /// savings. Nothing is recorded.
    pub fn recommendations(
        &self,
        amount: f64,
        urgency: Urgency,
    ) -> Result<RecommendationReport, RoutingError> {
        validate_amount(amount)?;
        let snapshot = self.source.snapshot();
        let selection = self.select(&snapshot, Utc::now(), amount, urgency, None, None);
        let recommendation = self.recommendation_text(amount, &selection);

        Ok(RecommendationReport {
            amount,
            urgency,
            optimal_network: selection.network.clone(),
            estimated_cost_usd: selection.estimated_cost_usd,
            alternatives: selection
                .alternatives
                .iter()
                .map(|s| AlternativeNetwork {
                    network: s.key.clone(),
                    estimated_cost_usd: s.estimated_cost_usd,
                    speed_class: s.speed_class,
                    reliability: s.reliability,
                })
                .collect(),
            estimated_savings_usd: selection.savings_usd,
            estimated_savings_percent: selection.savings_percent,
            recommendation,
            fallback: selection.is_fallback(),
        })
    }

    /// Aggregate a merchant's logged decisions over `range`.
    pub fn analytics(&self, merchant_id: &str, range: TimeRange) -> AnalyticsSummary {
        let since = Utc::now() - range.duration();
        let decisions = self.log.for_merchant_since(merchant_id, since);
        analytics::summarize(merchant_id, range, &decisions, &self.expensive_networks)
    }

    pub fn set_preferences(
        &self,
        merchant_id: &str,
        update: PreferencesUpdate,
    ) -> Result<RoutingPreferences, RoutingError> {
        if merchant_id.trim().is_empty() {
            return Err(RoutingError::InvalidInput("merchant id is empty".into()));
        }
        update.validate()?;
        if let Some(networks) = &update.preferred_networks {
            if let Some(unknown) = networks.iter().find(|n| !self.networks.contains(*n)) {
                return Err(RoutingError::InvalidInput(format!(
                    "unknown preferred network '{unknown}'"
                )));
            }
        }
        Ok(self.preferences.set(merchant_id, update))
    }

    pub fn preferences(&self, merchant_id: &str) -> RoutingPreferences {
        self.preferences.get(merchant_id)
    }

    fn validate_request(&self, request: &RouteRequest) -> Result<(), RoutingError> {
        validate_amount(request.amount)?;
        if let Some(merchant) = &request.merchant_id {
            if merchant.trim().is_empty() {
                return Err(RoutingError::InvalidInput("merchant id is empty".into()));
            }
        }
        if let Some(network) = request.customer.as_ref().and_then(|c| c.network.as_deref()) {
            if network.trim().is_empty() {
                return Err(RoutingError::InvalidInput(
                    "customer network preference is empty".into(),
                ));
            }
            if !self.networks.contains(network) {
                return Err(RoutingError::InvalidInput(format!(
                    "customer network preference names unknown network '{network}'"
                )));
            }
        }
        Ok(())
    }

    /// The scoring pipeline: freshness filter, ranking, merchant and
    /// customer overrides, alternatives and savings.
    fn select(
        &self,
        snapshot: &NetworkSnapshot,
        now: DateTime<Utc>,
        amount: f64,
        urgency: Urgency,
        merchant: Option<&RoutingPreferences>,
        customer: Option<&CustomerPreferences>,
    ) -> Selection {
        let fresh = fresh_subset(snapshot, now);
        let ranking = rank_networks(&fresh, amount, urgency, &self.weights);

        let Some(best) = ranking.first() else {
            return self.fallback_selection(snapshot);
        };

        let mut chosen: &str = &best.network;
        let mut reason = SelectionReason::BestScore;

        if let Some((network, merchant_reason)) =
            merchant.and_then(|p| merchant_override(p, &ranking))
        {
            chosen = network;
            reason = merchant_reason;
        }

        if let Some(network) = customer.and_then(|c| c.network.as_deref()) {
            let eligible = snapshot
                .get(network)
                .is_some_and(|s| is_recent(s, now) && s.reliability > CUSTOMER_MIN_RELIABILITY);
            if eligible {
                chosen = network;
                reason = SelectionReason::CustomerOverride;
            } else {
                tracing::debug!(network = %network, "Customer network not eligible, ignored");
            }
        }

        // Ranked and customer-eligible networks both come from the snapshot.
        let Some(selected) = snapshot.get(chosen).cloned() else {
            return self.fallback_selection(snapshot);
        };
        let score = ranking
            .iter()
            .find(|s| s.network == selected.key)
            .map(|s| s.value);

        let mut alternatives: Vec<NetworkState> =
            fresh.into_iter().filter(|s| s.key != selected.key).collect();
        alternatives.sort_by(|a, b| {
            a.estimated_cost_usd
                .partial_cmp(&b.estimated_cost_usd)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
        alternatives.truncate(MAX_ALTERNATIVES);

        let (savings_usd, savings_percent) = match alternatives.last() {
            Some(most_expensive) => savings(
                most_expensive.estimated_cost_usd,
                selected.estimated_cost_usd,
            ),
            None => (0.0, 0.0),
        };

        Selection {
            network: selected.key.clone(),
            estimated_cost_usd: selected.estimated_cost_usd,
            speed_class: Some(selected.speed_class),
            reliability: Some(selected.reliability),
            score,
            alternatives,
            savings_usd,
            savings_percent,
            reason,
        }
    }

    /// Unscored pick of the configured fallback network, carrying its last
    /// known figures when it has ever been polled.
    fn fallback_selection(&self, snapshot: &NetworkSnapshot) -> Selection {
        let last_known = snapshot.get(&self.fallback_network);
        Selection {
            network: self.fallback_network.clone(),
            estimated_cost_usd: last_known.map_or(0.0, |s| s.estimated_cost_usd),
            speed_class: last_known.map(|s| s.speed_class),
            reliability: last_known.map(|s| s.reliability),
            score: None,
            alternatives: Vec::new(),
            savings_usd: 0.0,
            savings_percent: 0.0,
            reason: SelectionReason::Fallback,
        }
    }

    fn recommendation_text(&self, amount: f64, selection: &Selection) -> String {
        if selection.is_fallback() {
            return format!(
                "No network currently has fresh fee data. Routed to the fallback network {}; cost estimates may be outdated.",
                selection.network
            );
        }
        let network = &selection.network;
        let cost = selection.estimated_cost_usd;
        if amount < SMALL_PAYMENT_THRESHOLD {
            format!(
                "Small payment: {network} keeps the network fee to about ${cost:.4}, so fees stay a small share of the payment."
            )
        } else if amount > LARGE_PAYMENT_THRESHOLD {
            let reliability = selection.reliability.unwrap_or(0.0) * 100.0;
            format!(
                "Large payment: {network} was favoured for reliability ({reliability:.0}%) at an estimated fee of ${cost:.4}."
            )
        } else {
            let eta = selection
                .speed_class
                .map(|c| c.confirmation_time())
                .unwrap_or("unknown");
            format!(
                "{network} offers the best overall balance for this payment: about ${cost:.4} in fees, confirmation in {eta}."
            )
        }
    }
}

/// The merchant step: first preferred network, else the priority rule.
fn merchant_override<'a>(
    prefs: &RoutingPreferences,
    ranking: &'a [NetworkScore],
) -> Option<(&'a str, SelectionReason)> {
    if let Some(first) = prefs.preferred_networks.first() {
        let floor = PREFERRED_MIN_RELIABILITY.max(prefs.min_reliability);
        let preferred = ranking.iter().find(|s| {
            &s.network == first
                && s.reliability > floor
                && prefs.admits(s.gas_price_gwei, s.reliability)
        });
        if let Some(score) = preferred {
            return Some((&score.network, SelectionReason::MerchantPreferredNetwork));
        }
    }

    let mut candidates = ranking
        .iter()
        .filter(|s| prefs.admits(s.gas_price_gwei, s.reliability));
    match prefs.priority {
        Priority::Cost => candidates
            .fold(None, |cheapest: Option<&NetworkScore>, s| match cheapest {
                Some(c) if c.estimated_cost_usd <= s.estimated_cost_usd => Some(c),
                _ => Some(s),
            })
            .map(|s| (s.network.as_str(), SelectionReason::MerchantPriorityCost)),
        Priority::Speed => candidates
            .fold(None, |fastest: Option<&NetworkScore>, s| match fastest {
                Some(f) if f.speed_class >= s.speed_class => Some(f),
                _ => Some(s),
            })
            .map(|s| (s.network.as_str(), SelectionReason::MerchantPrioritySpeed)),
        Priority::Balanced => None,
    }
}

/// Savings against the most expensive alternative, as (usd, percent).
fn savings(most_expensive_cost: f64, selected_cost: f64) -> (f64, f64) {
    let usd = (most_expensive_cost - selected_cost).max(0.0);
    let percent = if most_expensive_cost > 0.0 {
        (usd / most_expensive_cost * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    (usd, percent)
}

fn validate_amount(amount: f64) -> Result<(), RoutingError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(RoutingError::InvalidInput(format!(
            "payment amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}
