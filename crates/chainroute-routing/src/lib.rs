//! Chainroute Routing — picks the network a payment should settle on.
//!
//! Networks are scored from live fee conditions using configurable weights:
//! - **Cost**: cheaper transfers score higher, nothing above $0.10
//! - **Speed**: fixed lookup per speed class
//! - **Reliability**: the monitor's decaying confidence in the network
//!
//! Merchant preferences ([`PreferenceStore`]) and per-call customer
//! preferences override the ranking in that order of increasing precedence.
//! Every routed decision lands in a bounded [`DecisionLog`] that feeds
//! per-merchant analytics.

pub mod analytics;
pub mod decision;
pub mod engine;
pub mod error;
pub mod preferences;
pub mod scoring;

pub use analytics::{AnalyticsSummary, TimeRange};
pub use decision::{DecisionLog, RoutingDecision, SelectionReason, DEFAULT_LOG_CAPACITY};
pub use engine::{
    AlternativeNetwork, EngineSettings, RecommendationReport, RouteRequest, RoutingEngine,
    SimulationResult, SimulationScenario,
};
pub use error::RoutingError;
pub use preferences::{
    AppliedPreferences, CustomerPreferences, InMemoryPreferenceStore, PreferenceStore,
    PreferencesUpdate, Priority, RoutingPreferences,
};
pub use scoring::{rank_networks, NetworkScore, ScoringWeights};
