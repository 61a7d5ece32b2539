//! Shared fixtures for the cross-crate routing tests.
//!
//! Two networks, `a` and `b`, with one speed table between them. Native
//! token prices are picked so round gwei figures land on round USD costs.

use std::sync::Arc;
use std::time::Duration;

use chainroute_core::{
    CoreConfig, NetworkDescriptor, NetworkSnapshot, NetworkState, NetworkStateSource,
    SpeedClass, SpeedTable, SpeedTier, STANDARD_TRANSFER_GAS,
};
use chainroute_monitor::{FixedFeeClient, FixedPriceOracle, MonitorConfig, NetworkMonitor};
use chainroute_routing::{DecisionLog, EngineSettings, InMemoryPreferenceStore, RoutingEngine};
use chrono::{Duration as ChronoDuration, Utc};
use num_bigint::BigUint;

/// USD per AAA: 1 gwei on `a` costs $0.001 per transfer.
pub const AAA_USD: f64 = 0.001 / (STANDARD_TRANSFER_GAS as f64 * 1e-9);
/// USD per BBB: 50 gwei on `b` costs $0.50 per transfer.
pub const BBB_USD: f64 = 0.5 / (50.0 * STANDARD_TRANSFER_GAS as f64 * 1e-9);

/// Under 5 gwei is very fast, under 20 is fast, anything else slow.
pub fn speed_table() -> SpeedTable {
    SpeedTable::new(
        vec![
            SpeedTier {
                below_gwei: 5.0,
                class: SpeedClass::VeryFast,
            },
            SpeedTier {
                below_gwei: 20.0,
                class: SpeedClass::Fast,
            },
        ],
        SpeedClass::Slow,
    )
}

fn descriptor(key: &str, native: &str, chain_id: u64) -> NetworkDescriptor {
    NetworkDescriptor {
        key: key.into(),
        display_name: format!("Network {}", key.to_ascii_uppercase()),
        chain_id,
        native_currency: native.into(),
        rpc_endpoint: format!("http://{key}.invalid"),
        explorer_url: format!("http://explorer.{key}.invalid"),
        initial_reliability: 1.0,
        speed_table: speed_table(),
    }
}

/// Catalog of `a` and `b`, falling back to `a`.
pub fn two_network_catalog() -> CoreConfig {
    CoreConfig {
        fallback_network: "a".into(),
        networks: vec![descriptor("a", "AAA", 1001), descriptor("b", "BBB", 1002)],
    }
}

/// A monitor-backed engine over the two-network catalog, with fee and price
/// sources the test can steer.
pub struct Harness {
    pub monitor: Arc<NetworkMonitor>,
    pub fees: Arc<FixedFeeClient>,
    pub oracle: Arc<FixedPriceOracle>,
    pub store: Arc<InMemoryPreferenceStore>,
    pub log: Arc<DecisionLog>,
    pub engine: RoutingEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_log_capacity(chainroute_routing::DEFAULT_LOG_CAPACITY)
    }

    pub fn with_log_capacity(capacity: usize) -> Self {
        let catalog = two_network_catalog();
        let fees = Arc::new(FixedFeeClient::new());
        let oracle = Arc::new(FixedPriceOracle::with_prices([
            ("AAA", AAA_USD),
            ("BBB", BBB_USD),
        ]));
        let monitor = Arc::new(
            NetworkMonitor::new(
                catalog.networks.clone(),
                fees.clone(),
                oracle.clone(),
                MonitorConfig {
                    update_interval: Duration::from_millis(20),
                    poll_timeout: Duration::from_millis(200),
                },
            )
            .expect("monitor"),
        );
        let store = Arc::new(InMemoryPreferenceStore::new());
        let log = Arc::new(DecisionLog::new(capacity));
        let engine = RoutingEngine::new(
            &catalog,
            monitor.clone(),
            store.clone(),
            log.clone(),
            EngineSettings::default(),
        )
        .expect("engine");

        Self {
            monitor,
            fees,
            oracle,
            store,
            log,
            engine,
        }
    }

    /// `a` at 1 gwei ($0.001, very fast) and `b` at 50 gwei ($0.50, slow).
    pub fn set_cheap_a_slow_b(&self) {
        self.fees.set_gas_price_gwei("a", 1.0);
        self.fees.set_gas_price_gwei("b", 50.0);
    }

    /// `a` at 10 gwei ($0.01, fast) and `b` at 2 gwei ($0.02, very fast).
    pub fn set_fast_b(&self) {
        self.fees.set_gas_price_gwei("a", 10.0);
        self.fees.set_gas_price_gwei("b", 2.0);
    }

    /// Run one polling round and assert it went through for every network.
    pub async fn poll_ok(&self) {
        let summary = self.monitor.poll_all().await;
        assert!(
            summary.failed.is_empty(),
            "unexpected poll failures: {:?}",
            summary.failed
        );
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// A hand-built network state, `age_secs` old.
pub fn state(key: &str, cost_usd: f64, speed: SpeedClass, reliability: f64, age_secs: i64) -> NetworkState {
    NetworkState {
        key: key.into(),
        gas_price_wei: BigUint::from(1_000_000_000u64),
        gas_price_gwei: 1.0,
        estimated_cost_usd: cost_usd,
        speed_class: speed,
        reliability,
        last_updated: Some(Utc::now() - ChronoDuration::seconds(age_secs)),
    }
}

pub fn snapshot(states: impl IntoIterator<Item = NetworkState>) -> NetworkSnapshot {
    states.into_iter().map(|s| (s.key.clone(), s)).collect()
}

/// A snapshot-backed engine over an arbitrary catalog of `states`. The first
/// state's network is the fallback.
pub fn snapshot_engine(states: Vec<NetworkState>) -> (RoutingEngine, Arc<DecisionLog>) {
    let catalog = CoreConfig {
        fallback_network: states.first().map(|s| s.key.clone()).unwrap_or_default(),
        networks: states
            .iter()
            .enumerate()
            .map(|(i, s)| descriptor(&s.key, "ETH", 2000 + i as u64))
            .collect(),
    };
    let log = Arc::new(DecisionLog::default());
    let source: Arc<dyn NetworkStateSource> = Arc::new(snapshot(states));
    let engine = RoutingEngine::new(
        &catalog,
        source,
        Arc::new(InMemoryPreferenceStore::new()),
        log.clone(),
        EngineSettings::default(),
    )
    .expect("engine");
    (engine, log)
}
