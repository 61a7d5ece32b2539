//! Background collector of live fee conditions for every configured network.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainroute_core::{
    wei_to_gwei, CoreError, NetworkDescriptor, NetworkSnapshot, NetworkState, NetworkStateSource,
    SpeedClass, STANDARD_TRANSFER_GAS,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::MonitorError;
use crate::traits::{FeeDataClient, PriceOracle};

/// Amount subtracted from a network's reliability on every failed poll.
pub const RELIABILITY_DECAY: f64 = 0.1;

/// Reliability never decays below this value.
pub const RELIABILITY_FLOOR: f64 = 0.5;

/// Reliability is kept on a grid of this many steps per unit, so repeated
/// decay lands on exact thresholds.
const RELIABILITY_GRID: f64 = 1e6;

/// One decay step from `reliability`, snapped to the grid and clamped to
/// [`RELIABILITY_FLOOR`].
fn decay_reliability(reliability: f64) -> f64 {
    let decayed = ((reliability - RELIABILITY_DECAY) * RELIABILITY_GRID).round() / RELIABILITY_GRID;
    decayed.max(RELIABILITY_FLOOR)
}

const WEI_PER_NATIVE: f64 = 1e18;

/// Scheduling knobs for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between two polling rounds.
    pub update_interval: Duration,
    /// Upper bound on a single network poll (fee + price lookup).
    pub poll_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(8),
        }
    }
}

/// Answer to a network status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub networks: Vec<NetworkState>,
    /// Completion time of the most recent polling round.
    pub last_update: Option<DateTime<Utc>>,
    pub monitoring: bool,
}

/// Result of one polling round.
#[derive(Debug, Clone, Default)]
pub struct PollSummary {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Polls a fixed set of networks on an interval and keeps one
/// [`NetworkState`] per network.
///
/// Each record lives in a DashMap slot and is replaced with a single insert
/// on success, so readers never observe a half-written record.
pub struct NetworkMonitor {
    descriptors: BTreeMap<String, NetworkDescriptor>,
    states: DashMap<String, NetworkState>,
    fee_client: Arc<dyn FeeDataClient>,
    price_oracle: Arc<dyn PriceOracle>,
    config: MonitorConfig,
    running: AtomicBool,
    shutdown_tx: Mutex<Option<watch::Sender<bool>>>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
    last_round: RwLock<Option<DateTime<Utc>>>,
}

impl NetworkMonitor {
    /// Create a monitor for the given networks. Every network starts in its
    /// never-polled state.
    pub fn new(
        networks: Vec<NetworkDescriptor>,
        fee_client: Arc<dyn FeeDataClient>,
        price_oracle: Arc<dyn PriceOracle>,
        config: MonitorConfig,
    ) -> Result<Self, MonitorError> {
        let mut descriptors = BTreeMap::new();
        let states = DashMap::new();
        for descriptor in networks {
            descriptor.validate()?;
            states.insert(descriptor.key.clone(), NetworkState::initial(&descriptor));
            if descriptors
                .insert(descriptor.key.clone(), descriptor.clone())
                .is_some()
            {
                return Err(CoreError::DuplicateNetwork(descriptor.key).into());
            }
        }
        if descriptors.is_empty() {
            return Err(CoreError::EmptyCatalog.into());
        }

        tracing::info!(
            networks = descriptors.len(),
            fee_client = fee_client.client_id(),
            price_oracle = price_oracle.oracle_id(),
            interval_ms = config.update_interval.as_millis() as u64,
            "network monitor created"
        );

        Ok(Self {
            descriptors,
            states,
            fee_client,
            price_oracle,
            config,
            running: AtomicBool::new(false),
            shutdown_tx: Mutex::new(None),
            scheduler: Mutex::new(None),
            last_round: RwLock::new(None),
        })
    }

    /// Start background polling: one round immediately, then one every
    /// `update_interval`. Calling it while running does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        // start() and stop() flip `running` only while holding this lock.
        let mut shutdown_slot = self.shutdown_tx.lock();
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("network monitor already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.update_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        monitor.poll_all().await;
                    }
                }
            }
            tracing::info!("network monitor scheduler exited");
        });

        *shutdown_slot = Some(shutdown_tx);
        *self.scheduler.lock() = Some(handle);
        drop(shutdown_slot);
        tracing::info!("network monitor started");
    }

    /// Stop scheduling further rounds. A round already in flight runs to
    /// completion. Calling it while stopped does nothing.
    pub fn stop(&self) {
        let mut shutdown_slot = self.shutdown_tx.lock();
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = shutdown_slot.take() {
            let _ = tx.send(true);
        }
        drop(shutdown_slot);
        tracing::info!("network monitor stopped");
    }

    /// [`stop`](Self::stop), then wait up to `grace` for an in-flight round
    /// to finish. Returns `false` if the grace period ran out.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.stop();
        let handle = self.scheduler.lock().take();
        match handle {
            Some(handle) => match tokio::time::timeout(grace, handle).await {
                Ok(_) => true,
                Err(_) => {
                    tracing::warn!(
                        grace_ms = grace.as_millis() as u64,
                        "monitor shutdown grace period elapsed"
                    );
                    false
                }
            },
            None => true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Poll every network concurrently, one task each, and wait for all of
    /// them to settle. A failing or hanging network never holds up the others
    /// beyond the per-poll timeout.
    pub async fn poll_all(self: &Arc<Self>) -> PollSummary {
        let handles: Vec<(String, JoinHandle<Result<NetworkState, MonitorError>>)> = self
            .descriptors
            .keys()
            .map(|key| {
                let monitor = Arc::clone(self);
                let task_key = key.clone();
                let handle = tokio::spawn(async move { monitor.poll_network(&task_key).await });
                (key.clone(), handle)
            })
            .collect();

        let (keys, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut summary = PollSummary::default();
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(Ok(_)) => summary.succeeded.push(key),
                Ok(Err(_)) => summary.failed.push(key),
                Err(join_err) => {
                    // The task died before it could record its own failure.
                    tracing::error!(network = %key, error = %join_err, "poll task panicked");
                    self.record_failure(&key, &MonitorError::TaskFailed(join_err.to_string()));
                    summary.failed.push(key);
                }
            }
        }

        *self.last_round.write() = Some(Utc::now());
        tracing::debug!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            "polling round complete"
        );
        summary
    }

    /// Poll one network and fold the outcome into its state.
    ///
    /// On success the refreshed record is returned. On failure the record
    /// keeps its previous values and timestamp, its reliability decays, and
    /// the failure is returned.
    pub async fn poll_network(&self, key: &str) -> Result<NetworkState, MonitorError> {
        let descriptor = self
            .descriptors
            .get(key)
            .ok_or_else(|| MonitorError::UnknownNetwork(key.to_string()))?;

        let poll = tokio::time::timeout(self.config.poll_timeout, self.fetch(descriptor));
        let fetched = match poll.await {
            Ok(result) => result,
            Err(_) => Err(MonitorError::Timeout {
                network: key.to_string(),
                after_ms: self.config.poll_timeout.as_millis(),
            }),
        };

        match fetched {
            Ok(fresh) => Ok(self.record_success(fresh)),
            Err(e) if e.is_poll_failure() => {
                self.record_failure(key, &e);
                Err(e)
            }
            Err(e) => {
                // Not the network's fault; reliability is left alone.
                tracing::error!(network = %key, error = %e, "network poll rejected");
                Err(e)
            }
        }
    }

    async fn fetch(&self, descriptor: &NetworkDescriptor) -> Result<NetworkState, MonitorError> {
        let gas_price_wei = self.fee_client.gas_price(descriptor).await?;
        let native_usd = self
            .price_oracle
            .price_usd(&descriptor.native_currency)
            .await?;
        let gas_price_gwei = wei_to_gwei(&gas_price_wei);
        let estimated_cost_usd = transfer_cost_usd(&gas_price_wei, native_usd);

        Ok(NetworkState {
            key: descriptor.key.clone(),
            speed_class: descriptor.speed_table.classify(gas_price_gwei),
            gas_price_wei,
            gas_price_gwei,
            estimated_cost_usd,
            // Placeholder; the stored reliability is carried over on insert.
            reliability: descriptor.initial_reliability,
            last_updated: Some(Utc::now()),
        })
    }

    fn record_success(&self, fresh: NetworkState) -> NetworkState {
        let mut entry = self
            .states
            .entry(fresh.key.clone())
            .or_insert_with(|| fresh.clone());
        let reliability = entry.reliability;
        *entry = NetworkState {
            reliability,
            ..fresh
        };
        let stored = entry.clone();
        drop(entry);

        tracing::debug!(
            network = %stored.key,
            gwei = stored.gas_price_gwei,
            cost_usd = stored.estimated_cost_usd,
            speed = %stored.speed_class,
            "network state refreshed"
        );
        stored
    }

    fn record_failure(&self, key: &str, error: &MonitorError) {
        if let Some(mut state) = self.states.get_mut(key) {
            let decayed = decay_reliability(state.reliability);
            if decayed < state.reliability {
                state.reliability = decayed;
            }
            tracing::warn!(
                network = %key,
                error = %error,
                reliability = state.reliability,
                "network poll failed"
            );
        }
    }

    /// Operator override: restore a network's reliability to its configured
    /// initial value. Freshness still requires a successful poll.
    pub fn reset_reliability(&self, key: &str) -> Result<f64, MonitorError> {
        let descriptor = self
            .descriptors
            .get(key)
            .ok_or_else(|| MonitorError::UnknownNetwork(key.to_string()))?;
        let mut state = self
            .states
            .get_mut(key)
            .ok_or_else(|| MonitorError::UnknownNetwork(key.to_string()))?;
        state.reliability = descriptor.initial_reliability;
        tracing::info!(
            network = %key,
            reliability = state.reliability,
            "reliability reset by operator"
        );
        Ok(state.reliability)
    }

    /// Classify a gas price with the network's static threshold table.
    pub fn speed_class_for(&self, key: &str, gwei: f64) -> Result<SpeedClass, MonitorError> {
        self.descriptors
            .get(key)
            .map(|d| d.speed_table.classify(gwei))
            .ok_or_else(|| MonitorError::UnknownNetwork(key.to_string()))
    }

    pub fn state(&self, key: &str) -> Option<NetworkState> {
        self.states.get(key).map(|s| s.value().clone())
    }

    pub fn descriptor(&self, key: &str) -> Option<&NetworkDescriptor> {
        self.descriptors.get(key)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &NetworkDescriptor> {
        self.descriptors.values()
    }

    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            networks: self.snapshot().into_values().collect(),
            last_update: *self.last_round.read(),
            monitoring: self.is_running(),
        }
    }
}

impl NetworkStateSource for NetworkMonitor {
    fn snapshot(&self) -> NetworkSnapshot {
        self.states
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }
}

/// USD cost of one standard transfer at `gas_price_wei`.
pub fn transfer_cost_usd(gas_price_wei: &BigUint, native_usd: f64) -> f64 {
    let gas_cost_wei = gas_price_wei * BigUint::from(STANDARD_TRANSFER_GAS);
    let gas_cost_native = gas_cost_wei.to_f64().unwrap_or(f64::INFINITY) / WEI_PER_NATIVE;
    gas_cost_native * native_usd
}
