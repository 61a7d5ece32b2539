//! The Chainroute node orchestrator.
//!
//! Wires the network monitor, preference store, decision log and routing
//! engine together, runs the monitor in the background and serves the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;

use chainroute_monitor::{
    FeeDataClient, FixedFeeClient, FixedPriceOracle, JsonRpcFeeClient, NetworkMonitor,
};
use chainroute_routing::{DecisionLog, InMemoryPreferenceStore, RoutingEngine};

use crate::config::{ChainrouteConfig, FeeSource};
use crate::state::AppState;

/// How long shutdown waits for an in-flight polling round.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// The Chainroute node.
pub struct ChainrouteNode {
    config: ChainrouteConfig,
    monitor: Arc<NetworkMonitor>,
    engine: Arc<RoutingEngine>,
    /// The HTTP API server task.
    api_task: Option<JoinHandle<Result<()>>>,
}

impl ChainrouteNode {
    /// Validate the configuration and build every component. Nothing runs
    /// until [`start`](Self::start).
    pub fn new(config: ChainrouteConfig) -> Result<Self> {
        config.validate()?;

        let fee_client = build_fee_client(&config)?;
        let price_oracle = Arc::new(FixedPriceOracle::with_prices(
            config.prices.iter().map(|(symbol, usd)| (symbol.as_str(), *usd)),
        ));

        let monitor = Arc::new(NetworkMonitor::new(
            config.catalog.networks.clone(),
            fee_client,
            price_oracle,
            config.monitor.monitor_config(),
        )?);

        let engine = Arc::new(RoutingEngine::new(
            &config.catalog,
            monitor.clone(),
            Arc::new(InMemoryPreferenceStore::new()),
            Arc::new(DecisionLog::new(config.routing.decision_log_capacity)),
            config.routing.engine_settings(),
        )?);

        tracing::info!(
            networks = config.catalog.networks.len(),
            fallback = %config.catalog.fallback_network,
            fee_source = ?config.monitor.fee_source,
            "Chainroute node created"
        );

        Ok(Self {
            config,
            monitor,
            engine,
            api_task: None,
        })
    }

    /// Start background polling and the HTTP API.
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!("starting Chainroute node");

        self.monitor.start();

        let state = Arc::new(AppState::new(self.monitor.clone(), self.engine.clone()));
        let api_addr = self.config.api_addr()?;
        self.api_task = Some(tokio::spawn(async move {
            crate::api::start_api_server(api_addr, state).await
        }));
        Ok(())
    }

    /// Wait for the HTTP API server to exit.
    pub async fn run(&mut self) -> Result<()> {
        let task = self
            .api_task
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;
        let result = task.await;
        self.api_task = None;
        match result {
            Ok(served) => served,
            Err(e) => Err(anyhow::anyhow!("HTTP API task failed: {e}")),
        }
    }

    /// Stop polling (waiting briefly for an in-flight round) and the API.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down Chainroute node");
        if !self.monitor.shutdown(SHUTDOWN_GRACE).await {
            tracing::warn!("polling round still in flight at shutdown");
        }
        if let Some(task) = self.api_task.take() {
            task.abort();
        }
        Ok(())
    }

    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    pub fn engine(&self) -> &Arc<RoutingEngine> {
        &self.engine
    }
}

fn build_fee_client(config: &ChainrouteConfig) -> Result<Arc<dyn FeeDataClient>> {
    match config.monitor.fee_source {
        FeeSource::Rpc => Ok(Arc::new(JsonRpcFeeClient::new(
            config.monitor.rpc_request_timeout(),
        )?)),
        FeeSource::Fixed => {
            let client = FixedFeeClient::new();
            for (network, gwei) in &config.fixed_gas_prices {
                client.set_gas_price_gwei(network, *gwei);
            }
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainroute_core::PaymentCurrency;
    use chainroute_routing::RouteRequest;

    fn fixed_config() -> ChainrouteConfig {
        let mut config = ChainrouteConfig::default();
        config.monitor.fee_source = FeeSource::Fixed;
        // Port 0 lets the OS pick a free port.
        config.api.port = 0;
        config
    }

    #[test]
    fn test_node_creation() {
        assert!(ChainrouteNode::new(ChainrouteConfig::default()).is_ok());
    }

    #[test]
    fn test_node_rejects_invalid_config() {
        let mut config = ChainrouteConfig::default();
        config.catalog.fallback_network = "nowhere".into();
        assert!(ChainrouteNode::new(config).is_err());
    }

    #[tokio::test]
    async fn test_routes_to_fallback_before_first_poll() {
        let node = ChainrouteNode::new(fixed_config()).unwrap();
        let decision = node
            .engine()
            .route(RouteRequest::new(25.0, PaymentCurrency::Usdc))
            .unwrap();
        assert!(decision.fallback);
        assert_eq!(decision.selected_network, "polygon");
    }

    #[tokio::test]
    async fn test_fixed_source_polls_every_network() {
        let node = ChainrouteNode::new(fixed_config()).unwrap();
        let summary = node.monitor().poll_all().await;
        assert_eq!(summary.succeeded.len(), 6);
        assert!(summary.failed.is_empty());

        let decision = node
            .engine()
            .route(RouteRequest::new(25.0, PaymentCurrency::Usdc))
            .unwrap();
        assert!(!decision.fallback);
        assert_ne!(decision.selected_network, "ethereum");
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut node = ChainrouteNode::new(fixed_config()).unwrap();
        node.start().await.unwrap();
        assert!(node.monitor().is_running());
        node.shutdown().await.unwrap();
        assert!(!node.monitor().is_running());
    }
}
