use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{NetworkDescriptor, SpeedClass, SpeedTable, SpeedTier};

/// Network catalog shared by the monitor and the routing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Key of the network used when no network is fresh.
    #[serde(default = "default_fallback_network")]
    pub fallback_network: String,
    /// Every network the monitor polls and the engine may route to.
    #[serde(default = "default_networks")]
    pub networks: Vec<NetworkDescriptor>,
}

fn default_fallback_network() -> String {
    "polygon".into()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            fallback_network: default_fallback_network(),
            networks: default_networks(),
        }
    }
}

impl CoreConfig {
    /// Startup validation. A catalog that passes can always produce a
    /// fallback decision, so routing never fails for lack of one.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.networks.is_empty() {
            return Err(CoreError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for descriptor in &self.networks {
            descriptor.validate()?;
            if !seen.insert(descriptor.key.as_str()) {
                return Err(CoreError::DuplicateNetwork(descriptor.key.clone()));
            }
        }
        if !seen.contains(self.fallback_network.as_str()) {
            return Err(CoreError::MissingFallbackNetwork(
                self.fallback_network.clone(),
            ));
        }
        Ok(())
    }

    pub fn descriptor(&self, key: &str) -> Option<&NetworkDescriptor> {
        self.networks.iter().find(|d| d.key == key)
    }
}

fn rollup(key: &str, name: &str, chain_id: u64, rpc: &str, explorer: &str) -> NetworkDescriptor {
    NetworkDescriptor {
        key: key.into(),
        display_name: name.into(),
        chain_id,
        native_currency: "ETH".into(),
        rpc_endpoint: rpc.into(),
        explorer_url: explorer.into(),
        speed_table: SpeedTable::single(1.0, SpeedClass::VeryFast, SpeedClass::Fast),
        initial_reliability: 1.0,
    }
}

/// The built-in network catalog.
pub fn default_networks() -> Vec<NetworkDescriptor> {
    vec![
        NetworkDescriptor {
            key: "ethereum".into(),
            display_name: "Ethereum".into(),
            chain_id: 1,
            native_currency: "ETH".into(),
            rpc_endpoint: "https://eth.llamarpc.com".into(),
            explorer_url: "https://etherscan.io".into(),
            speed_table: SpeedTable::new(
                vec![
                    SpeedTier {
                        below_gwei: 20.0,
                        class: SpeedClass::Fast,
                    },
                    SpeedTier {
                        below_gwei: 50.0,
                        class: SpeedClass::Medium,
                    },
                ],
                SpeedClass::Slow,
            ),
            initial_reliability: 1.0,
        },
        NetworkDescriptor {
            key: "polygon".into(),
            display_name: "Polygon".into(),
            chain_id: 137,
            native_currency: "MATIC".into(),
            rpc_endpoint: "https://polygon-rpc.com".into(),
            explorer_url: "https://polygonscan.com".into(),
            speed_table: SpeedTable::single(50.0, SpeedClass::VeryFast, SpeedClass::Fast),
            initial_reliability: 1.0,
        },
        rollup(
            "arbitrum",
            "Arbitrum One",
            42161,
            "https://arb1.arbitrum.io/rpc",
            "https://arbiscan.io",
        ),
        rollup(
            "optimism",
            "OP Mainnet",
            10,
            "https://mainnet.optimism.io",
            "https://optimistic.etherscan.io",
        ),
        rollup(
            "base",
            "Base",
            8453,
            "https://mainnet.base.org",
            "https://basescan.org",
        ),
        NetworkDescriptor {
            key: "bsc".into(),
            display_name: "BNB Smart Chain".into(),
            chain_id: 56,
            native_currency: "BNB".into(),
            rpc_endpoint: "https://bsc-dataseed.binance.org".into(),
            explorer_url: "https://bscscan.com".into(),
            speed_table: SpeedTable::single(5.0, SpeedClass::VeryFast, SpeedClass::Fast),
            initial_reliability: 1.0,
        },
    ]
}
