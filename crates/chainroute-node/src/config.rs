//! Node configuration loading and management.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use chainroute_core::CoreConfig;
use chainroute_monitor::MonitorConfig;
use chainroute_routing::{EngineSettings, ScoringWeights, DEFAULT_LOG_CAPACITY};

/// Full configuration for the Chainroute node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainrouteConfig {
    /// Polling settings.
    #[serde(default)]
    pub monitor: MonitorSection,

    /// Scoring and decision log settings.
    #[serde(default)]
    pub routing: RoutingSection,

    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Native token USD prices, keyed by symbol.
    #[serde(default = "default_prices")]
    pub prices: BTreeMap<String, f64>,

    /// Gas prices in gwei used when `monitor.fee_source = "fixed"`.
    #[serde(default = "default_fixed_gas_prices")]
    pub fixed_gas_prices: BTreeMap<String, f64>,

    /// Network catalog and fallback network.
    #[serde(default)]
    pub catalog: CoreConfig,
}

/// Where the monitor gets gas prices from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSource {
    /// `eth_gasPrice` against each network's `rpc_endpoint`.
    #[default]
    Rpc,
    /// The `[fixed_gas_prices]` table.
    Fixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSection {
    #[serde(default)]
    pub fee_source: FeeSource,
    /// Delay between polling rounds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Upper bound on one network poll.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    /// HTTP timeout of a single JSON-RPC request.
    #[serde(default = "default_rpc_request_timeout_ms")]
    pub rpc_request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingSection {
    /// Number of decisions kept for analytics.
    #[serde(default = "default_log_capacity")]
    pub decision_log_capacity: usize,
    /// Networks the analytics rules treat as expensive.
    #[serde(default = "default_expensive_networks")]
    pub expensive_networks: Vec<String>,
    #[serde(default)]
    pub weights: ScoringWeights,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_update_interval_ms() -> u64 {
    30_000
}
fn default_poll_timeout_ms() -> u64 {
    8_000
}
fn default_rpc_request_timeout_ms() -> u64 {
    5_000
}
fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}
fn default_expensive_networks() -> Vec<String> {
    EngineSettings::default().expensive_networks
}
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    9300
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_prices() -> BTreeMap<String, f64> {
    [("ETH", 3000.0), ("MATIC", 0.7), ("BNB", 600.0)]
        .into_iter()
        .map(|(symbol, usd)| (symbol.to_string(), usd))
        .collect()
}
fn default_fixed_gas_prices() -> BTreeMap<String, f64> {
    [
        ("ethereum", 25.0),
        ("polygon", 40.0),
        ("arbitrum", 0.1),
        ("optimism", 0.05),
        ("base", 0.05),
        ("bsc", 3.0),
    ]
    .into_iter()
    .map(|(network, gwei)| (network.to_string(), gwei))
    .collect()
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self {
            fee_source: FeeSource::default(),
            update_interval_ms: default_update_interval_ms(),
            poll_timeout_ms: default_poll_timeout_ms(),
            rpc_request_timeout_ms: default_rpc_request_timeout_ms(),
        }
    }
}

impl Default for RoutingSection {
    fn default() -> Self {
        Self {
            decision_log_capacity: default_log_capacity(),
            expensive_networks: default_expensive_networks(),
            weights: ScoringWeights::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl MonitorSection {
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            update_interval: Duration::from_millis(self.update_interval_ms),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
        }
    }

    pub fn rpc_request_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_request_timeout_ms)
    }
}

impl RoutingSection {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            weights: self.weights.clone(),
            expensive_networks: self.expensive_networks.clone(),
        }
    }
}

impl ChainrouteConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let config: ChainrouteConfig = toml::from_str(&contents)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Startup validation. A node that passes can always route, if only to
    /// the fallback network.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.catalog.validate()?;
        self.routing.weights.validate()?;

        if self.monitor.update_interval_ms == 0 {
            bail!("monitor.update_interval_ms must be greater than zero");
        }
        if self.monitor.poll_timeout_ms == 0 {
            bail!("monitor.poll_timeout_ms must be greater than zero");
        }
        if self.routing.decision_log_capacity == 0 {
            bail!("routing.decision_log_capacity must be greater than zero");
        }

        for network in &self.catalog.networks {
            let symbol = network.native_currency.to_ascii_uppercase();
            let priced = self
                .prices
                .iter()
                .any(|(s, usd)| s.eq_ignore_ascii_case(&symbol) && usd.is_finite() && *usd >= 0.0);
            if !priced {
                bail!(
                    "network '{}' pays gas in {} but [prices] has no valid {} entry",
                    network.key,
                    symbol,
                    symbol
                );
            }
            if self.monitor.fee_source == FeeSource::Fixed
                && !self.fixed_gas_prices.contains_key(&network.key)
            {
                bail!(
                    "fee_source is fixed but [fixed_gas_prices] has no entry for '{}'",
                    network.key
                );
            }
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => bail!("logging.format must be 'text' or 'json', got '{other}'"),
        }

        self.api_addr()?;
        Ok(())
    }

    /// The HTTP API socket address.
    pub fn api_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.api.listen_addr, self.api.port)
            .parse()
            .with_context(|| format!("invalid api address {}:{}", self.api.listen_addr, self.api.port))
    }
}
