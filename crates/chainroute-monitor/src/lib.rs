//! Chainroute Monitor — keeps a live, freshness-bounded view of every network.
//!
//! This crate provides:
//! - [`FeeDataClient`] and [`PriceOracle`] — the collaborator seams for gas
//!   prices and native token prices.
//! - [`JsonRpcFeeClient`] — `eth_gasPrice` over HTTP JSON-RPC.
//! - [`FixedFeeClient`] / [`FixedPriceOracle`] — operator-set values for
//!   offline nodes and tests.
//! - [`NetworkMonitor`] — the interval-driven poller with per-poll timeouts
//!   and reliability decay.

pub mod adapters;
pub mod error;
pub mod monitor;
pub mod traits;

pub use adapters::{FixedFeeClient, FixedPriceOracle, JsonRpcFeeClient};
pub use error::MonitorError;
pub use monitor::{
    transfer_cost_usd, MonitorConfig, MonitorStatus, NetworkMonitor, PollSummary,
    RELIABILITY_DECAY, RELIABILITY_FLOOR,
};
pub use traits::{FeeDataClient, PriceOracle};
