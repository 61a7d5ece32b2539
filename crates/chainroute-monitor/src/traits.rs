use async_trait::async_trait;
use chainroute_core::NetworkDescriptor;
use num_bigint::BigUint;

use crate::error::MonitorError;

/// Fee data interface.
///
/// Each implementation fetches the current gas price of a network from
/// wherever it can (a JSON-RPC node, a fixed table, a gas station API).
#[async_trait]
pub trait FeeDataClient: Send + Sync {
    /// Current gas price in wei.
    async fn gas_price(&self, network: &NetworkDescriptor) -> Result<BigUint, MonitorError>;

    /// Return the unique identifier of this client (e.g. "fee-jsonrpc").
    fn client_id(&self) -> &str;
}

/// Price oracle interface: native token symbol → USD price.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn price_usd(&self, symbol: &str) -> Result<f64, MonitorError>;

    /// Return the unique identifier of this oracle (e.g. "price-fixed").
    fn oracle_id(&self) -> &str;
}
