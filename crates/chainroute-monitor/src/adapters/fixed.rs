use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chainroute_core::NetworkDescriptor;
use dashmap::DashMap;
use num_bigint::BigUint;

use crate::error::MonitorError;
use crate::traits::{FeeDataClient, PriceOracle};

/// What a [`FixedFeeClient`] answers for one network.
#[derive(Debug, Clone)]
enum FixedFee {
    Price(BigUint),
    Fail(String),
    /// Never answers; exercises the monitor's poll timeout.
    Hang,
}

/// In-memory fee client with operator-set gas prices.
///
/// Used for offline / dry-run nodes and for tests. Answers can be changed
/// at any time, including to failures and hangs.
pub struct FixedFeeClient {
    fees: DashMap<String, FixedFee>,
    calls: AtomicU64,
}

impl FixedFeeClient {
    pub fn new() -> Self {
        Self {
            fees: DashMap::new(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn set_gas_price_wei(&self, network: &str, wei: impl Into<BigUint>) {
        self.fees
            .insert(network.to_string(), FixedFee::Price(wei.into()));
    }

    /// Set a price in gwei; fractional gwei are rounded to the nearest wei.
    pub fn set_gas_price_gwei(&self, network: &str, gwei: f64) {
        let wei = (gwei.max(0.0) * 1e9).round() as u128;
        self.set_gas_price_wei(network, wei);
    }

    pub fn fail(&self, network: &str, reason: &str) {
        self.fees
            .insert(network.to_string(), FixedFee::Fail(reason.to_string()));
    }

    pub fn hang(&self, network: &str) {
        self.fees.insert(network.to_string(), FixedFee::Hang);
    }

    /// Total number of gas price requests served (including failures).
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FixedFeeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeeDataClient for FixedFeeClient {
    async fn gas_price(&self, network: &NetworkDescriptor) -> Result<BigUint, MonitorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Clone out so no map guard is held across an await point.
        let fee = self.fees.get(&network.key).map(|f| f.value().clone());
        match fee {
            Some(FixedFee::Price(wei)) => Ok(wei),
            Some(FixedFee::Fail(reason)) => Err(MonitorError::Transport(reason)),
            Some(FixedFee::Hang) => std::future::pending().await,
            None => Err(MonitorError::Transport(format!(
                "no fixed gas price configured for {}",
                network.key
            ))),
        }
    }

    fn client_id(&self) -> &str {
        "fee-fixed"
    }
}

/// Price oracle backed by a static symbol → USD table.
pub struct FixedPriceOracle {
    prices: DashMap<String, f64>,
}

impl FixedPriceOracle {
    pub fn new() -> Self {
        Self {
            prices: DashMap::new(),
        }
    }

    pub fn with_prices<'a>(prices: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let oracle = Self::new();
        for (symbol, price) in prices {
            oracle.set_price(symbol, price);
        }
        oracle
    }

    pub fn set_price(&self, symbol: &str, usd: f64) {
        self.prices.insert(symbol.to_ascii_uppercase(), usd);
    }

    pub fn remove_price(&self, symbol: &str) {
        self.prices.remove(&symbol.to_ascii_uppercase());
    }
}

impl Default for FixedPriceOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceOracle for FixedPriceOracle {
    async fn price_usd(&self, symbol: &str) -> Result<f64, MonitorError> {
        match self.prices.get(&symbol.to_ascii_uppercase()).map(|p| *p) {
            Some(price) if price.is_finite() && price >= 0.0 => Ok(price),
            _ => Err(MonitorError::PriceUnavailable(symbol.to_string())),
        }
    }

    fn oracle_id(&self) -> &str {
        "price-fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn polygon() -> NetworkDescriptor {
        chainroute_core::default_networks()
            .into_iter()
            .find(|d| d.key == "polygon")
            .unwrap()
    }

    #[tokio::test]
    async fn test_fixed_fee_price_and_failure() {
        let client = FixedFeeClient::new();
        let network = polygon();

        assert!(client.gas_price(&network).await.is_err());

        client.set_gas_price_gwei("polygon", 30.5);
        let wei = client.gas_price(&network).await.unwrap();
        assert_eq!(wei, BigUint::from(30_500_000_000u64));

        client.fail("polygon", "rpc down");
        let err = client.gas_price(&network).await.unwrap_err();
        assert!(matches!(err, MonitorError::Transport(ref m) if m == "rpc down"));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_fixed_oracle_case_insensitive() {
        let oracle = FixedPriceOracle::with_prices([("eth", 3000.0), ("MATIC", 0.7)]);
        assert_eq!(oracle.price_usd("ETH").await.unwrap(), 3000.0);
        assert_eq!(oracle.price_usd("matic").await.unwrap(), 0.7);
        assert!(matches!(
            oracle.price_usd("BNB").await,
            Err(MonitorError::PriceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fixed_oracle_rejects_nonsense_prices() {
        let oracle = FixedPriceOracle::new();
        oracle.set_price("ETH", f64::NAN);
        assert!(oracle.price_usd("ETH").await.is_err());
        oracle.set_price("ETH", -1.0);
        assert!(oracle.price_usd("ETH").await.is_err());
    }
}
