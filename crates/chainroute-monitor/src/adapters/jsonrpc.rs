//! `eth_gasPrice` over HTTP JSON-RPC.

use std::time::Duration;

use async_trait::async_trait;
use chainroute_core::NetworkDescriptor;
use num_bigint::BigUint;
use reqwest::Client;
use serde_json::json;

use crate::error::MonitorError;
use crate::traits::FeeDataClient;

/// Fee client speaking the Ethereum JSON-RPC dialect to each network's
/// configured `rpc_endpoint`.
#[derive(Debug, Clone)]
pub struct JsonRpcFeeClient {
    http: Client,
}

impl JsonRpcFeeClient {
    /// Build a client whose HTTP requests give up after `request_timeout`.
    ///
    /// The monitor applies its own per-poll timeout on top of this one.
    pub fn new(request_timeout: Duration) -> Result<Self, MonitorError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| MonitorError::Transport(format!("http client build: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl FeeDataClient for JsonRpcFeeClient {
    async fn gas_price(&self, network: &NetworkDescriptor) -> Result<BigUint, MonitorError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_gasPrice",
            "params": []
        });
        let resp = self
            .http
            .post(&network.rpc_endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MonitorError::Transport(format!("{}: {e}", network.key)))?;
        if !resp.status().is_success() {
            return Err(MonitorError::Rpc {
                network: network.key.clone(),
                message: format!("http {}", resp.status()),
            });
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| MonitorError::MalformedResponse(format!("json parse: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(MonitorError::Rpc {
                network: network.key.clone(),
                message: err.to_string(),
            });
        }
        let quantity = body
            .get("result")
            .and_then(|v| v.as_str())
            .ok_or_else(|| MonitorError::MalformedResponse("missing string result".into()))?;
        parse_hex_quantity(quantity)
    }

    fn client_id(&self) -> &str {
        "fee-jsonrpc"
    }
}

/// Parse a JSON-RPC hex quantity such as `"0x4a817c800"`.
pub fn parse_hex_quantity(quantity: &str) -> Result<BigUint, MonitorError> {
    let digits = quantity
        .strip_prefix("0x")
        .or_else(|| quantity.strip_prefix("0X"))
        .ok_or_else(|| MonitorError::MalformedResponse(format!("missing 0x prefix: {quantity}")))?;
    if digits.is_empty() {
        return Err(MonitorError::MalformedResponse("empty hex quantity".into()));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| MonitorError::MalformedResponse(format!("invalid hex quantity: {quantity}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantity() {
        let wei = parse_hex_quantity("0x4a817c800").unwrap();
        assert_eq!(wei, BigUint::from(20_000_000_000u64));
        assert_eq!(parse_hex_quantity("0x0").unwrap(), BigUint::from(0u32));
    }

    #[test]
    fn test_parse_hex_quantity_beyond_u128() {
        let wei = parse_hex_quantity("0x100000000000000000000000000000000").unwrap();
        assert_eq!(wei.to_str_radix(10), "340282366920938463463374607431768211456");
    }

    #[test]
    fn test_parse_hex_quantity_rejects_garbage() {
        assert!(parse_hex_quantity("1234").is_err());
        assert!(parse_hex_quantity("0x").is_err());
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = JsonRpcFeeClient::new(Duration::from_millis(200)).unwrap();
        let mut network = chainroute_core::default_networks().remove(0);
        network.rpc_endpoint = "http://127.0.0.1:1".into();

        let err = client.gas_price(&network).await.unwrap_err();
        assert!(matches!(err, MonitorError::Transport(_)));
        assert!(err.is_poll_failure());
    }
}
