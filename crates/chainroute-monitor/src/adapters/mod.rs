pub mod fixed;
pub mod jsonrpc;

pub use fixed::{FixedFeeClient, FixedPriceOracle};
pub use jsonrpc::{parse_hex_quantity, JsonRpcFeeClient};
