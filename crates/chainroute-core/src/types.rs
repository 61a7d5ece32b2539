use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Gas units consumed by one standard native-token transfer.
pub const STANDARD_TRANSFER_GAS: u64 = 21_000;

const WEI_PER_GWEI: f64 = 1e9;

/// Serde helper to serialize/deserialize a `BigUint` as a decimal string.
mod wei_decimal {
    use num_bigint::BigUint;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid wei amount: {s}")))
    }
}

/// Coarse, threshold-based rating of a network's expected confirmation latency.
///
/// Variants are declared slowest-first so the derived ordering ranks
/// `VeryFast` highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpeedClass {
    Slow,
    Medium,
    Fast,
    VeryFast,
}

impl SpeedClass {
    /// Fixed score lookup used by the routing formula.
    pub fn score(&self) -> f64 {
        match self {
            Self::VeryFast => 100.0,
            Self::Fast => 80.0,
            Self::Medium => 60.0,
            Self::Slow => 40.0,
        }
    }

    /// Human-readable confirmation time estimate.
    pub fn confirmation_time(&self) -> &'static str {
        match self {
            Self::VeryFast => "< 30 seconds",
            Self::Fast => "1-2 minutes",
            Self::Medium => "2-5 minutes",
            Self::Slow => "5-15 minutes",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryFast => "very-fast",
            Self::Fast => "fast",
            Self::Medium => "medium",
            Self::Slow => "slow",
        }
    }
}

impl fmt::Display for SpeedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a [`SpeedTable`]: prices strictly below `below_gwei` get `class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTier {
    pub below_gwei: f64,
    pub class: SpeedClass,
}

/// Per-network gas price → speed class thresholds.
///
/// Tiers are checked in ascending `below_gwei` order; a price that clears
/// every tier falls into `otherwise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedTable {
    pub otherwise: SpeedClass,
    pub tiers: Vec<SpeedTier>,
}

impl SpeedTable {
    pub fn new(mut tiers: Vec<SpeedTier>, otherwise: SpeedClass) -> Self {
        tiers.sort_by(|a, b| a.below_gwei.total_cmp(&b.below_gwei));
        Self { tiers, otherwise }
    }

    /// Two-band table: `below` gwei → `fast_class`, everything else → `otherwise`.
    pub fn single(below: f64, fast_class: SpeedClass, otherwise: SpeedClass) -> Self {
        Self::new(
            vec![SpeedTier {
                below_gwei: below,
                class: fast_class,
            }],
            otherwise,
        )
    }

    pub fn classify(&self, gwei: f64) -> SpeedClass {
        self.tiers
            .iter()
            .find(|tier| gwei < tier.below_gwei)
            .map(|tier| tier.class)
            .unwrap_or(self.otherwise)
    }
}

fn default_initial_reliability() -> f64 {
    1.0
}

/// Static description of a routable network. Created at startup, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Unique short id, e.g. `"polygon"`.
    pub key: String,
    pub display_name: String,
    pub chain_id: u64,
    /// Symbol of the token gas is paid in, e.g. `"ETH"`.
    pub native_currency: String,
    pub rpc_endpoint: String,
    pub explorer_url: String,
    /// Reliability a network starts with before its first poll.
    #[serde(default = "default_initial_reliability")]
    pub initial_reliability: f64,
    pub speed_table: SpeedTable,
}

impl NetworkDescriptor {
    pub fn validate(&self) -> Result<(), CoreError> {
        let invalid = |reason: &str| CoreError::InvalidDescriptor {
            key: self.key.clone(),
            reason: reason.to_string(),
        };
        if self.key.trim().is_empty() {
            return Err(invalid("key is empty"));
        }
        if self.native_currency.trim().is_empty() {
            return Err(invalid("native_currency is empty"));
        }
        if self.rpc_endpoint.trim().is_empty() {
            return Err(invalid("rpc_endpoint is empty"));
        }
        if !(0.0..=1.0).contains(&self.initial_reliability) {
            return Err(invalid("initial_reliability out of range [0, 1]"));
        }
        if self.speed_table.tiers.iter().any(|t| !t.below_gwei.is_finite()) {
            return Err(invalid("speed table threshold is not finite"));
        }
        Ok(())
    }
}

/// Live fee conditions of one network.
///
/// Records are replaced wholesale by the monitor on every successful poll;
/// only `reliability` is ever modified in place (on poll failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub key: String,
    #[serde(with = "wei_decimal")]
    pub gas_price_wei: BigUint,
    pub gas_price_gwei: f64,
    /// USD cost of one standard transfer ([`STANDARD_TRANSFER_GAS`] units).
    pub estimated_cost_usd: f64,
    pub speed_class: SpeedClass,
    pub reliability: f64,
    /// `None` until the first successful poll.
    pub last_updated: Option<DateTime<Utc>>,
}

impl NetworkState {
    /// The never-polled state for a descriptor.
    pub fn initial(descriptor: &NetworkDescriptor) -> Self {
        Self {
            key: descriptor.key.clone(),
            gas_price_wei: BigUint::zero(),
            gas_price_gwei: 0.0,
            estimated_cost_usd: 0.0,
            speed_class: descriptor.speed_table.classify(0.0),
            reliability: descriptor.initial_reliability,
            last_updated: None,
        }
    }
}

/// Convert a wei amount to gwei as a float.
pub fn wei_to_gwei(wei: &BigUint) -> f64 {
    wei.to_f64().unwrap_or(f64::INFINITY) / WEI_PER_GWEI
}

/// Currencies a payment may be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentCurrency {
    Usdc,
    Usdt,
    Dai,
    Eth,
    Matic,
    Bnb,
}

impl PaymentCurrency {
    pub const ALL: [PaymentCurrency; 6] = [
        Self::Usdc,
        Self::Usdt,
        Self::Dai,
        Self::Eth,
        Self::Matic,
        Self::Bnb,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usdc => "USDC",
            Self::Usdt => "USDT",
            Self::Dai => "DAI",
            Self::Eth => "ETH",
            Self::Matic => "MATIC",
            Self::Bnb => "BNB",
        }
    }

    pub fn is_stablecoin(&self) -> bool {
        matches!(self, Self::Usdc | Self::Usdt | Self::Dai)
    }
}

impl FromStr for PaymentCurrency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == upper)
            .ok_or_else(|| CoreError::UnsupportedCurrency(s.to_string()))
    }
}

impl fmt::Display for PaymentCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// How quickly the payer needs confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

impl FromStr for Urgency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "normal" => Ok(Self::Normal),
            "high" => Ok(Self::High),
            _ => Err(CoreError::UnknownUrgency(s.to_string())),
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
