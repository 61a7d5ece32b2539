//! Chainroute Core — shared data model for the payment routing network.
//!
//! This crate provides:
//! - [`NetworkDescriptor`] and [`SpeedTable`] — static per-network configuration.
//! - [`NetworkState`] — the live fee snapshot of one network.
//! - [`is_fresh`] — the single freshness rule used by routing, simulation and status.
//! - [`NetworkStateSource`] — the read seam between the monitor and the routing engine.
//! - [`CoreConfig`] — the network catalog plus the designated fallback network.

pub mod config;
pub mod error;
pub mod freshness;
pub mod source;
pub mod types;

pub use config::{default_networks, CoreConfig};
pub use error::CoreError;
pub use freshness::{fresh_subset, is_fresh, is_recent, FRESHNESS_WINDOW, MIN_FRESH_RELIABILITY};
pub use source::{NetworkSnapshot, NetworkStateSource};
pub use types::{
    NetworkDescriptor, NetworkState, PaymentCurrency, SpeedClass, SpeedTable, SpeedTier, Urgency,
    STANDARD_TRANSFER_GAS, wei_to_gwei,
};
