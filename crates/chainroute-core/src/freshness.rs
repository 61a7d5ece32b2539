//! The freshness rule deciding which networks are eligible for routing.
//!
//! A record is fresh iff it has been successfully polled within
//! [`FRESHNESS_WINDOW`] and its reliability is strictly above
//! [`MIN_FRESH_RELIABILITY`]. Every consumer (routing, simulation, status)
//! goes through [`is_fresh`].

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::source::NetworkSnapshot;
use crate::types::NetworkState;

/// Maximum age of a record that can still be routed to.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(60);

/// Reliability must be strictly greater than this to be routable.
pub const MIN_FRESH_RELIABILITY: f64 = 0.8;

pub fn is_fresh(state: &NetworkState, now: DateTime<Utc>) -> bool {
    state.reliability > MIN_FRESH_RELIABILITY && is_recent(state, now)
}

/// The time half of the rule: polled successfully within [`FRESHNESS_WINDOW`],
/// whatever the reliability.
///
/// Customer overrides apply their own, lower reliability bar on top of this.
pub fn is_recent(state: &NetworkState, now: DateTime<Utc>) -> bool {
    let Some(updated) = state.last_updated else {
        return false;
    };
    // A timestamp slightly in the future (clock skew) counts as age zero.
    match now.signed_duration_since(updated).to_std() {
        Ok(age) => age < FRESHNESS_WINDOW,
        Err(_) => true,
    }
}

/// The fresh records of a snapshot, in key order.
pub fn fresh_subset(snapshot: &NetworkSnapshot, now: DateTime<Utc>) -> Vec<NetworkState> {
    snapshot
        .values()
        .filter(|state| is_fresh(state, now))
        .cloned()
        .collect()
}
