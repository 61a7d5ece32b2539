use std::collections::BTreeMap;

use crate::types::NetworkState;

/// Point-in-time copy of every network's state, keyed by network key.
pub type NetworkSnapshot = BTreeMap<String, NetworkState>;

/// Anything that can hand out a consistent per-record snapshot of network state.
///
/// Implemented by the network monitor; the routing engine only ever reads
/// through this trait.
pub trait NetworkStateSource: Send + Sync {
    fn snapshot(&self) -> NetworkSnapshot;
}

impl NetworkStateSource for NetworkSnapshot {
    fn snapshot(&self) -> NetworkSnapshot {
        self.clone()
    }
}
