//! Shared node state for the HTTP handlers.

use std::sync::Arc;
use std::time::Instant;

use chainroute_monitor::NetworkMonitor;
use chainroute_routing::RoutingEngine;

/// Everything a request handler needs, behind one `Arc`.
pub struct AppState {
    pub monitor: Arc<NetworkMonitor>,
    pub engine: Arc<RoutingEngine>,
    /// When the node started.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(monitor: Arc<NetworkMonitor>, engine: Arc<RoutingEngine>) -> Self {
        Self {
            monitor,
            engine,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
