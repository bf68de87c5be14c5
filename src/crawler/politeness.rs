//! Per-host request spacing
//!
//! The registry owns one `HostState` per host key. `authorize` reserves the
//! next fetch slot for a host under the registry lock and tells the caller how
//! long to sleep before using it, so two workers racing for the same host are
//! always handed different slots.

use crate::state::HostState;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct PolitenessRegistry {
    hosts: Mutex<HashMap<String, HostState>>,
}

impl PolitenessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fetch slot for `host` and returns the wait before it starts
    ///
    /// # Arguments
    ///
    /// * `host` - Host key (host plus non-default port)
    /// * `min_delay` - Minimum spacing between fetch starts for this host
    ///
    /// # Returns
    ///
    /// `Duration::ZERO` if the caller may fetch immediately.
    pub fn authorize(&self, host: &str, min_delay: Duration) -> Duration {
        let mut hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        hosts
            .entry(host.to_string())
            .or_insert_with(|| HostState::new(host))
            .reserve(min_delay, now)
    }

    /// Returns a copy of the state for `host`, if it has been seen
    pub fn host_state(&self, host: &str) -> Option<HostState> {
        let hosts = self.hosts.lock().unwrap_or_else(|e| e.into_inner());
        hosts.get(host).cloned()
    }

    /// Number of distinct hosts seen so far
    pub fn host_count(&self) -> usize {
        self.hosts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
