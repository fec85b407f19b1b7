//! Session health tracking
//!
//! Single-writer (the session pipeline), multi-reader (status endpoint
//! requests) state. The lock is held only for the duration of a field
//! read or write, never across I/O.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

/// Point-in-time copy of the session health fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthSnapshot {
    /// True once the pipeline has completed its settle sequence; never reverts.
    pub ready: bool,
    /// Number of observed main-frame navigations.
    pub nav_count: u64,
    /// Last fatal error, serialized; never cleared once set.
    pub last_error: Option<String>,
}

/// Shared handle to the process-wide session health state.
#[derive(Debug, Clone, Default)]
pub struct SessionHealth {
    inner: Arc<RwLock<HealthSnapshot>>,
}

impl SessionHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one main-frame navigation and return the running count.
    pub fn record_navigation(&self) -> u64 {
        let mut state = self.write();
        state.nav_count += 1;
        state.nav_count
    }

    /// Mark the session ready. Called exactly once, at the end of the
    /// settle sequence; readiness never reverts within a process.
    pub fn mark_ready(&self) {
        self.write().ready = true;
        debug!("session marked ready");
    }

    /// Record a fatal pipeline error so a supervisor can scrape it from the
    /// final health snapshot before the process exits.
    pub fn record_fatal(&self, detail: &str) {
        self.write().last_error = Some(detail.to_string());
    }

    /// Consistent copy of all fields, taken under the lock.
    pub fn snapshot(&self) -> HealthSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HealthSnapshot> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
