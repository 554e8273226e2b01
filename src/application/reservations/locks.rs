//! Per-event mutual exclusion
//!
//! Admission counts active reservations and then inserts one; two requests
//! for the same event must not interleave between those steps. Requests for
//! different events never contend.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct EventLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `event_id`.
    pub async fn acquire(&self, event_id: &str) -> EventLockGuard {
        let mutex = self
            .inner
            .entry(event_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = mutex.lock_owned().await;
        EventLockGuard {
            guard: Some(guard),
            event_id: event_id.to_string(),
            locks: self.inner.clone(),
        }
    }

    /// Number of events with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Releases the event lock on drop and prunes the entry once nobody else
/// holds or waits on it.
pub struct EventLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    event_id: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Drop for EventLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map itself still references the mutex.
        self.locks
            .remove_if(&self.event_id, |_, m| Arc::strong_count(m) == 1);
    }
}
