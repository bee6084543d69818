//! Time-bounded memoization with an injectable clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::types::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if let Ok(by) = chrono::Duration::from_std(by) {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A single cached value that expires `ttl` after it was stored.
///
/// Not internally synchronized; wrap it in a mutex when shared.
pub struct TtlCache<V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: Option<(V, Timestamp)>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached value if it is still fresh.
    pub fn get(&self) -> Option<V> {
        let (value, stored_at) = self.entry.as_ref()?;
        let age = self.clock.now().signed_duration_since(*stored_at);
        // A clock that moved backwards counts as fresh.
        let expired = age.to_std().is_ok_and(|age| age >= self.ttl);
        (!expired).then(|| value.clone())
    }

    /// The cached value regardless of age, with the time it was stored.
    /// Used to serve stale data when a refresh fails.
    pub fn get_stale(&self) -> Option<(V, Timestamp)> {
        self.entry.clone()
    }

    pub fn put(&mut self, value: V) {
        self.entry = Some((value, self.clock.now()));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
