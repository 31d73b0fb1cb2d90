//! Time-boxed cache with single-flight refresh
//!
//! Each key holds at most one value and at most one in-flight producer. While
//! a refresh is running, other callers get the previous value if it expired
//! less than `grace` ago; otherwise they block until the producer finishes.
//! Failed productions are never stored.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::debug;

struct Slot<V> {
    value: Option<(V, Instant)>,
    refreshing: bool,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: None,
            refreshing: false,
        }
    }
}

/// Keyed cache with expiry, single-flight and a stale-while-refresh window
pub struct TtlCache<V: Clone> {
    name: &'static str,
    /// `None` means values never expire
    ttl: Option<Duration>,
    grace: Duration,
    slots: Mutex<HashMap<String, Slot<V>>>,
    refreshed: Condvar,
}

enum Lookup<V> {
    Hit(V),
    Produce,
    Wait,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache
    ///
    /// # Arguments
    /// * `name` - Label used in log lines
    /// * `ttl` - How long a value is served as fresh
    /// * `grace` - How long past expiry a value may still be served while a
    ///   refresh is in flight
    pub fn new(name: &'static str, ttl: Duration, grace: Duration) -> Self {
        Self {
            name,
            ttl: Some(ttl),
            grace,
            slots: Mutex::new(HashMap::new()),
            refreshed: Condvar::new(),
        }
    }

    /// Create a cache whose values never expire
    pub fn unbounded(name: &'static str) -> Self {
        Self {
            name,
            ttl: None,
            grace: Duration::ZERO,
            slots: Mutex::new(HashMap::new()),
            refreshed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        // A poisoned map only means a producer panicked; slots stay consistent
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_fresh(&self, stored_at: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(stored_at) < ttl,
            None => true,
        }
    }

    fn within_grace(&self, stored_at: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.duration_since(stored_at) < ttl + self.grace,
            None => true,
        }
    }

    /// Fresh value for `key`, if any
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.lock()
            .get(key)
            .and_then(|slot| slot.value.as_ref())
            .filter(|(_, at)| self.is_fresh(*at, now))
            .map(|(v, _)| v.clone())
    }

    /// Store `value` for `key`, replacing whatever was there
    pub fn insert(&self, key: &str, value: V) {
        let mut slots = self.lock();
        slots.entry(key.to_string()).or_default().value = Some((value, Instant::now()));
    }

    /// Cached value for `key`, producing it if missing or expired
    ///
    /// Only one caller per key runs `produce` at a time. An `Err` from the
    /// producer is returned to its caller and leaves the cache untouched.
    pub fn get_or_try_insert_with<E, F>(&self, key: &str, produce: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut slots = self.lock();

        loop {
            let now = Instant::now();
            let slot = slots.entry(key.to_string()).or_default();

            let lookup = match &slot.value {
                Some((value, at)) if self.is_fresh(*at, now) => Lookup::Hit(value.clone()),
                Some((value, at)) if slot.refreshing && self.within_grace(*at, now) => {
                    Lookup::Hit(value.clone())
                }
                _ if slot.refreshing => Lookup::Wait,
                _ => Lookup::Produce,
            };

            match lookup {
                Lookup::Hit(value) => return Ok(value),
                Lookup::Wait => {
                    debug!("{} cache: waiting for in-flight refresh of {}", self.name, key);
                    slots = self
                        .refreshed
                        .wait(slots)
                        .unwrap_or_else(|e| e.into_inner());
                }
                Lookup::Produce => {
                    slot.refreshing = true;
                    break;
                }
            }
        }

        drop(slots);
        debug!("{} cache: refreshing {}", self.name, key);

        let guard = RefreshGuard { cache: self, key };
        let result = produce();

        if let Ok(value) = &result {
            let mut slots = self.lock();
            slots.entry(key.to_string()).or_default().value = Some((value.clone(), Instant::now()));
        }
        drop(guard);

        result
    }
}

/// Clears the in-flight flag and wakes waiters, also when the producer panics
struct RefreshGuard<'a, V: Clone> {
    cache: &'a TtlCache<V>,
    key: &'a str,
}

impl<V: Clone> Drop for RefreshGuard<'_, V> {
    fn drop(&mut self) {
        let mut slots = self.cache.lock();
        if let Some(slot) = slots.get_mut(self.key) {
            slot.refreshing = false;
        }
        drop(slots);
        self.cache.refreshed.notify_all();
    }
}
