// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-variable value cache.
//!
//! Holds the latest [`ExtendedValue`] of one remote variable. Only provider
//! handlers mutate it (`on_connected`, `on_update`, ...); application threads
//! read copies and block on the condition variable until a predicate holds.
//!
//! # Locking
//!
//! Every mutation goes through one private `apply` step:
//!
//! 1. lock, mutate, copy the snapshot, unlock
//! 2. `notify_all` waiters
//! 3. invoke user callbacks with the copy
//!
//! Callbacks never run under the cache lock, so they may call back into the
//! cache (or the owning variable) freely.

use crate::generic::GenericValue;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Alarm severity reported with monitor updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmSeverity {
    NoAlarm,
    Minor,
    Major,
    Invalid,
}

impl AlarmSeverity {
    /// Map a raw protocol severity (0..=3). Unknown codes are `Invalid`.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::NoAlarm,
            1 => Self::Minor,
            2 => Self::Major,
            _ => Self::Invalid,
        }
    }

    pub fn as_raw(&self) -> u16 {
        match self {
            Self::NoAlarm => 0,
            Self::Minor => 1,
            Self::Major => 2,
            Self::Invalid => 3,
        }
    }
}

/// Snapshot of a remote variable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtendedValue {
    pub value: GenericValue,
    pub connected: bool,
    pub timestamp: Option<SystemTime>,
    pub status: Option<u16>,
    pub severity: Option<AlarmSeverity>,
}

/// Per-update metadata carried alongside a monitor value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateMetadata {
    pub timestamp: Option<SystemTime>,
    pub status: Option<u16>,
    pub severity: Option<AlarmSeverity>,
}

/// User callback invoked with a copy of the snapshot after each change.
pub type CacheCallback = Arc<dyn Fn(&ExtendedValue) + Send + Sync>;

/// Handle returned by [`VariableCache::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

#[derive(Debug, Default)]
struct CacheState {
    snapshot: ExtendedValue,
    /// At least one value arrived since creation or the last clear.
    valid: bool,
}

/// Thread-safe cache of one variable's value and connection status.
pub struct VariableCache {
    state: Mutex<CacheState>,
    changed: Condvar,
    callbacks: Mutex<Vec<(CallbackId, CacheCallback)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for VariableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariableCache")
            .field("state", &*self.state.lock())
            .field("callbacks", &self.callbacks.lock().len())
            .finish()
    }
}

impl Default for VariableCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableCache {
    /// Disconnected cache holding `Empty`.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            changed: Condvar::new(),
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn is_connected(&self) -> bool {
        self.state.lock().snapshot.connected
    }

    /// Current value; `Empty` while disconnected.
    pub fn get_value(&self) -> GenericValue {
        let state = self.state.lock();
        if state.snapshot.connected {
            state.snapshot.value.clone()
        } else {
            GenericValue::Empty
        }
    }

    /// Full snapshot copy. The value is retained across disconnects.
    pub fn get_extended_value(&self) -> ExtendedValue {
        self.state.lock().snapshot.clone()
    }

    /// Connected and holding a value delivered by the provider.
    pub fn has_valid_value(&self) -> bool {
        let state = self.state.lock();
        state.snapshot.connected && state.valid
    }

    pub fn wait_for_connected(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state.snapshot.connected)
    }

    pub fn wait_for_valid_value(&self, timeout: Duration) -> bool {
        self.wait_until(timeout, |state| state.snapshot.connected && state.valid)
    }

    /// Block until `predicate` holds or `timeout` elapses. The predicate is
    /// re-checked on every wakeup, spurious or not. A timeout too large to
    /// form a deadline waits without one.
    fn wait_until(&self, timeout: Duration, predicate: impl Fn(&CacheState) -> bool) -> bool {
        let mut state = self.state.lock();
        if predicate(&state) {
            return true;
        }
        let deadline = Instant::now().checked_add(timeout);
        while !predicate(&state) {
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut state, deadline).timed_out() {
                        return predicate(&state);
                    }
                }
                None => self.changed.wait(&mut state),
            }
        }
        true
    }

    // -----------------------------------------------------------------------
    // Provider handlers
    // -----------------------------------------------------------------------

    pub fn on_connected(&self) {
        log::debug!("[cache] connected");
        self.apply(|state| state.snapshot.connected = true);
    }

    /// Mark disconnected. The last value stays valid for the next connection.
    pub fn on_disconnected(&self) {
        log::debug!("[cache] disconnected");
        self.apply(|state| state.snapshot.connected = false);
    }

    /// Apply a monitor update.
    ///
    /// `changed` lists the field paths the update carries. An empty list, the
    /// root path `""`, or a cache without a prior value replaces the whole
    /// value; otherwise only the listed paths are copied from `value`. An
    /// `Empty` value invalidates the cache.
    pub fn on_update(&self, value: GenericValue, changed: &[String], meta: UpdateMetadata) {
        self.apply(move |state| {
            let snapshot = &mut state.snapshot;
            let whole = !state.valid
                || snapshot.value.is_empty()
                || value.is_empty()
                || changed.is_empty()
                || changed.iter().any(String::is_empty);
            let merged = !whole
                && changed.iter().all(|path| {
                    value.get_path(path).is_some() && snapshot.value.get_path(path).is_some()
                });

            if merged {
                for path in changed {
                    if let Some(field) = value.get_path(path) {
                        snapshot.value.set_path(path, field.clone());
                    }
                }
            } else {
                state.valid = !value.is_empty();
                snapshot.value = value;
            }

            if meta.timestamp.is_some() {
                snapshot.timestamp = meta.timestamp;
            }
            if meta.status.is_some() {
                snapshot.status = meta.status;
            }
            if meta.severity.is_some() {
                snapshot.severity = meta.severity;
            }
        });
    }

    /// Drop the cached value; waiters for a valid value block again.
    pub fn on_clear(&self) {
        log::debug!("[cache] cleared");
        self.apply(|state| {
            state.valid = false;
            state.snapshot.value = GenericValue::Empty;
            state.snapshot.timestamp = None;
            state.snapshot.status = None;
            state.snapshot.severity = None;
        });
    }

    fn apply(&self, mutate: impl FnOnce(&mut CacheState)) {
        let snapshot = {
            let mut state = self.state.lock();
            mutate(&mut state);
            state.snapshot.clone()
        };
        self.changed.notify_all();

        let callbacks: Vec<CacheCallback> = self
            .callbacks
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    // -----------------------------------------------------------------------
    // User callbacks
    // -----------------------------------------------------------------------

    pub fn subscribe(
        &self,
        callback: impl Fn(&ExtendedValue) + Send + Sync + 'static,
    ) -> CallbackId {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.callbacks.lock().push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: CallbackId) -> bool {
        let mut callbacks = self.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(cid, _)| *cid != id);
        callbacks.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generic::StructValue;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn full(cache: &VariableCache, value: impl Into<GenericValue>) {
        cache.on_update(value.into(), &[], UpdateMetadata::default());
    }

    #[test]
    fn test_initial_state() {
        let cache = VariableCache::new();
        assert!(!cache.is_connected());
        assert_eq!(cache.get_value(), GenericValue::Empty);
        assert!(!cache.has_valid_value());
        assert_eq!(cache.get_extended_value(), ExtendedValue::default());
    }

    #[test]
    fn test_connected_without_value() {
        let cache = VariableCache::new();
        cache.on_connected();
        assert!(cache.is_connected());
        assert_eq!(cache.get_value(), GenericValue::Empty);
        assert!(!cache.wait_for_valid_value(Duration::from_millis(20)));

        full(&cache, 4.5f64);
        assert!(cache.wait_for_valid_value(Duration::from_millis(20)));
        assert_eq!(cache.get_value(), GenericValue::from(4.5f64));
    }

    #[test]
    fn test_validity_survives_reconnect() {
        let cache = VariableCache::new();
        cache.on_connected();
        full(&cache, 1i32);
        cache.on_disconnected();
        assert_eq!(cache.get_value(), GenericValue::Empty);
        assert!(!cache.has_valid_value());
        assert_eq!(cache.get_extended_value().value, GenericValue::from(1i32));

        cache.on_connected();
        assert!(cache.has_valid_value());
        assert_eq!(cache.get_value(), GenericValue::from(1i32));

        cache.on_clear();
        assert!(!cache.has_valid_value());
        assert_eq!(cache.get_value(), GenericValue::Empty);
    }

    #[test]
    fn test_partial_update_touches_only_listed_paths() {
        let cache = VariableCache::new();
        cache.on_connected();
        let initial: GenericValue = StructValue::default()
            .with_field("setpoint", 4.0f64)
            .with_field("enabled", true)
            .into();
        full(&cache, initial);

        let delivered: GenericValue = StructValue::default()
            .with_field("setpoint", 6.2f64)
            .with_field("enabled", false)
            .into();
        cache.on_update(delivered, &["setpoint".to_string()], UpdateMetadata::default());

        let value = cache.get_value();
        assert_eq!(value.field("setpoint").and_then(GenericValue::as_f64), Some(6.2));
        assert_eq!(value.field("enabled").and_then(GenericValue::as_bool), Some(true));
    }

    #[test]
    fn test_metadata() {
        let cache = VariableCache::new();
        cache.on_connected();
        let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        cache.on_update(
            GenericValue::from(1u16),
            &[],
            UpdateMetadata {
                timestamp: Some(stamp),
                status: Some(3),
                severity: Some(AlarmSeverity::from_raw(2)),
            },
        );
        let ext = cache.get_extended_value();
        assert_eq!(ext.timestamp, Some(stamp));
        assert_eq!(ext.status, Some(3));
        assert_eq!(ext.severity, Some(AlarmSeverity::Major));
        assert_eq!(AlarmSeverity::from_raw(9), AlarmSeverity::Invalid);
        for raw in 0..=3 {
            assert_eq!(AlarmSeverity::from_raw(raw).as_raw(), raw);
        }
    }

    #[test]
    fn test_unbounded_timeout_returns_when_ready() {
        let cache = VariableCache::new();
        cache.on_connected();
        full(&cache, 1i32);
        assert!(cache.wait_for_connected(Duration::MAX));
        assert!(cache.wait_for_valid_value(Duration::MAX));
    }

    #[test]
    fn test_unbounded_timeout_waits_for_update() {
        let cache = Arc::new(VariableCache::new());
        let c = Arc::clone(&cache);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            c.on_connected();
        });

        assert!(cache.wait_for_connected(Duration::MAX));
        handle.join().expect("join");
    }

    #[test]
    fn test_waiter_woken_by_update() {
        let cache = Arc::new(VariableCache::new());
        let c = Arc::clone(&cache);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            c.on_connected();
            full(&c, "ready");
        });

        assert!(cache.wait_for_valid_value(Duration::from_secs(2)));
        assert!(cache.wait_for_connected(Duration::ZERO));
        handle.join().expect("join");
    }

    #[test]
    fn test_callback_may_reenter_cache() {
        let cache = Arc::new(VariableCache::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&cache);
        let s = Arc::clone(&seen);
        let id = cache.subscribe(move |snapshot| {
            // Reads and registrations from inside the callback must not block.
            assert_eq!(c.is_connected(), snapshot.connected);
            let _ = c.get_extended_value();
            s.fetch_add(1, Ordering::SeqCst);
        });

        cache.on_connected();
        full(&cache, 2i32);
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(cache.unsubscribe(id));
        assert!(!cache.unsubscribe(id));
        cache.on_disconnected();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
