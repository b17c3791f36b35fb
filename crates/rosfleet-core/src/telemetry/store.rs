// ── Counter snapshot store ──
//
// Last-seen byte counters per (device, interface), sharded through
// `DashMap` so polls of different devices never contend. Each device
// also carries a poll-cycle counter used for missed-cycle eviction.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

/// Composite key of one counter history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InterfaceKey {
    pub device_id: String,
    pub interface: String,
}

impl InterfaceKey {
    pub fn new(device_id: impl Into<String>, interface: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            interface: interface.into(),
        }
    }
}

/// Last observed counters for one interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub observed_at: DateTime<Utc>,
    /// Poll cycle of the owning device in which this sample was taken.
    pub cycle: u64,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    entries: DashMap<InterfaceKey, CounterSnapshot>,
    cycles: DashMap<String, u64>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &InterfaceKey) -> Option<CounterSnapshot> {
        self.entries.get(key).map(|entry| *entry)
    }

    /// Store `snapshot`, returning the one it replaced. The swap happens
    /// under the key's shard lock.
    pub fn replace(&self, key: InterfaceKey, snapshot: CounterSnapshot) -> Option<CounterSnapshot> {
        self.entries.insert(key, snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by key.
    pub fn snapshot(&self) -> Vec<(InterfaceKey, CounterSnapshot)> {
        let mut all: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    // ── Cycles ───────────────────────────────────────────────────────

    /// Current poll cycle of `device_id` (0 before the first poll).
    pub fn cycle(&self, device_id: &str) -> u64 {
        self.cycles.get(device_id).map_or(0, |c| *c)
    }

    /// Start a new poll cycle for `device_id` and return its number.
    pub fn advance_cycle(&self, device_id: &str) -> u64 {
        let mut cycle = self.cycles.entry(device_id.to_owned()).or_insert(0);
        *cycle += 1;
        *cycle
    }

    // ── Eviction ─────────────────────────────────────────────────────

    /// Drop `device_id`'s interfaces last seen `max_missed` or more
    /// cycles ago. Returns the number of evicted entries.
    pub fn evict_missed(&self, device_id: &str, max_missed: u64) -> usize {
        let current = self.cycle(device_id);
        let before = self.entries.len();
        self.entries.retain(|key, snap| {
            key.device_id != device_id || current.saturating_sub(snap.cycle) < max_missed
        });
        before.saturating_sub(self.entries.len())
    }

    /// Drop every entry not observed within `max_idle` of `now`, along
    /// with cycle counters of devices left without entries.
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        self.evict_idle_except(now, max_idle, |_| false)
    }

    /// [`evict_idle`](Self::evict_idle), leaving alone every device for
    /// which `keep` returns true.
    pub fn evict_idle_except(
        &self,
        now: DateTime<Utc>,
        max_idle: Duration,
        keep: impl Fn(&str) -> bool,
    ) -> usize {
        let max_idle = chrono::Duration::from_std(max_idle).unwrap_or(chrono::Duration::MAX);
        let before = self.entries.len();
        self.entries.retain(|key, snap| {
            keep(&key.device_id) || now.signed_duration_since(snap.observed_at) <= max_idle
        });
        self.cycles
            .retain(|device, _| self.entries.iter().any(|e| e.key().device_id == *device));
        before.saturating_sub(self.entries.len())
    }
}
