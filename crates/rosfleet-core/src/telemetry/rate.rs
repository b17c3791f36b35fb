// ── Rate calculator ──
//
// Turns monotonically increasing byte counters into bytes/second using
// the two most recent samples of the same interface. No smoothing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::store::{CounterSnapshot, InterfaceKey, SnapshotStore};

/// Throughput of one interface between its last two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rate {
    pub rx_bytes_per_second: f64,
    pub tx_bytes_per_second: f64,
}

impl Rate {
    pub const ZERO: Rate = Rate {
        rx_bytes_per_second: 0.0,
        tx_bytes_per_second: 0.0,
    };
}

/// When counter histories are forgotten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionPolicy {
    /// Consecutive polls of a device an interface may be absent from.
    pub max_missed_cycles: u64,
    /// Age after which any history is dropped by `evict_idle`.
    pub max_idle: Duration,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_missed_cycles: 3,
            max_idle: Duration::from_secs(600),
        }
    }
}

/// Rate calculator owning its snapshot store. Share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct RateCalculator {
    store: SnapshotStore,
    policy: EvictionPolicy,
}

impl RateCalculator {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            store: SnapshotStore::new(),
            policy,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Record a sample and return the rate since the previous one.
    ///
    /// The first sample of a key, and any sample not strictly later than
    /// the previous one, yields zero. A counter that went backwards
    /// (reboot, wrap) yields zero for that direction. The stored snapshot
    /// is always replaced by this sample.
    pub fn compute_rate(
        &self,
        device_id: &str,
        interface: &str,
        rx_bytes: u64,
        tx_bytes: u64,
        now: DateTime<Utc>,
    ) -> Rate {
        let current = CounterSnapshot {
            rx_bytes,
            tx_bytes,
            observed_at: now,
            cycle: self.store.cycle(device_id),
        };
        let key = InterfaceKey::new(device_id, interface);
        let Some(previous) = self.store.replace(key, current) else {
            return Rate::ZERO;
        };

        let elapsed_micros = now
            .signed_duration_since(previous.observed_at)
            .num_microseconds()
            .unwrap_or(0);
        if elapsed_micros <= 0 {
            return Rate::ZERO;
        }
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let elapsed = elapsed_micros as f64 / 1_000_000.0;

        Rate {
            rx_bytes_per_second: per_second(previous.rx_bytes, rx_bytes, elapsed),
            tx_bytes_per_second: per_second(previous.tx_bytes, tx_bytes, elapsed),
        }
    }

    /// Mark the start of a poll of `device_id`.
    pub fn begin_cycle(&self, device_id: &str) -> u64 {
        self.store.advance_cycle(device_id)
    }

    /// Finish a poll of `device_id`, evicting interfaces that have now
    /// been missing for `max_missed_cycles` polls.
    pub fn end_cycle(&self, device_id: &str) -> usize {
        let evicted = self
            .store
            .evict_missed(device_id, self.policy.max_missed_cycles);
        if evicted > 0 {
            debug!(device = device_id, evicted, "evicted vanished interfaces");
        }
        evicted
    }

    /// Drop histories idle longer than `max_idle` (devices no longer
    /// polled at all).
    pub fn evict_idle(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let evicted = self.store.evict_idle(now, max_idle);
        if evicted > 0 {
            debug!(evicted, "evicted idle counter histories");
        }
        evicted
    }

    /// [`evict_idle`](Self::evict_idle) with the configured `max_idle`.
    pub fn evict_stale(&self, now: DateTime<Utc>) -> usize {
        self.evict_idle(now, self.policy.max_idle)
    }

    /// [`evict_stale`](Self::evict_stale) restricted to devices not in
    /// `known`. Known devices shed vanished interfaces through
    /// [`end_cycle`](Self::end_cycle) instead, however long their poll
    /// interval.
    pub fn evict_stale_except(&self, now: DateTime<Utc>, known: &[String]) -> usize {
        let evicted = self.store.evict_idle_except(now, self.policy.max_idle, |device| {
            known.iter().any(|k| k == device)
        });
        if evicted > 0 {
            debug!(evicted, "evicted idle counter histories of removed devices");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn per_second(previous: u64, current: u64, elapsed_secs: f64) -> f64 {
    current.saturating_sub(previous) as f64 / elapsed_secs
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn first_sample_is_baseline_then_rate() {
        let calc = RateCalculator::default();
        assert_eq!(calc.compute_rate("r1", "ether1", 0, 0, at(0)), Rate::ZERO);

        let rate = calc.compute_rate("r1", "ether1", 2_000_000, 0, at(2));
        assert!((rate.rx_bytes_per_second - 1_000_000.0).abs() < f64::EPSILON);
        assert!(rate.tx_bytes_per_second.abs() < f64::EPSILON);
    }

    #[test]
    fn rate_is_delta_over_elapsed() {
        let calc = RateCalculator::default();
        calc.compute_rate("r1", "ether1", 1_000, 5_000, at(0));
        let rate = calc.compute_rate("r1", "ether1", 31_000, 8_000, at(10));
        assert!((rate.rx_bytes_per_second - 3_000.0).abs() < f64::EPSILON);
        assert!((rate.tx_bytes_per_second - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let calc = RateCalculator::default();
        calc.compute_rate("r1", "ether1", 9_000_000, 9_000_000, at(0));
        let rate = calc.compute_rate("r1", "ether1", 100, 9_000_500, at(5));
        assert!(rate.rx_bytes_per_second.abs() < f64::EPSILON);
        assert!((rate.tx_bytes_per_second - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn non_monotonic_clock_yields_zero_and_updates_state() {
        let calc = RateCalculator::default();
        calc.compute_rate("r1", "ether1", 1_000, 1_000, at(10));

        assert_eq!(calc.compute_rate("r1", "ether1", 5_000, 5_000, at(10)), Rate::ZERO);
        assert_eq!(calc.compute_rate("r1", "ether1", 6_000, 6_000, at(4)), Rate::ZERO);

        let stored = calc
            .store()
            .get(&InterfaceKey::new("r1", "ether1"))
            .map(|s| (s.rx_bytes, s.observed_at));
        assert_eq!(stored, Some((6_000, at(4))));

        // Next poll measures against the overwritten baseline.
        let rate = calc.compute_rate("r1", "ether1", 7_000, 7_000, at(5));
        assert!((rate.rx_bytes_per_second - 1_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn keys_do_not_interfere() {
        let calc = RateCalculator::default();
        calc.compute_rate("r1", "ether1", 0, 0, at(0));
        calc.compute_rate("r2", "ether1", 500, 500, at(0));

        let rate = calc.compute_rate("r1", "ether1", 100, 100, at(1));
        assert!((rate.rx_bytes_per_second - 100.0).abs() < f64::EPSILON);
        assert_eq!(calc.len(), 2);
    }

    #[test]
    fn vanished_interfaces_evicted_after_missed_cycles() {
        let calc = RateCalculator::new(EvictionPolicy {
            max_missed_cycles: 3,
            ..EvictionPolicy::default()
        });

        calc.begin_cycle("r1");
        calc.compute_rate("r1", "ether1", 0, 0, at(0));
        calc.compute_rate("r1", "ether9", 0, 0, at(0));
        calc.compute_rate("r2", "ether9", 0, 0, at(0));
        assert_eq!(calc.end_cycle("r1"), 0);

        // ether9 disappears from r1.
        for poll in 1..=2 {
            calc.begin_cycle("r1");
            calc.compute_rate("r1", "ether1", 0, 0, at(poll));
            assert_eq!(calc.end_cycle("r1"), 0);
        }
        calc.begin_cycle("r1");
        calc.compute_rate("r1", "ether1", 0, 0, at(3));
        assert_eq!(calc.end_cycle("r1"), 1);

        assert!(calc.store().get(&InterfaceKey::new("r1", "ether9")).is_none());
        assert!(calc.store().get(&InterfaceKey::new("r2", "ether9")).is_some());
        assert_eq!(calc.len(), 2);
    }

    #[test]
    fn idle_histories_are_reclaimed() {
        let calc = RateCalculator::default();
        calc.compute_rate("gone", "ether1", 0, 0, at(0));
        calc.compute_rate("live", "ether1", 0, 0, at(900));

        assert_eq!(calc.evict_stale(at(1_000)), 1);
        assert!(calc.store().get(&InterfaceKey::new("gone", "ether1")).is_none());
        assert_eq!(calc.len(), 1);
    }

    #[test]
    fn known_devices_survive_long_poll_intervals() {
        let calc = RateCalculator::default();
        calc.compute_rate("a", "ether1", 0, 0, at(0));
        calc.compute_rate("b", "ether1", 0, 0, at(0));
        calc.compute_rate("removed", "ether1", 0, 0, at(0));

        let known = ["a".to_owned(), "b".to_owned()];
        assert_eq!(calc.evict_stale_except(at(700), &known), 1);
        assert!(calc.store().get(&InterfaceKey::new("removed", "ether1")).is_none());

        let rate = calc.compute_rate("b", "ether1", 700_000, 0, at(700));
        assert!((rate.rx_bytes_per_second - 1_000.0).abs() < f64::EPSILON);
    }
}
