//! Interface throughput from polled byte counters.

mod rate;
mod store;

pub use rate::{EvictionPolicy, Rate, RateCalculator};
pub use store::{CounterSnapshot, InterfaceKey, SnapshotStore};
