// ── Record → domain conversions ──
//
// RouterOS rows are loosely typed: every field may be missing, flags are
// `true`/`false` strings, counters are decimal strings. Missing flags
// default to `false`, missing counters to 0.

use rosfleet_api::Record;

use crate::model::{
    AddressListEntry, DhcpServer, FirewallRule, Interface, IpAddress, Route, SystemResource,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn text(r: &Record, key: &str) -> String {
    r.text(key).unwrap_or_default()
}

fn opt(r: &Record, key: &str) -> Option<String> {
    r.text(key).filter(|s| !s.is_empty())
}

fn flag(r: &Record, key: &str) -> bool {
    r.flag(key).unwrap_or(false)
}

fn id(r: &Record) -> String {
    r.id().unwrap_or_default().to_owned()
}

/// Bytes to MiB, rounded to one decimal place.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 10.0).round() / 10.0
}

/// `cpu-load` as reported; some firmware appends `%`.
fn percent(r: &Record, key: &str) -> u64 {
    r.u64(key)
        .or_else(|| r.str(key).and_then(|s| s.trim_end_matches('%').parse().ok()))
        .unwrap_or(0)
}

impl From<&Record> for Interface {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            name: text(r, "name"),
            kind: text(r, "type"),
            mac_address: opt(r, "mac-address"),
            mtu: r.u64("actual-mtu").or_else(|| r.u64("mtu")),
            running: flag(r, "running"),
            disabled: flag(r, "disabled"),
            comment: opt(r, "comment"),
            rx_bytes: r.u64("rx-byte").unwrap_or(0),
            tx_bytes: r.u64("tx-byte").unwrap_or(0),
        }
    }
}

impl From<&Record> for IpAddress {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            address: text(r, "address"),
            network: opt(r, "network"),
            interface: text(r, "interface"),
            disabled: flag(r, "disabled"),
            dynamic: flag(r, "dynamic"),
            comment: opt(r, "comment"),
        }
    }
}

impl From<&Record> for DhcpServer {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            name: text(r, "name"),
            interface: text(r, "interface"),
            address_pool: opt(r, "address-pool"),
            lease_time: opt(r, "lease-time"),
            disabled: flag(r, "disabled"),
        }
    }
}

impl From<&Record> for Route {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            dst_address: text(r, "dst-address"),
            gateway: opt(r, "gateway"),
            distance: r.u64("distance"),
            scope: r.u64("scope"),
            target_scope: r.u64("target-scope"),
            check_gateway: opt(r, "check-gateway"),
            active: flag(r, "active"),
            dynamic: flag(r, "dynamic"),
            disabled: flag(r, "disabled"),
            comment: opt(r, "comment"),
        }
    }
}

impl From<&Record> for FirewallRule {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            chain: text(r, "chain"),
            action: text(r, "action"),
            src_address: opt(r, "src-address"),
            dst_address: opt(r, "dst-address"),
            in_interface: opt(r, "in-interface"),
            out_interface: opt(r, "out-interface"),
            protocol: opt(r, "protocol"),
            disabled: flag(r, "disabled"),
            comment: opt(r, "comment"),
        }
    }
}

impl From<&Record> for AddressListEntry {
    fn from(r: &Record) -> Self {
        Self {
            id: id(r),
            list: text(r, "list"),
            address: text(r, "address"),
            disabled: flag(r, "disabled"),
            comment: opt(r, "comment"),
        }
    }
}

impl From<&Record> for SystemResource {
    fn from(r: &Record) -> Self {
        Self {
            uptime: text(r, "uptime"),
            version: text(r, "version"),
            board_name: opt(r, "board-name"),
            architecture: opt(r, "architecture-name"),
            cpu: opt(r, "cpu"),
            cpu_count: r.u64("cpu-count"),
            cpu_load: percent(r, "cpu-load"),
            free_memory: r.u64("free-memory").unwrap_or(0),
            total_memory: r.u64("total-memory").unwrap_or(0),
            free_hdd_space: r.u64("free-hdd-space"),
            total_hdd_space: r.u64("total-hdd-space"),
        }
    }
}

/// Convert every row.
pub fn all<'a, T: From<&'a Record>>(rows: &'a [Record]) -> Vec<T> {
    rows.iter().map(T::from).collect()
}
