// ── Domain model ──
//
// Typed views of RouterOS menu rows. Conversions from raw records live in
// `crate::convert`.

mod firewall;
mod interface;
mod ip;
mod route;
mod stats;
mod system;

pub use firewall::{AddressListEntry, FirewallRule};
pub use interface::Interface;
pub use ip::{DhcpServer, IpAddress};
pub use route::Route;
pub use stats::{DeviceStats, InterfaceRate};
pub use system::{SystemInfo, SystemResource};
