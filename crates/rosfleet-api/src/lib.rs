// rosfleet-api: command client for the RouterOS control plane
//
// The `Connector` / `DeviceSession` traits are the seam the core layer is
// written against. `RestConnector` is the shipped implementation and speaks
// the RouterOS REST command bridge.

pub mod client;
pub mod credentials;
pub mod error;
pub mod params;
pub mod record;
pub mod rest;
pub mod transport;

pub use client::{Connector, DeviceSession};
pub use credentials::{DEFAULT_PORT, DEFAULT_TIMEOUT, DeviceCredentials};
pub use error::Error;
pub use params::Params;
pub use record::Record;
pub use rest::{RestConnector, RestSession};
pub use transport::{TlsMode, TransportConfig};
