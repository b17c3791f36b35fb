// ── Command client seam ──
//
// `Connector::connect` opens one session, `DeviceSession::write` issues a
// command on it, `DeviceSession::close` tears it down. The core layer owns
// session lifetimes; implementors only provide the transport.

use std::future::Future;

use crate::credentials::DeviceCredentials;
use crate::error::Error;
use crate::params::Params;
use crate::record::Record;

/// One open, authenticated connection to a device's control plane.
///
/// A session is owned by exactly one in-flight operation and is never
/// shared. `close` must be idempotent and infallible.
pub trait DeviceSession: Send {
    /// Issue `path` (e.g. `/interface/print`) with `params` and return
    /// the device's result records in protocol order.
    fn write(
        &mut self,
        path: &str,
        params: &Params,
    ) -> impl Future<Output = Result<Vec<Record>, Error>> + Send;

    /// Tear the session down. Safe to call more than once.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens sessions. Shared across operations, so it holds no per-session
/// state.
pub trait Connector: Send + Sync {
    type Session: DeviceSession;

    /// Authenticate against the device described by `credentials`.
    fn connect(
        &self,
        credentials: &DeviceCredentials,
    ) -> impl Future<Output = Result<Self::Session, Error>> + Send;
}
