// ── Device session manager ──
//
// One logical operation gets one session. `acquire` opens it under the
// credentials' deadline, `release` closes it, and `scoped` runs a closure
// between the two so the close happens on every exit path.

use std::sync::Arc;

use rosfleet_api::{Connector, DeviceCredentials, DeviceSession};
use tracing::{debug, warn};

use crate::error::CoreError;

/// An exclusive, single-use handle on one open device session.
///
/// Consumed by [`Session::release`], so it cannot be used afterwards.
/// Dropping it without releasing leaks the device-side connection until
/// the device times it out, and is logged.
pub struct Session<S: DeviceSession> {
    inner: Option<S>,
    host: String,
}

impl<S: DeviceSession> Session<S> {
    fn new(inner: S, host: String) -> Self {
        Self {
            inner: Some(inner),
            host,
        }
    }

    /// Host this session is connected to.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub(crate) fn client(&mut self) -> Result<&mut S, CoreError> {
        self.inner
            .as_mut()
            .ok_or_else(|| CoreError::Internal("session used after release".into()))
    }

    /// Close the underlying session. Never fails.
    pub async fn release(mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.close().await;
            debug!(host = %self.host, "session released");
        }
    }
}

impl<S: DeviceSession> Drop for Session<S> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            warn!(host = %self.host, "session dropped without release");
        }
    }
}

/// Opens and closes sessions through a shared [`Connector`].
pub struct SessionManager<C: Connector> {
    connector: Arc<C>,
}

impl<C: Connector> Clone for SessionManager<C> {
    fn clone(&self) -> Self {
        Self {
            connector: Arc::clone(&self.connector),
        }
    }
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    /// Open and authenticate a session, bounded by `credentials.timeout`.
    ///
    /// No retries: any failure is returned as a connection error.
    pub async fn acquire(
        &self,
        credentials: &DeviceCredentials,
    ) -> Result<Session<C::Session>, CoreError> {
        let endpoint = credentials.endpoint();
        debug!(endpoint = %endpoint, user = %credentials.user, "acquiring session");

        let connect = self.connector.connect(credentials);
        let result = match tokio::time::timeout(credentials.timeout, connect).await {
            Ok(result) => result.map_err(CoreError::from),
            Err(_) => Err(CoreError::Timeout {
                timeout_secs: credentials.timeout.as_secs(),
            }),
        };

        match result {
            Ok(inner) => {
                debug!(endpoint = %endpoint, "session acquired");
                Ok(Session::new(inner, credentials.host.clone()))
            }
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "session acquisition failed");
                Err(connection_error(err, &credentials.host))
            }
        }
    }

    /// Close a session. Idempotent by construction: the handle is consumed.
    pub async fn release(&self, session: Session<C::Session>) {
        session.release().await;
    }

    /// Run `op` against a fresh session and release it afterwards,
    /// whatever `op` returns.
    pub async fn scoped<T, F>(&self, credentials: &DeviceCredentials, op: F) -> Result<T, CoreError>
    where
        F: AsyncFnOnce(&mut Session<C::Session>) -> Result<T, CoreError>,
    {
        let mut session = self.acquire(credentials).await?;
        let result = op(&mut session).await;
        session.release().await;
        result
    }
}

/// Acquisition failures are always connection errors; fill in the host
/// where the transport did not know it.
fn connection_error(err: CoreError, host: &str) -> CoreError {
    match err {
        CoreError::ConnectionFailed { host: h, reason } if h.is_empty() => {
            CoreError::ConnectionFailed {
                host: host.to_owned(),
                reason,
            }
        }
        CoreError::Command { message, .. } => CoreError::ConnectionFailed {
            host: host.to_owned(),
            reason: message,
        },
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use rosfleet_api::Params;

    use super::*;
    use crate::executor::execute;
    use crate::testing::FakeRouter;

    fn manager(router: &FakeRouter) -> SessionManager<FakeRouter> {
        SessionManager::new(Arc::new(router.clone()))
    }

    #[tokio::test]
    async fn release_runs_once_when_command_fails() {
        let router = FakeRouter::new();
        router.reject_when(|path, _| path == "/ip/route/add", "invalid value for argument");
        let sessions = manager(&router);

        let result = sessions
            .scoped(&FakeRouter::credentials(), async |session| {
                execute(session, "/ip/route/print", &Params::new()).await?;
                execute(session, "/ip/route/add", &Params::new().attr("gateway", "x")).await
            })
            .await;

        assert!(matches!(result, Err(CoreError::Command { .. })));
        assert_eq!(router.connects(), 1);
        assert_eq!(router.closes(), 1);
    }

    #[tokio::test]
    async fn release_runs_once_on_success() {
        let router = FakeRouter::new();
        let sessions = manager(&router);

        let rows = sessions
            .scoped(&FakeRouter::credentials(), async |session| {
                execute(session, "/interface/print", &Params::new()).await
            })
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(router.closes(), 1);
    }

    #[tokio::test]
    async fn refused_credentials_are_connection_errors() {
        let router = FakeRouter::new();
        router.refuse_credentials();
        let err = manager(&router)
            .acquire(&FakeRouter::credentials())
            .await
            .err()
            .unwrap();

        assert!(err.is_connection());
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert_eq!(router.closes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn acquisition_times_out() {
        let router = FakeRouter::new();
        router.hang_on_connect();
        let creds = FakeRouter::credentials().with_timeout(Duration::from_secs(15));

        let err = manager(&router).acquire(&creds).await.err().unwrap();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 15 }));
    }

    #[tokio::test]
    async fn unreachable_device_fails_fast() {
        let router = FakeRouter::new();
        router.unreachable();
        let err = manager(&router)
            .acquire(&FakeRouter::credentials())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
        assert_eq!(router.connects(), 1);
    }
}
