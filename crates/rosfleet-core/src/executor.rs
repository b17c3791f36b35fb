// ── Command executor ──
//
// Issues one command on an open session and hands back the device's
// records. Rejections keep the device-supplied reason. The only error
// swallowed here is the link dropping right after a reboot or shutdown,
// which is how the device acknowledges those commands.

use rosfleet_api::{DeviceSession, Params, Record};
use tracing::debug;

use crate::error::CoreError;
use crate::session::Session;

/// Commands after which the device is expected to drop the link.
const LINK_DROPPING_COMMANDS: &[&str] = &["/system/reboot", "/system/shutdown"];

/// Run `path` with `params` and return the result records in order.
pub async fn execute<S: DeviceSession>(
    session: &mut Session<S>,
    path: &str,
    params: &Params,
) -> Result<Vec<Record>, CoreError> {
    let host = session.host().to_owned();
    debug!(host = %host, path, "executing command");

    match session.client()?.write(path, params).await {
        Ok(rows) => {
            debug!(host = %host, path, rows = rows.len(), "command completed");
            Ok(rows)
        }
        Err(err) if err.is_connection_drop() && drops_link(path) => {
            debug!(host = %host, path, "device dropped the link as expected");
            Ok(Vec::new())
        }
        Err(err) => {
            if let Some(reason) = err.rejection_message() {
                debug!(host = %host, path, reason, "command rejected");
            }
            Err(CoreError::from_command(path, err))
        }
    }
}

fn drops_link(path: &str) -> bool {
    LINK_DROPPING_COMMANDS.contains(&path.trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::SessionManager;
    use crate::testing::FakeRouter;

    #[tokio::test]
    async fn reboot_link_drop_is_success() {
        let router = FakeRouter::new();
        router.drop_link_on("/system/reboot");
        let sessions = SessionManager::new(Arc::new(router.clone()));

        let rows = sessions
            .scoped(&FakeRouter::credentials(), async |session| {
                execute(session, "/system/reboot", &Params::new()).await
            })
            .await
            .unwrap();

        assert!(rows.is_empty());
        assert_eq!(router.closes(), 1);
    }

    #[tokio::test]
    async fn link_drop_on_other_commands_propagates() {
        let router = FakeRouter::new();
        router.drop_link_on("/interface/print");
        let sessions = SessionManager::new(Arc::new(router.clone()));

        let err = sessions
            .scoped(&FakeRouter::credentials(), async |session| {
                execute(session, "/interface/print", &Params::new()).await
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ConnectionDropped { .. }));
    }

    #[tokio::test]
    async fn rejection_carries_path_and_reason() {
        let router = FakeRouter::new();
        router.reject_when(|path, _| path == "/system/identity/set", "permission denied");
        let sessions = SessionManager::new(Arc::new(router.clone()));

        let err = sessions
            .scoped(&FakeRouter::credentials(), async |session| {
                execute(
                    session,
                    "/system/identity/set",
                    &Params::new().attr("name", "edge"),
                )
                .await
            })
            .await
            .unwrap_err();

        match err {
            CoreError::Command { path, message } => {
                assert_eq!(path, "/system/identity/set");
                assert_eq!(message, "permission denied");
            }
            other => panic!("expected command error, got {other:?}"),
        }
    }
}
