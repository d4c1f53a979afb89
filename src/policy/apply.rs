use crate::api::gateway::ClientGateway;
use crate::models::action::Action;
use crate::policy::PassReport;
use tracing::{info, warn};

/// Issue `actions` in order, one torrent at a time.
///
/// A failure is logged for that torrent and the remaining actions still run.
/// Deletes reannounce first; a failed reannounce never blocks the delete.
pub async fn apply_actions(gateway: &dyn ClientGateway, actions: &[Action], reason: &str) -> PassReport {
    let mut report = PassReport {
        planned: actions.len(),
        ..PassReport::default()
    };

    for action in actions {
        let result = match action {
            Action::SetUploadLimit { hash, limit, .. } => gateway.set_upload_limit(hash, *limit).await,
            Action::Pause { hash, .. } => gateway.pause(hash).await,
            Action::Resume { hash, .. } => gateway.resume(hash).await,
            Action::Delete { hash, name } => {
                if let Err(e) = gateway.reannounce(hash).await {
                    warn!(hash = %hash, name = %name, error = %e, "Failed to reannounce torrent before removal");
                }
                gateway.delete(hash, true).await
            }
        };

        match result {
            Ok(()) => {
                report.applied += 1;
                info!(
                    action = action.kind(),
                    hash = %action.hash(),
                    name = %action.name(),
                    reason = reason,
                    "Applied torrent action"
                );
            }
            Err(e) => {
                report.failed += 1;
                warn!(
                    action = action.kind(),
                    hash = %action.hash(),
                    name = %action.name(),
                    reason = reason,
                    error = %e,
                    "Torrent action failed"
                );
            }
        }
    }

    report
}
