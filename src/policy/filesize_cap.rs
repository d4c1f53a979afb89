use crate::api::gateway::ClientGateway;
use crate::core::error::PassError;
use crate::models::{action::Action, torrent::Torrent};
use crate::policy::{apply::apply_actions, PassReport, Rule};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Delete torrents strictly larger than `max_bytes`.
pub fn plan(torrents: &[Torrent], max_bytes: u64) -> Vec<Action> {
    torrents
        .iter()
        .filter(|torrent| torrent.total_size_bytes > max_bytes)
        .map(Action::delete)
        .collect()
}

pub struct FilesizeCapRule {
    gateway: Arc<dyn ClientGateway>,
    max_bytes: u64,
}

impl FilesizeCapRule {
    pub fn new(gateway: Arc<dyn ClientGateway>, max_bytes: u64) -> Self {
        Self { gateway, max_bytes }
    }
}

#[async_trait]
impl Rule for FilesizeCapRule {
    fn name(&self) -> &'static str {
        "remove_torrents_with_filesize_above_threshold"
    }

    async fn evaluate(&self) -> Result<PassReport, PassError> {
        let torrents = self.gateway.list_torrents().await?;
        let actions = plan(&torrents, self.max_bytes);

        for torrent in torrents.iter().filter(|t| t.total_size_bytes > self.max_bytes) {
            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                size_gb = torrent.size_gb(),
                "Filesize threshold exceeded, removing torrent"
            );
        }

        Ok(apply_actions(self.gateway.as_ref(), &actions, "filesize threshold").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{torrent, Call, MockGateway};

    const CAP: u64 = 50_000_000_000_000;

    #[test]
    fn test_boundary_is_exclusive() {
        let torrents = vec![
            torrent("at", CAP, 0, ""),
            torrent("over", CAP + 1, 0, ""),
            torrent("under", CAP - 1, 0, ""),
        ];

        let actions = plan(&torrents, CAP);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].hash(), "over");
    }

    #[test]
    fn test_unknown_size_is_kept() {
        let torrents = vec![torrent("metadata-pending", 0, 0, "")];

        assert!(plan(&torrents, CAP).is_empty());
    }

    #[tokio::test]
    async fn test_rule_removes_oversized() {
        let gateway = Arc::new(MockGateway::new(vec![
            torrent("big", 60_000_000_000_000, 0, ""),
            torrent("small", 4_000_000_000, 0, ""),
        ]));
        let rule = FilesizeCapRule::new(gateway.clone(), CAP);

        let report = rule.evaluate().await.unwrap();

        assert_eq!(report, PassReport { planned: 1, applied: 1, failed: 0 });
        assert!(gateway.calls().contains(&Call::Delete("big".into(), true)));
        assert!(!gateway.calls().iter().any(|c| matches!(c, Call::Delete(h, _) if h == "small")));
    }
}
