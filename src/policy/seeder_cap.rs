use crate::api::gateway::ClientGateway;
use crate::core::error::PassError;
use crate::models::{action::Action, torrent::Torrent};
use crate::policy::{apply::apply_actions, PassReport, Rule};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Delete torrents whose swarm already has more than `max_seeders` seeders.
pub fn plan(torrents: &[Torrent], max_seeders: u32) -> Vec<Action> {
    torrents
        .iter()
        .filter(|torrent| torrent.num_complete_peers > max_seeders)
        .map(Action::delete)
        .collect()
}

pub struct SeederCapRule {
    gateway: Arc<dyn ClientGateway>,
    max_seeders: u32,
}

impl SeederCapRule {
    pub fn new(gateway: Arc<dyn ClientGateway>, max_seeders: u32) -> Self {
        Self { gateway, max_seeders }
    }
}

#[async_trait]
impl Rule for SeederCapRule {
    fn name(&self) -> &'static str {
        "check_seeders_threshold"
    }

    async fn evaluate(&self) -> Result<PassReport, PassError> {
        let torrents = self.gateway.list_torrents().await?;
        let actions = plan(&torrents, self.max_seeders);

        for torrent in torrents.iter().filter(|t| t.num_complete_peers > self.max_seeders) {
            info!(
                hash = %torrent.hash,
                name = %torrent.name,
                seeders = torrent.num_complete_peers,
                max_seeders = self.max_seeders,
                "Seeders threshold exceeded, removing torrent"
            );
        }

        Ok(apply_actions(self.gateway.as_ref(), &actions, "seeders threshold").await)
    }
}
