use crate::api::gateway::ClientGateway;
use crate::core::error::{DiskError, PassError};
use crate::models::{action::Action, torrent::Torrent};
use crate::policy::{apply::apply_actions, PassReport, Rule};
use crate::utils::disk::DiskProbe;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Emergency space reclamation.
///
/// Below the floor every torrent is deleted, with no seeder or tracker
/// filtering. At or above the floor nothing happens.
pub fn plan(torrents: &[Torrent], free_bytes: u64, floor_bytes: u64) -> Vec<Action> {
    if free_bytes >= floor_bytes {
        return Vec::new();
    }
    torrents.iter().map(Action::delete).collect()
}

pub struct DiskFloorRule {
    gateway: Arc<dyn ClientGateway>,
    probe: Arc<dyn DiskProbe>,
    floor_bytes: u64,
}

impl DiskFloorRule {
    pub fn new(gateway: Arc<dyn ClientGateway>, probe: Arc<dyn DiskProbe>, floor_bytes: u64) -> Self {
        Self {
            gateway,
            probe,
            floor_bytes,
        }
    }

    async fn free_bytes(&self) -> Result<u64, DiskError> {
        let probe = Arc::clone(&self.probe);
        tokio::task::spawn_blocking(move || probe.free_bytes())
            .await
            .map_err(|e| DiskError::ProbeFailed(e.to_string()))?
    }
}

#[async_trait]
impl Rule for DiskFloorRule {
    fn name(&self) -> &'static str {
        "remove_torrents_if_disk_space_below_threshold"
    }

    async fn evaluate(&self) -> Result<PassReport, PassError> {
        let free_bytes = self.free_bytes().await?;

        if free_bytes >= self.floor_bytes {
            debug!(free_bytes = free_bytes, floor_bytes = self.floor_bytes, "Disk space above floor");
            return Ok(PassReport::idle());
        }

        warn!(
            free_gb = free_bytes as f64 / 1_000_000_000.0,
            floor_gb = self.floor_bytes as f64 / 1_000_000_000.0,
            "Remaining disk space below floor, removing all torrents"
        );

        let torrents = self.gateway.list_torrents().await?;
        let actions = plan(&torrents, free_bytes, self.floor_bytes);

        Ok(apply_actions(self.gateway.as_ref(), &actions, "disk space floor").await)
    }
}
