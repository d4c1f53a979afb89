use crate::api::gateway::ClientGateway;
use crate::core::error::PassError;
use crate::models::{action::Action, torrent::Torrent};
use crate::policy::{apply::apply_actions, PassReport, Rule};
use async_trait::async_trait;
use std::sync::Arc;

/// Cap the upload rate of every torrent that is not on a skip-listed tracker.
///
/// Torrents on strict-ratio trackers are left alone. Re-issuing the same
/// limit every pass is harmless.
pub fn plan(torrents: &[Torrent], skip_trackers: &[String], limit: u64) -> Vec<Action> {
    torrents
        .iter()
        .filter(|torrent| !torrent.uses_any_tracker(skip_trackers))
        .map(|torrent| Action::set_upload_limit(torrent, limit))
        .collect()
}

pub struct UploadThrottleRule {
    gateway: Arc<dyn ClientGateway>,
    skip_trackers: Vec<String>,
    limit: u64,
}

impl UploadThrottleRule {
    pub fn new(gateway: Arc<dyn ClientGateway>, skip_trackers: Vec<String>, limit: u64) -> Self {
        Self {
            gateway,
            skip_trackers,
            limit,
        }
    }
}

#[async_trait]
impl Rule for UploadThrottleRule {
    fn name(&self) -> &'static str {
        "trackers_upload_limit"
    }

    async fn evaluate(&self) -> Result<PassReport, PassError> {
        let torrents = self.gateway.list_torrents().await?;
        let actions = plan(&torrents, &self.skip_trackers, self.limit);

        Ok(apply_actions(self.gateway.as_ref(), &actions, "upload limit").await)
    }
}
