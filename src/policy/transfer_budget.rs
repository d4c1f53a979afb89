use crate::api::gateway::ClientGateway;
use crate::budget::tracker::{BudgetCheck, BudgetTracker};
use crate::core::error::PassError;
use crate::models::{action::Action, torrent::Torrent};
use crate::policy::{apply::apply_actions, PassReport, Rule};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Pause every listed torrent. Pausing keeps the torrent so it can be
/// resumed when the next window opens.
pub fn plan_pause(torrents: &[Torrent]) -> Vec<Action> {
    torrents.iter().map(Action::pause).collect()
}

/// Resume the torrents the client reports as paused
pub fn plan_resume(torrents: &[Torrent]) -> Vec<Action> {
    torrents
        .iter()
        .filter(|torrent| torrent.is_paused())
        .map(Action::resume)
        .collect()
}

/// Enforces the hourly transfer budget through the shared tracker.
///
/// While the budget stays exhausted each pass pauses again, which also
/// catches torrents added or resumed by hand.
pub struct TransferBudgetRule {
    gateway: Arc<dyn ClientGateway>,
    tracker: Arc<BudgetTracker>,
}

impl TransferBudgetRule {
    pub fn new(gateway: Arc<dyn ClientGateway>, tracker: Arc<BudgetTracker>) -> Self {
        Self { gateway, tracker }
    }
}

#[async_trait]
impl Rule for TransferBudgetRule {
    fn name(&self) -> &'static str {
        "enforce_data_limits"
    }

    async fn evaluate(&self) -> Result<PassReport, PassError> {
        match self.tracker.record_and_check().await? {
            BudgetCheck::WithinBudget(used) => {
                debug!(
                    uploaded = used.uploaded_bytes,
                    downloaded = used.downloaded_bytes,
                    "Transfer budget within limits"
                );
                Ok(PassReport::idle())
            }
            BudgetCheck::Exhausted(_) => {
                let torrents = self.gateway.list_torrents().await?;
                let actions = plan_pause(&torrents);

                Ok(apply_actions(self.gateway.as_ref(), &actions, "transfer budget").await)
            }
        }
    }
}
