// Application state (AppState)

use crate::api::gateway::ClientGateway;
use crate::budget::tracker::BudgetTracker;
use crate::core::config::Config;
use crate::metrics::collector::Metrics;
use crate::utils::disk::DiskProbe;
use crate::utils::time::Clock;
use std::sync::Arc;

/// Shared application state
///
/// Handed to the rules at startup and to the status handlers.
#[derive(Clone)]
pub struct AppState {
    /// Torrent client control surface
    pub gateway: Arc<dyn ClientGateway>,

    /// Sole owner of the transfer budget window
    pub tracker: Arc<BudgetTracker>,

    /// Free-space probe for the download filesystem
    pub disk: Arc<dyn DiskProbe>,

    /// Per-job counters
    pub metrics: Arc<Metrics>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Config,
        gateway: Arc<dyn ClientGateway>,
        disk: Arc<dyn DiskProbe>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = Arc::new(BudgetTracker::new(
            Arc::clone(&gateway),
            clock,
            config.budget.hourly_limit_bytes,
        ));

        Self {
            gateway,
            tracker,
            disk,
            metrics: Arc::new(Metrics::new()),
            config: Arc::new(config),
        }
    }
}
