use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::state::AppState;
use crate::policy::{
    disk_floor::DiskFloorRule, filesize_cap::FilesizeCapRule, seeder_cap::SeederCapRule,
    transfer_budget::TransferBudgetRule, upload_throttle::UploadThrottleRule,
};
use crate::scheduler::jobs::{Job, Scheduler};

/// Check the client is reachable and take the first budget baseline.
///
/// Neither failure is fatal: the rules retry on their own cadence.
pub async fn probe_client(state: &AppState) {
    match state.gateway.list_torrents().await {
        Ok(torrents) => {
            info!(torrents = torrents.len(), "Torrent client reachable");
        }
        Err(e) => {
            warn!(error = %e, "Torrent client not reachable at startup, rules will retry");
        }
    }

    if let Err(e) = state.tracker.open_initial_window().await {
        warn!(
            error = %e,
            "Could not read transfer totals at startup, budget window opens on first successful check"
        );
    }
}

/// The five policy jobs with their configured cadences
pub fn build_jobs(state: &AppState) -> Vec<Job> {
    let config = &state.config;
    let gateway = &state.gateway;
    let every = Duration::from_secs;

    vec![
        Job::new(
            every(config.schedule.upload_throttle),
            Arc::new(UploadThrottleRule::new(
                Arc::clone(gateway),
                config.policy.skip_trackers.clone(),
                config.policy.upload_limit,
            )),
        ),
        Job::new(
            every(config.schedule.transfer_budget),
            Arc::new(TransferBudgetRule::new(
                Arc::clone(gateway),
                Arc::clone(&state.tracker),
            )),
        ),
        Job::new(
            every(config.schedule.seeder_cap),
            Arc::new(SeederCapRule::new(Arc::clone(gateway), config.policy.max_seeders)),
        ),
        Job::new(
            every(config.schedule.filesize_cap),
            Arc::new(FilesizeCapRule::new(
                Arc::clone(gateway),
                config.policy.max_filesize_bytes,
            )),
        ),
        Job::new(
            every(config.schedule.disk_floor),
            Arc::new(DiskFloorRule::new(
                Arc::clone(gateway),
                Arc::clone(&state.disk),
                config.policy.disk_floor_bytes(),
            )),
        ),
    ]
}

pub fn build_scheduler(state: &AppState) -> Scheduler {
    let mut scheduler = Scheduler::new(Arc::clone(&state.metrics));
    for job in build_jobs(state) {
        scheduler.add_job(job);
    }
    scheduler
}
