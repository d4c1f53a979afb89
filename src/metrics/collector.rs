use crate::policy::PassReport;
use crate::utils::time::current_timestamp;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
struct JobCounters {
    passes: AtomicU64,
    abandoned: AtomicU64,
    actions_applied: AtomicU64,
    actions_failed: AtomicU64,
    panics: AtomicU64,
}

/// Per-job counters shared by the scheduler tasks
pub struct Metrics {
    jobs: DashMap<&'static str, JobCounters>,
    pub start_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub name: String,
    pub passes: u64,
    pub abandoned: u64,
    pub actions_applied: u64,
    pub actions_failed: u64,
    pub panics: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub uptime_seconds: i64,
    pub jobs: Vec<JobSnapshot>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            jobs: DashMap::new(),
            start_time: current_timestamp(),
        }
    }

    /// Make the job visible in snapshots before its first pass
    pub fn register(&self, job: &'static str) {
        self.jobs.entry(job).or_default();
    }

    pub fn record_pass(&self, job: &'static str, report: &PassReport) {
        let counters = self.jobs.entry(job).or_default();
        counters.passes.fetch_add(1, Ordering::Relaxed);
        counters
            .actions_applied
            .fetch_add(report.applied as u64, Ordering::Relaxed);
        counters
            .actions_failed
            .fetch_add(report.failed as u64, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self, job: &'static str) {
        let counters = self.jobs.entry(job).or_default();
        counters.passes.fetch_add(1, Ordering::Relaxed);
        counters.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self, job: &'static str) {
        let counters = self.jobs.entry(job).or_default();
        counters.panics.fetch_add(1, Ordering::Relaxed);
    }

    /// Jobs sorted by name
    pub fn get_snapshot(&self) -> MetricsSnapshot {
        let mut jobs: Vec<JobSnapshot> = self
            .jobs
            .iter()
            .map(|entry| {
                let counters = entry.value();
                JobSnapshot {
                    name: entry.key().to_string(),
                    passes: counters.passes.load(Ordering::Relaxed),
                    abandoned: counters.abandoned.load(Ordering::Relaxed),
                    actions_applied: counters.actions_applied.load(Ordering::Relaxed),
                    actions_failed: counters.actions_failed.load(Ordering::Relaxed),
                    panics: counters.panics.load(Ordering::Relaxed),
                }
            })
            .collect();
        jobs.sort_by(|a, b| a.name.cmp(&b.name));

        MetricsSnapshot {
            uptime_seconds: current_timestamp() - self.start_time,
            jobs,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
