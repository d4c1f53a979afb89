use crate::core::error::PassError;
use crate::metrics::collector::Metrics;
use crate::policy::Rule;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// A rule and the cadence it runs at
pub struct Job {
    pub name: &'static str,
    pub every: Duration,
    pub rule: Arc<dyn Rule>,
}

impl Job {
    pub fn new(every: Duration, rule: Arc<dyn Rule>) -> Self {
        Self {
            name: rule.name(),
            every,
            rule,
        }
    }
}

/// Runs every job on its own task.
///
/// A job never overlaps itself: the next tick is awaited only after the
/// previous pass returned, and ticks missed meanwhile are skipped. Jobs do not
/// wait on each other, so a long budget rollover never delays other rules.
pub struct Scheduler {
    pending: Vec<Job>,
    metrics: Arc<Metrics>,
    shutdown: watch::Sender<bool>,
    fault: Arc<Notify>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            pending: Vec::new(),
            metrics,
            shutdown,
            fault: Arc::new(Notify::new()),
            handles: Vec::new(),
        }
    }

    pub fn add_job(&mut self, job: Job) {
        self.metrics.register(job.name);
        self.pending.push(job);
    }

    /// Spawn every added job. The first pass of each job runs one cadence
    /// after start.
    pub fn start(&mut self) {
        for job in self.pending.drain(..) {
            info!(
                job = job.name,
                every_seconds = job.every.as_secs_f64(),
                "Scheduling job"
            );
            let handle = tokio::spawn(run_job(
                job,
                Arc::clone(&self.metrics),
                self.shutdown.subscribe(),
                Arc::clone(&self.fault),
            ));
            self.handles.push(handle);
        }
    }

    /// Resolves once a pass panicked
    pub async fn faulted(&self) {
        self.fault.notified().await;
    }

    /// Stop issuing passes and wait for in-flight ones to finish.
    ///
    /// In-flight passes are not cancelled, including a rollover wait.
    pub async fn shutdown(self) {
        self.shutdown.send_replace(true);
        info!(jobs = self.handles.len(), "Scheduler stopping, waiting for in-flight passes");

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Job task ended abnormally");
            }
        }

        info!("Scheduler stopped");
    }
}

async fn run_job(
    job: Job,
    metrics: Arc<Metrics>,
    mut shutdown: watch::Receiver<bool>,
    fault: Arc<Notify>,
) {
    let mut interval = interval_at(Instant::now() + job.every, job.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = interval.tick() => {}
        }

        // Run the pass on its own task so a panic is caught and reported
        let rule = Arc::clone(&job.rule);
        let pass = tokio::spawn(async move { rule.evaluate().await });

        match pass.await {
            Ok(Ok(report)) => {
                metrics.record_pass(job.name, &report);
                debug!(
                    job = job.name,
                    planned = report.planned,
                    applied = report.applied,
                    failed = report.failed,
                    "Pass completed"
                );
            }
            Ok(Err(PassError::Gateway(e))) if e.abandons_pass() => {
                metrics.record_abandoned(job.name);
                warn!(job = job.name, error = %e, "Pass abandoned for this tick");
            }
            Ok(Err(e)) => {
                metrics.record_abandoned(job.name);
                error!(job = job.name, error = %e, "Pass failed before planning");
            }
            Err(e) => {
                metrics.record_panic(job.name);
                error!(job = job.name, error = %e, "Pass panicked, requesting shutdown");
                fault.notify_one();
                break;
            }
        }
    }

    debug!(job = job.name, "Job stopped");
}
