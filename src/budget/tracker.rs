use crate::api::gateway::ClientGateway;
use crate::budget::window::BudgetWindow;
use crate::core::error::GatewayError;
use crate::models::transfer::TransferTotals;
use crate::policy::{apply::apply_actions, transfer_budget::plan_resume};
use crate::utils::time::{duration_until_next_hour, Clock};
use chrono::{NaiveDateTime, TimeDelta, Timelike};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetState {
    Accumulating,
    /// Waiting for the hour boundary; lasts until the next window opens
    RollingOver,
    /// Budget breached in the current window
    Exhausted,
}

/// Result of one `record_and_check` call, with the bytes used so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetCheck {
    WithinBudget(TransferTotals),
    Exhausted(TransferTotals),
}

/// Read-only copy of the tracker state, published after every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetStatus {
    pub state: BudgetState,
    pub window_started_at: Option<NaiveDateTime>,
    pub window_hour: Option<u32>,
    pub used: TransferTotals,
    pub limit_bytes: u64,
    pub rollovers: u64,
}

struct TrackerInner {
    window: Option<BudgetWindow>,
    state: BudgetState,
    used: TransferTotals,
    rollovers: u64,
}

/// Hour-aligned transfer budget.
///
/// Owns the current [`BudgetWindow`]. Every access goes through
/// [`BudgetTracker::record_and_check`], which holds the lock for the whole
/// call, so a rollover wait is never entered twice.
pub struct BudgetTracker {
    gateway: Arc<dyn ClientGateway>,
    clock: Arc<dyn Clock>,
    limit_bytes: u64,
    inner: Mutex<TrackerInner>,
    status: watch::Sender<BudgetStatus>,
}

impl BudgetTracker {
    pub fn new(gateway: Arc<dyn ClientGateway>, clock: Arc<dyn Clock>, limit_bytes: u64) -> Self {
        let inner = TrackerInner {
            window: None,
            state: BudgetState::Accumulating,
            used: TransferTotals::default(),
            rollovers: 0,
        };
        let (status, _) = watch::channel(Self::status_of(&inner, limit_bytes));

        Self {
            gateway,
            clock,
            limit_bytes,
            inner: Mutex::new(inner),
            status,
        }
    }

    /// Take the process-start baseline.
    ///
    /// When the client is down the window opens at the first successful
    /// totals fetch instead.
    pub async fn open_initial_window(&self) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        let totals = self.gateway.transfer_totals().await?;

        let window = BudgetWindow::open(self.clock.now(), totals);
        info!(
            hour = window.hour(),
            uploaded_baseline = totals.uploaded_bytes,
            downloaded_baseline = totals.downloaded_bytes,
            "Opened transfer budget window"
        );
        inner.window = Some(window);
        self.publish(&inner);

        Ok(())
    }

    pub fn status(&self) -> BudgetStatus {
        self.status.borrow().clone()
    }

    /// Roll over if the clock hour moved on, then measure the current window.
    ///
    /// A failed totals fetch leaves the state untouched and is never treated
    /// as exhaustion.
    pub async fn record_and_check(&self) -> Result<BudgetCheck, GatewayError> {
        let mut inner = self.inner.lock().await;

        if let Some(window) = inner.window {
            if !window.is_current(self.clock.now()) {
                self.roll_over(&mut inner).await;
            }
        }

        let totals = self.gateway.transfer_totals().await?;

        let window = match inner.window {
            Some(window) => window,
            None => {
                let window = BudgetWindow::open(self.clock.now(), totals);
                info!(
                    hour = window.hour(),
                    uploaded_baseline = totals.uploaded_bytes,
                    downloaded_baseline = totals.downloaded_bytes,
                    "Opened transfer budget window"
                );
                inner.window = Some(window);
                window
            }
        };

        let used = match window.usage(&totals) {
            Some(used) => used,
            None => {
                warn!(
                    uploaded = totals.uploaded_bytes,
                    downloaded = totals.downloaded_bytes,
                    uploaded_baseline = window.baseline().uploaded_bytes,
                    downloaded_baseline = window.baseline().downloaded_bytes,
                    "Client transfer counters went backwards, re-baselining budget window"
                );
                inner.window = Some(window.rebaselined(totals));
                TransferTotals::default()
            }
        };
        inner.used = used;

        let check = if used.reaches(self.limit_bytes) {
            if inner.state != BudgetState::Exhausted {
                warn!(
                    uploaded = used.uploaded_bytes,
                    downloaded = used.downloaded_bytes,
                    limit_bytes = self.limit_bytes,
                    "Hourly transfer budget exhausted"
                );
            }
            inner.state = BudgetState::Exhausted;
            BudgetCheck::Exhausted(used)
        } else {
            inner.state = BudgetState::Accumulating;
            BudgetCheck::WithinBudget(used)
        };

        self.publish(&inner);
        Ok(check)
    }

    /// Wait for the next hour boundary, resume paused torrents, and open a
    /// fresh window baselined on the client's totals at that instant.
    async fn roll_over(&self, inner: &mut TrackerInner) {
        inner.state = BudgetState::RollingOver;
        self.publish(inner);

        let detected_at = self.clock.now();
        let wait = duration_until_next_hour(detected_at);
        let boundary = detected_at + TimeDelta::from_std(wait).unwrap_or(TimeDelta::zero());
        info!(
            wait_seconds = wait.as_secs(),
            previous_hour = inner.window.map(|w| w.hour()),
            "Clock hour changed, waiting for the next hour boundary"
        );
        tokio::time::sleep(wait).await;

        match self.gateway.list_torrents().await {
            Ok(torrents) => {
                let actions = plan_resume(&torrents);
                let report = apply_actions(self.gateway.as_ref(), &actions, "new budget window").await;
                info!(
                    resumed = report.applied,
                    failed = report.failed,
                    "Resumed paused torrents at the start of a new hour"
                );
            }
            Err(e) => {
                warn!(error = %e, "Failed to list torrents to resume at the start of a new hour");
            }
        }

        // The wall clock may lag the timer that ended the wait
        let now = self.clock.now().max(boundary);
        inner.window = match self.gateway.transfer_totals().await {
            Ok(baseline) => {
                info!(
                    hour = now.hour(),
                    uploaded_baseline = baseline.uploaded_bytes,
                    downloaded_baseline = baseline.downloaded_bytes,
                    "Opened transfer budget window"
                );
                Some(BudgetWindow::open(now, baseline))
            }
            Err(e) => {
                warn!(error = %e, "Could not baseline new budget window, deferring to next check");
                None
            }
        };
        inner.used = TransferTotals::default();
        inner.state = BudgetState::Accumulating;
        inner.rollovers += 1;
        self.publish(inner);
    }

    fn status_of(inner: &TrackerInner, limit_bytes: u64) -> BudgetStatus {
        BudgetStatus {
            state: inner.state,
            window_started_at: inner.window.map(|w| w.started_at()),
            window_hour: inner.window.map(|w| w.hour()),
            used: inner.used,
            limit_bytes,
            rollovers: inner.rollovers,
        }
    }

    fn publish(&self, inner: &TrackerInner) {
        self.status.send_replace(Self::status_of(inner, self.limit_bytes));
    }
}
