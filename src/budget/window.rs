use crate::models::transfer::TransferTotals;
use chrono::{NaiveDateTime, Timelike};

/// One hour-aligned accounting period.
///
/// Windows are values: a rollover (or a client counter reset) produces a new
/// window instead of editing the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetWindow {
    started_at: NaiveDateTime,
    hour: u32,
    baseline: TransferTotals,
}

impl BudgetWindow {
    pub fn open(now: NaiveDateTime, baseline: TransferTotals) -> Self {
        Self {
            started_at: now,
            hour: now.hour(),
            baseline,
        }
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn baseline(&self) -> TransferTotals {
        self.baseline
    }

    /// Whether `now` still falls in this window's clock hour.
    ///
    /// A clock reading earlier than the window start has not reached the
    /// next hour yet, so it still belongs to this window.
    pub fn is_current(&self, now: NaiveDateTime) -> bool {
        now.hour() == self.hour || now < self.started_at
    }

    /// Bytes moved since the window opened; `None` after a counter reset
    pub fn usage(&self, totals: &TransferTotals) -> Option<TransferTotals> {
        totals.since(&self.baseline)
    }

    /// Same window, counted from a new baseline
    pub fn rebaselined(&self, baseline: TransferTotals) -> Self {
        Self { baseline, ..*self }
    }
}
