//! Torrent policies evaluated by the scheduler.
//!
//! Each rule splits into a pure `plan` function over the freshly listed
//! torrents and an apply step that issues the planned actions one torrent at a
//! time. Rules hold no state between passes.

pub mod apply;
pub mod disk_floor;
pub mod filesize_cap;
pub mod seeder_cap;
pub mod transfer_budget;
pub mod upload_throttle;

use crate::core::error::PassError;
use async_trait::async_trait;
use serde::Serialize;

/// Outcome of one evaluation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Actions the rule decided on
    pub planned: usize,
    /// Actions the client accepted
    pub applied: usize,
    /// Actions the client rejected or that failed in transit
    pub failed: usize,
}

impl PassReport {
    pub fn idle() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one complete pass: read, plan, apply.
    ///
    /// An `Err` means the pass was abandoned before any action was planned.
    async fn evaluate(&self) -> Result<PassReport, PassError>;
}
