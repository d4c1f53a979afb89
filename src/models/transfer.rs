use serde::Serialize;

/// Session-wide byte counters reported by the client
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransferTotals {
    pub uploaded_bytes: u64,
    pub downloaded_bytes: u64,
}

impl TransferTotals {
    pub fn new(uploaded_bytes: u64, downloaded_bytes: u64) -> Self {
        Self {
            uploaded_bytes,
            downloaded_bytes,
        }
    }

    /// Bytes moved since `baseline`, or `None` when either counter went
    /// backwards (the client restarted and its session counters reset).
    pub fn since(&self, baseline: &TransferTotals) -> Option<TransferTotals> {
        Some(TransferTotals {
            uploaded_bytes: self.uploaded_bytes.checked_sub(baseline.uploaded_bytes)?,
            downloaded_bytes: self.downloaded_bytes.checked_sub(baseline.downloaded_bytes)?,
        })
    }

    /// True when either direction reached `limit`
    pub fn reaches(&self, limit: u64) -> bool {
        self.uploaded_bytes >= limit || self.downloaded_bytes >= limit
    }
}
