//! In-memory gateway that records every call, for tests.

use crate::api::gateway::ClientGateway;
use crate::core::error::GatewayError;
use crate::models::{torrent::Torrent, transfer::TransferTotals};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetUploadLimit(String, u64),
    Pause(String),
    Resume(String),
    Reannounce(String),
    Delete(String, bool),
}

/// Recording gateway backed by a torrent list.
///
/// Pause/resume flip the torrent state and delete removes it, so later passes
/// observe earlier mutations. Unknown hashes are accepted like the real client
/// does.
pub struct MockGateway {
    torrents: Mutex<Vec<Torrent>>,
    totals: Mutex<Result<TransferTotals, GatewayError>>,
    list_error: Mutex<Option<GatewayError>>,
    failing: Mutex<HashSet<(&'static str, String)>>,
    calls: Mutex<Vec<Call>>,
}

impl MockGateway {
    pub fn new(torrents: Vec<Torrent>) -> Self {
        Self {
            torrents: Mutex::new(torrents),
            totals: Mutex::new(Ok(TransferTotals::default())),
            list_error: Mutex::new(None),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_totals(&self, uploaded: u64, downloaded: u64) {
        *self.totals.lock().unwrap() = Ok(TransferTotals::new(uploaded, downloaded));
    }

    pub fn fail_totals(&self, err: GatewayError) {
        *self.totals.lock().unwrap() = Err(err);
    }

    pub fn fail_listing(&self, err: Option<GatewayError>) {
        *self.list_error.lock().unwrap() = err;
    }

    /// Make `action` fail for `hash`
    pub fn fail_action(&self, action: &'static str, hash: &str) {
        self.failing.lock().unwrap().insert((action, hash.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn torrents(&self) -> Vec<Torrent> {
        self.torrents.lock().unwrap().clone()
    }

    fn record(&self, action: &'static str, hash: &str, call: Call) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(call);

        if self.failing.lock().unwrap().contains(&(action, hash.to_string())) {
            return Err(GatewayError::ActionFailed {
                action,
                hash: hash.to_string(),
                reason: "HTTP 500 Internal Server Error".to_string(),
            });
        }
        Ok(())
    }

    fn set_state(&self, hash: &str, state: &str) {
        let mut torrents = self.torrents.lock().unwrap();
        if let Some(torrent) = torrents.iter_mut().find(|t| t.hash == hash) {
            torrent.state = state.to_string();
        }
    }
}

#[async_trait]
impl ClientGateway for MockGateway {
    async fn list_torrents(&self) -> Result<Vec<Torrent>, GatewayError> {
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.torrents())
    }

    async fn transfer_totals(&self) -> Result<TransferTotals, GatewayError> {
        self.totals.lock().unwrap().clone()
    }

    async fn set_upload_limit(&self, hash: &str, bytes_per_sec: u64) -> Result<(), GatewayError> {
        self.record(
            "set_upload_limit",
            hash,
            Call::SetUploadLimit(hash.to_string(), bytes_per_sec),
        )
    }

    async fn pause(&self, hash: &str) -> Result<(), GatewayError> {
        self.record("pause", hash, Call::Pause(hash.to_string()))?;
        self.set_state(hash, "pausedUP");
        Ok(())
    }

    async fn resume(&self, hash: &str) -> Result<(), GatewayError> {
        self.record("resume", hash, Call::Resume(hash.to_string()))?;
        self.set_state(hash, "uploading");
        Ok(())
    }

    async fn reannounce(&self, hash: &str) -> Result<(), GatewayError> {
        self.record("reannounce", hash, Call::Reannounce(hash.to_string()))
    }

    async fn delete(&self, hash: &str, purge_files: bool) -> Result<(), GatewayError> {
        self.record("delete", hash, Call::Delete(hash.to_string(), purge_files))?;
        self.torrents.lock().unwrap().retain(|t| t.hash != hash);
        Ok(())
    }
}

/// Torrent fixture with the fields the rules look at
pub fn torrent(hash: &str, size: u64, seeders: u32, magnet: &str) -> Torrent {
    Torrent {
        hash: hash.to_string(),
        name: format!("{}.mkv", hash),
        total_size_bytes: size,
        num_complete_peers: seeders,
        magnet_uri: magnet.to_string(),
        state: "uploading".to_string(),
    }
}
