use crate::core::error::GatewayError;
use crate::models::{torrent::Torrent, transfer::TransferTotals};
use async_trait::async_trait;

/// Remote control surface of the torrent client.
///
/// Mutating calls must tolerate hashes the client no longer knows: rules race
/// with each other and a torrent may disappear between read and act.
#[async_trait]
pub trait ClientGateway: Send + Sync {
    async fn list_torrents(&self) -> Result<Vec<Torrent>, GatewayError>;

    async fn transfer_totals(&self) -> Result<TransferTotals, GatewayError>;

    async fn set_upload_limit(&self, hash: &str, bytes_per_sec: u64) -> Result<(), GatewayError>;

    async fn pause(&self, hash: &str) -> Result<(), GatewayError>;

    async fn resume(&self, hash: &str) -> Result<(), GatewayError>;

    async fn reannounce(&self, hash: &str) -> Result<(), GatewayError>;

    async fn delete(&self, hash: &str, purge_files: bool) -> Result<(), GatewayError>;
}
