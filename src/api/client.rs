use crate::api::gateway::ClientGateway;
use crate::core::config::ClientConfig;
use crate::core::error::GatewayError;
use crate::models::{torrent::Torrent, transfer::TransferTotals};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// qBittorrent Web API v2 client
pub struct QbClient {
    client: reqwest::Client,
    base_url: String,
    credentials: Option<(String, String)>,
}

/// Torrent entry from `/api/v2/torrents/info`
#[derive(Debug, Deserialize)]
pub struct ApiTorrent {
    pub hash: String,
    pub name: String,
    #[serde(default)]
    pub total_size: i64, // -1 until metadata is known
    #[serde(default)]
    pub num_complete: i64,
    #[serde(default)]
    pub magnet_uri: String,
    #[serde(default)]
    pub state: String,
}

/// Payload of `/api/v2/transfer/info`
#[derive(Debug, Deserialize)]
pub struct ApiTransferInfo {
    #[serde(default)]
    pub up_info_data: Option<u64>,
    #[serde(default)]
    pub dl_info_data: Option<u64>,
}

impl From<ApiTorrent> for Torrent {
    fn from(api: ApiTorrent) -> Self {
        Torrent {
            hash: api.hash,
            name: api.name,
            total_size_bytes: api.total_size.max(0) as u64,
            num_complete_peers: api.num_complete.clamp(0, u32::MAX as i64) as u32,
            magnet_uri: api.magnet_uri,
            state: api.state,
        }
    }
}

impl ApiTransferInfo {
    pub fn into_totals(self) -> Result<TransferTotals, GatewayError> {
        let uploaded = self
            .up_info_data
            .ok_or_else(|| GatewayError::MalformedResponse("up_info_data missing".to_string()))?;
        let downloaded = self
            .dl_info_data
            .ok_or_else(|| GatewayError::MalformedResponse("dl_info_data missing".to_string()))?;

        Ok(TransferTotals::new(uploaded, downloaded))
    }
}

impl QbClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        let credentials = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, path)
    }

    /// Open a WebUI session when credentials are configured.
    ///
    /// The session cookie is kept by the client's cookie store.
    pub async fn login(&self) -> Result<(), GatewayError> {
        let Some((username, password)) = &self.credentials else {
            debug!("No credentials configured, skipping login");
            return Ok(());
        };

        let response = self
            .client
            .post(self.url("auth/login"))
            .header(reqwest::header::REFERER, &self.base_url)
            .form(&[("username", username.as_str()), ("password", password.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::LoginRejected(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        if body.trim() != "Ok." {
            return Err(GatewayError::LoginRejected(body.trim().to_string()));
        }

        info!(base_url = %self.base_url, username = %username, "Logged in to torrent client");
        Ok(())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, GatewayError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Unavailable(format!("{} returned HTTP {}", path, status)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::MalformedResponse(format!("{}: {}", path, e)))
    }

    /// POST a form to the first endpoint the client knows.
    ///
    /// qBittorrent 5.x renamed pause/resume to stop/start, so a 404 moves on
    /// to the next candidate endpoint.
    async fn post_action(
        &self,
        action: &'static str,
        endpoints: &[&str],
        form: &[(&str, &str)],
    ) -> Result<(), GatewayError> {
        let hash = form
            .iter()
            .find(|(key, _)| *key == "hashes")
            .map(|(_, value)| value.to_string())
            .unwrap_or_default();

        let mut last_status = None;

        for endpoint in endpoints {
            let response = self
                .client
                .post(self.url(endpoint))
                .form(form)
                .send()
                .await
                .map_err(|e| GatewayError::ActionFailed {
                    action,
                    hash: hash.clone(),
                    reason: e.to_string(),
                })?;

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            last_status = Some(status);
            if status != StatusCode::NOT_FOUND {
                break;
            }

            debug!(endpoint = %endpoint, action = action, "Endpoint not found, trying fallback");
        }

        Err(GatewayError::ActionFailed {
            action,
            hash,
            reason: match last_status {
                Some(status) => format!("HTTP {}", status),
                None => "no endpoint available".to_string(),
            },
        })
    }
}

#[async_trait]
impl ClientGateway for QbClient {
    async fn list_torrents(&self) -> Result<Vec<Torrent>, GatewayError> {
        let torrents: Vec<ApiTorrent> = self.get_json("torrents/info").await?;
        Ok(torrents.into_iter().map(Torrent::from).collect())
    }

    async fn transfer_totals(&self) -> Result<TransferTotals, GatewayError> {
        let info: ApiTransferInfo = self.get_json("transfer/info").await?;
        info.into_totals()
    }

    async fn set_upload_limit(&self, hash: &str, bytes_per_sec: u64) -> Result<(), GatewayError> {
        let limit = bytes_per_sec.to_string();
        self.post_action(
            "set_upload_limit",
            &["torrents/setUploadLimit"],
            &[("hashes", hash), ("limit", limit.as_str())],
        )
        .await
    }

    async fn pause(&self, hash: &str) -> Result<(), GatewayError> {
        self.post_action("pause", &["torrents/pause", "torrents/stop"], &[("hashes", hash)])
            .await
    }

    async fn resume(&self, hash: &str) -> Result<(), GatewayError> {
        self.post_action("resume", &["torrents/resume", "torrents/start"], &[("hashes", hash)])
            .await
    }

    async fn reannounce(&self, hash: &str) -> Result<(), GatewayError> {
        self.post_action("reannounce", &["torrents/reannounce"], &[("hashes", hash)])
            .await
    }

    async fn delete(&self, hash: &str, purge_files: bool) -> Result<(), GatewayError> {
        let delete_files = if purge_files { "true" } else { "false" };
        self.post_action(
            "delete",
            &["torrents/delete"],
            &[("hashes", hash), ("deleteFiles", delete_files)],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_trims_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://localhost:9000/".to_string(),
            ..ClientConfig::default()
        };

        let client = QbClient::new(&config).expect("Failed to create client");
        assert_eq!(client.url("torrents/info"), "http://localhost:9000/api/v2/torrents/info");
    }

    #[test]
    fn test_torrent_deserialization() {
        let json = r#"[{
            "hash": "8c212779b4abde7c6bc608063a0d008b7e40ce32",
            "name": "ubuntu-24.04-desktop-amd64.iso",
            "total_size": 6114656256,
            "num_complete": 42,
            "magnet_uri": "magnet:?xt=urn:btih:8c21&tr=udp%3A%2F%2Ftracker.opentrackr.org%3A1337",
            "state": "stalledUP",
            "ratio": 1.5
        }]"#;

        let api: Vec<ApiTorrent> = serde_json::from_str(json).unwrap();
        let torrents: Vec<Torrent> = api.into_iter().map(Torrent::from).collect();

        assert_eq!(torrents.len(), 1);
        assert_eq!(torrents[0].hash, "8c212779b4abde7c6bc608063a0d008b7e40ce32");
        assert_eq!(torrents[0].total_size_bytes, 6_114_656_256);
        assert_eq!(torrents[0].num_complete_peers, 42);
        assert_eq!(torrents[0].state, "stalledUP");
    }

    #[test]
    fn test_unknown_metadata_is_clamped() {
        let json = r#"{"hash": "aa", "name": "pending", "total_size": -1, "num_complete": -1}"#;

        let torrent = Torrent::from(serde_json::from_str::<ApiTorrent>(json).unwrap());

        assert_eq!(torrent.total_size_bytes, 0);
        assert_eq!(torrent.num_complete_peers, 0);
        assert!(torrent.magnet_uri.is_empty());
    }

    #[test]
    fn test_transfer_info_into_totals() {
        let json = r#"{"up_info_data": 460000000000, "dl_info_data": 10000000000, "connection_status": "connected"}"#;

        let info: ApiTransferInfo = serde_json::from_str(json).unwrap();
        let totals = info.into_totals().unwrap();

        assert_eq!(totals, TransferTotals::new(460_000_000_000, 10_000_000_000));
    }

    #[test]
    fn test_transfer_info_missing_field_is_malformed() {
        let info: ApiTransferInfo = serde_json::from_str(r#"{"up_info_data": 1}"#).unwrap();

        let err = info.into_totals().unwrap_err();
        assert_eq!(err, GatewayError::MalformedResponse("dl_info_data missing".to_string()));
        assert!(err.abandons_pass());
    }

    #[tokio::test]
    async fn test_unreachable_client_is_unavailable() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: 2,
            ..ClientConfig::default()
        };
        let client = QbClient::new(&config).unwrap();

        let err = client.list_torrents().await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unreachable_client_action_fails_per_torrent() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            request_timeout: 2,
            ..ClientConfig::default()
        };
        let client = QbClient::new(&config).unwrap();

        let err = client.pause("abc").await.unwrap_err();
        match err {
            GatewayError::ActionFailed { action, hash, .. } => {
                assert_eq!(action, "pause");
                assert_eq!(hash, "abc");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
