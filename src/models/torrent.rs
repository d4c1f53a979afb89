use serde::Serialize;

/// Snapshot of one torrent as reported by the client.
///
/// Never cached across passes; the client is the source of truth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Torrent {
    /// Info hash, opaque to the warden
    pub hash: String,
    /// Display name
    pub name: String,
    /// Total size of the selected files in bytes
    pub total_size_bytes: u64,
    /// Seeders in the swarm (peers holding the complete file set)
    pub num_complete_peers: u32,
    /// Magnet link, including its tracker list
    pub magnet_uri: String,
    /// Client state string (e.g. `uploading`, `pausedUP`, `stoppedDL`)
    pub state: String,
}

impl Torrent {
    pub fn new(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: name.into(),
            total_size_bytes: 0,
            num_complete_peers: 0,
            magnet_uri: String::new(),
            state: String::new(),
        }
    }

    /// Paused (4.x) and stopped (5.x) torrents
    pub fn is_paused(&self) -> bool {
        self.state.starts_with("paused") || self.state.starts_with("stopped")
    }

    /// Whether the magnet link mentions any of the given trackers
    pub fn uses_any_tracker<S: AsRef<str>>(&self, trackers: &[S]) -> bool {
        trackers
            .iter()
            .any(|tracker| self.magnet_uri.contains(tracker.as_ref()))
    }

    /// Size in decimal gigabytes, for log output
    pub fn size_gb(&self) -> f64 {
        self.total_size_bytes as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_paused() {
        let mut torrent = Torrent::new("aa", "ubuntu.iso");
        for state in ["pausedUP", "pausedDL", "stoppedUP", "stoppedDL"] {
            torrent.state = state.to_string();
            assert!(torrent.is_paused(), "{} should count as paused", state);
        }
        for state in ["uploading", "stalledUP", "downloading", "queuedDL", ""] {
            torrent.state = state.to_string();
            assert!(!torrent.is_paused(), "{} should not count as paused", state);
        }
    }

    #[test]
    fn test_uses_any_tracker() {
        let mut torrent = Torrent::new("aa", "ubuntu.iso");
        torrent.magnet_uri =
            "magnet:?xt=urn:btih:aa&tr=https%3A%2F%2Ftracker.pterclub.com%2Fannounce".to_string();

        assert!(torrent.uses_any_tracker(&["tracker.pterclub.com"]));
        assert!(!torrent.uses_any_tracker(&["tracker.example.org"]));
        assert!(!torrent.uses_any_tracker::<&str>(&[]));
    }

    #[test]
    fn test_size_gb() {
        let mut torrent = Torrent::new("aa", "ubuntu.iso");
        torrent.total_size_bytes = 2_500_000_000;
        assert!((torrent.size_gb() - 2.5).abs() < f64::EPSILON);
    }
}
