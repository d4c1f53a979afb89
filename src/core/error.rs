// Centralized error handling for the warden

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the torrent client gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network or HTTP failure on a read; the pass is abandoned for this tick
    #[error("Torrent client unavailable: {0}")]
    Unavailable(String),

    /// Expected fields were absent from a client payload
    #[error("Malformed response from torrent client: {0}")]
    MalformedResponse(String),

    /// A mutating call failed for a single torrent
    #[error("{action} failed for torrent {hash}: {reason}")]
    ActionFailed {
        action: &'static str,
        hash: String,
        reason: String,
    },

    #[error("Login rejected by torrent client: {0}")]
    LoginRejected(String),
}

impl GatewayError {
    /// Read failures that abandon the current pass.
    ///
    /// Missing fields and transport errors are handled the same way.
    pub fn abandons_pass(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable(_) | GatewayError::MalformedResponse(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("No mounted filesystem contains {0}")]
    NoMountFor(PathBuf),

    #[error("Disk probe task failed: {0}")]
    ProbeFailed(String),
}

/// Why a scheduled pass ended without evaluating its rule
#[derive(Error, Debug)]
pub enum PassError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Disk(#[from] DiskError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_failures_abandon_pass() {
        assert!(GatewayError::Unavailable("timeout".into()).abandons_pass());
        assert!(GatewayError::MalformedResponse("up_info_data".into()).abandons_pass());
    }

    #[test]
    fn test_action_failure_does_not_abandon_pass() {
        let err = GatewayError::ActionFailed {
            action: "pause",
            hash: "abc".into(),
            reason: "HTTP 500".into(),
        };
        assert!(!err.abandons_pass());
        assert_eq!(err.to_string(), "pause failed for torrent abc: HTTP 500");
    }

    #[test]
    fn test_pass_error_is_transparent() {
        let err: PassError = GatewayError::Unavailable("connection refused".into()).into();
        assert_eq!(err.to_string(), "Torrent client unavailable: connection refused");
    }
}
