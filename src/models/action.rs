use crate::models::torrent::Torrent;
use std::fmt;

/// A mutation to issue against one torrent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SetUploadLimit { hash: String, name: String, limit: u64 },
    Pause { hash: String, name: String },
    Resume { hash: String, name: String },
    /// Reannounce (best-effort) then delete together with the files
    Delete { hash: String, name: String },
}

impl Action {
    pub fn set_upload_limit(torrent: &Torrent, limit: u64) -> Self {
        Action::SetUploadLimit {
            hash: torrent.hash.clone(),
            name: torrent.name.clone(),
            limit,
        }
    }

    pub fn pause(torrent: &Torrent) -> Self {
        Action::Pause {
            hash: torrent.hash.clone(),
            name: torrent.name.clone(),
        }
    }

    pub fn resume(torrent: &Torrent) -> Self {
        Action::Resume {
            hash: torrent.hash.clone(),
            name: torrent.name.clone(),
        }
    }

    pub fn delete(torrent: &Torrent) -> Self {
        Action::Delete {
            hash: torrent.hash.clone(),
            name: torrent.name.clone(),
        }
    }

    pub fn hash(&self) -> &str {
        match self {
            Action::SetUploadLimit { hash, .. }
            | Action::Pause { hash, .. }
            | Action::Resume { hash, .. }
            | Action::Delete { hash, .. } => hash,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Action::SetUploadLimit { name, .. }
            | Action::Pause { name, .. }
            | Action::Resume { name, .. }
            | Action::Delete { name, .. } => name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::SetUploadLimit { .. } => "set_upload_limit",
            Action::Pause { .. } => "pause",
            Action::Resume { .. } => "resume",
            Action::Delete { .. } => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetUploadLimit { limit, .. } => {
                write!(f, "set_upload_limit({}, {})", self.hash(), limit)
            }
            _ => write!(f, "{}({})", self.kind(), self.hash()),
        }
    }
}
