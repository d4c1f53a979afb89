use crate::core::error::DiskError;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

/// Free-space query for the filesystem holding the client's downloads
pub trait DiskProbe: Send + Sync {
    fn free_bytes(&self) -> Result<u64, DiskError>;
}

/// Probe backed by the host's mounted disks
pub struct SysinfoDisk {
    path: PathBuf,
}

impl SysinfoDisk {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DiskProbe for SysinfoDisk {
    fn free_bytes(&self) -> Result<u64, DiskError> {
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<(PathBuf, u64)> = disks
            .list()
            .iter()
            .map(|disk| (disk.mount_point().to_path_buf(), disk.available_space()))
            .collect();

        let path = self.path.canonicalize().unwrap_or_else(|_| self.path.clone());

        free_space_for(&mounts, &path).ok_or_else(|| DiskError::NoMountFor(self.path.clone()))
    }
}

/// Available bytes on the most specific mount containing `path`
pub fn free_space_for(mounts: &[(PathBuf, u64)], path: &Path) -> Option<u64> {
    mounts
        .iter()
        .filter(|(mount_point, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _)| mount_point.components().count())
        .map(|(_, available)| *available)
}
