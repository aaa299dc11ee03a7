use std::fs;
use std::path::PathBuf;

use vge_core::{Snapshot, SnapshotError, SnapshotStore};

/// One snapshot per file.
pub struct FileStore {
    pub path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStore for FileStore {
    fn save(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        fs::write(&self.path, snapshot.encode())
            .map_err(|e| SnapshotError::Store(format!("{}: {}", self.path.display(), e)))
    }

    fn load(&mut self) -> Result<Snapshot, SnapshotError> {
        let bytes = fs::read(&self.path).map_err(|e| SnapshotError::Store(format!("{}: {}", self.path.display(), e)))?;
        Snapshot::decode(&bytes)
    }
}
