use common::domain::{DomainError, DomainResult};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owns a temporary uploaded file and deletes it when dropped.
///
/// The file is removed on every exit path of a run, including ingestion and
/// persistence failures.
#[derive(Debug)]
pub struct UploadGuard {
    path: PathBuf,
}

impl UploadGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the upload as the byte stream to ingest
    pub fn open(&self) -> DomainResult<File> {
        File::open(&self.path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DomainError::UploadNotFound(self.path.display().to_string()),
            _ => DomainError::StreamReadError(format!("{}: {}", self.path.display(), e)),
        })
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove upload"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1700000000000-heart.csv");
        std::fs::write(&path, "u1,2024-01-01T08:00:00Z,72\n").unwrap();

        {
            let guard = UploadGuard::new(&path);
            let mut contents = String::new();
            guard.open().unwrap().read_to_string(&mut contents).unwrap();
            assert!(contents.starts_with("u1,"));
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_missing_upload() {
        let dir = tempfile::tempdir().unwrap();
        let guard = UploadGuard::new(dir.path().join("missing.csv"));

        assert!(matches!(guard.open(), Err(DomainError::UploadNotFound(_))));
        // dropping a guard for a missing file is quiet
        drop(guard);
    }
}
