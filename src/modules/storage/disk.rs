//! Local-disk blob store
//!
//! Blobs live in a single flat directory, created once at startup. On-disk
//! names are generated UUIDs so two uploads can never collide regardless of
//! the client-supplied filename; the original name is metadata only and never
//! touches the filesystem.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tracing::debug;
use uuid::Uuid;

/// Blob store over a process-local directory
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    /// Open the store, creating the directory if absent.
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a collision-free on-disk name for a new blob.
    pub fn generate_blob_name(original_filename: &str) -> String {
        let extension = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("pdf");
        format!("{}.{}", Uuid::new_v4(), extension)
    }

    /// Write a blob and return its path (relative to the store's root parent,
    /// i.e. the value persisted as `filepath`).
    pub async fn write(&self, blob_name: &str, data: &[u8]) -> io::Result<String> {
        let path = self.root.join(blob_name);
        tokio::fs::write(&path, data).await?;
        debug!("Blob written: {}", path.display());
        Ok(path.to_string_lossy().into_owned())
    }

    /// Open a stored blob for reading, returning the file handle and its size.
    pub async fn open(&self, filepath: &str) -> io::Result<(File, u64)> {
        let file = File::open(filepath).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Remove a blob, tolerating one that is already gone.
    ///
    /// Returns `true` if a file was actually removed.
    pub async fn remove(&self, filepath: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(filepath).await {
            Ok(()) => {
                debug!("Blob removed: {}", filepath);
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_open_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path()).await.unwrap();

        let name = DiskStorage::generate_blob_name("report.pdf");
        let path = storage.write(&name, b"%PDF-1.4 test").await.unwrap();

        let (_, len) = storage.open(&path).await.unwrap();
        assert_eq!(len, 13);
    }

    #[tokio::test]
    async fn generated_names_are_unique_and_keep_extension() {
        let a = DiskStorage::generate_blob_name("report.pdf");
        let b = DiskStorage::generate_blob_name("report.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with(".pdf"));
        assert!(b.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn name_without_extension_defaults_to_pdf() {
        let name = DiskStorage::generate_blob_name("report");
        assert!(name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn remove_tolerates_missing_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskStorage::new(dir.path()).await.unwrap();

        let name = DiskStorage::generate_blob_name("a.pdf");
        let path = storage.write(&name, b"data").await.unwrap();

        assert!(storage.remove(&path).await.unwrap());
        assert!(!storage.remove(&path).await.unwrap());
    }

    #[tokio::test]
    async fn new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("blobs");
        assert!(!nested.exists());

        let storage = DiskStorage::new(&nested).await.unwrap();
        assert!(storage.root().is_dir());
    }
}
