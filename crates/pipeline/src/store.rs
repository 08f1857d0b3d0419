//! Filesystem store for template and output image bytes.
//!
//! All addresses are paths relative to a single configured root
//! (`STORAGE_ROOT`). Output bytes live at `jobs/{job_id}/{product_id}.png`;
//! writes are plain overwrites so reruns of a job are idempotent.

use std::path::{Component, Path, PathBuf};

use feedframe_core::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Path escapes the storage root: {0}")]
    InvalidPath(String),

    #[error("Storage IO failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte store rooted at a directory. Cheap to clone; every handle
/// shares the same root.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` at `rel_path`, creating parent directories and
    /// overwriting any existing file.
    pub async fn put(&self, rel_path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(rel_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    /// Read the bytes at `rel_path`.
    pub async fn read(&self, rel_path: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(rel_path)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Remove the file at `rel_path`. Removing a path that is already
    /// gone succeeds; the anomaly is logged, not raised.
    pub async fn remove(&self, rel_path: &str) -> Result<(), StoreError> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(rel_path, "Removing already-absent stored file");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a whole directory subtree (e.g. one job's outputs).
    /// Idempotent like [`remove`](Self::remove).
    pub async fn remove_dir(&self, rel_path: &str) -> Result<(), StoreError> {
        let path = self.resolve(rel_path)?;
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(rel_path, "Removing already-absent stored directory");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Join `rel_path` onto the root, rejecting absolute paths and any
    /// `..` component.
    fn resolve(&self, rel_path: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(rel_path);
        let escapes = rel.components().any(|c| {
            !matches!(c, Component::Normal(_) | Component::CurDir)
        });
        if rel_path.is_empty() || escapes {
            return Err(StoreError::InvalidPath(rel_path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Storage address for one composited output.
///
/// The product id comes from an external feed, so anything outside
/// `[A-Za-z0-9._-]` is replaced before it becomes a path segment.
pub fn output_path(job_id: DbId, product_id: &str) -> String {
    let safe: String = product_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("jobs/{job_id}/{safe}.png")
}

/// Storage directory holding all of one job's outputs.
pub fn job_dir(job_id: DbId) -> String {
    format!("jobs/{job_id}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, ImageStore) {
        let dir = tempfile::tempdir().expect("tempdir should be creatable");
        let store = ImageStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn put_read_roundtrip() {
        let (_dir, store) = temp_store();

        store.put("jobs/1/sku.png", b"bytes").await.unwrap();
        let read = store.read("jobs/1/sku.png").await.unwrap();
        assert_eq!(read, b"bytes");
    }

    #[tokio::test]
    async fn put_overwrites_existing_file() {
        let (_dir, store) = temp_store();

        store.put("jobs/1/sku.png", b"first").await.unwrap();
        store.put("jobs/1/sku.png", b"second").await.unwrap();

        let read = store.read("jobs/1/sku.png").await.unwrap();
        assert_eq!(read, b"second");
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let (_dir, store) = temp_store();

        store.put("jobs/1/sku.png", b"bytes").await.unwrap();
        store.remove("jobs/1/sku.png").await.unwrap();
        assert!(store.read("jobs/1/sku.png").await.is_err());

        // Second removal of the same path must still succeed.
        store.remove("jobs/1/sku.png").await.unwrap();
    }

    #[tokio::test]
    async fn remove_dir_clears_job_outputs() {
        let (_dir, store) = temp_store();

        store.put("jobs/1/a.png", b"a").await.unwrap();
        store.put("jobs/1/b.png", b"b").await.unwrap();

        store.remove_dir("jobs/1").await.unwrap();
        assert!(store.read("jobs/1/a.png").await.is_err());

        // Absent directory is fine too.
        store.remove_dir("jobs/1").await.unwrap();
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let (_dir, store) = temp_store();

        assert!(matches!(
            store.read("../outside").await,
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.put("/etc/passwd", b"x").await,
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.read("").await,
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn output_path_sanitizes_product_ids() {
        assert_eq!(output_path(7, "sku-123"), "jobs/7/sku-123.png");
        assert_eq!(output_path(7, "a/b\\c"), "jobs/7/a-b-c.png");
        assert_eq!(output_path(7, "../../x"), "jobs/7/..-..-x.png");
    }

    #[test]
    fn job_dir_address() {
        assert_eq!(job_dir(42), "jobs/42");
    }
}
