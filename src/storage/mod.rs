//! Design file storage.
//!
//! Uploaded files are checked before anything touches the disk and then
//! written under a fresh `<uuid>.<ext>` key. Orders only ever hold such keys,
//! never raw filesystem paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;

/// Accepted design file extensions, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "svg", "pdf", "ai", "eps", "cdr",
];

/// Result of a successful intake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// Storage key to pass back as `file_path` when submitting an order
    pub file_path: String,
    /// Name the client uploaded the file under
    pub file_name: String,
    pub file_size: u64,
}

/// Byte storage for design files, addressed by storage key.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError>;

    /// Size of the stored object, or `None` when the key is unknown.
    async fn size(&self, key: &str) -> Result<Option<u64>, ServiceError>;

    async fn read(&self, key: &str) -> Result<Vec<u8>, ServiceError>;

    /// Removes the object. Returns `false` if nothing was stored under `key`.
    async fn delete(&self, key: &str) -> Result<bool, ServiceError>;

    async fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        Ok(self.size(key).await?.is_some())
    }
}

/// Lower-cased extension of `file_name` if it is on the allow-list.
pub fn allowed_extension(file_name: &str) -> Result<String, ServiceError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("file '{}' has no extension", file_name))
        })?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ServiceError::ValidationError(format!(
            "file type '.{}' not allowed; accepted: {}",
            ext,
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// Keys are single path components produced by [`intake`]; anything that could
/// escape the storage root is refused.
pub fn validate_key(key: &str) -> Result<(), ServiceError> {
    let bad = key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
        || key.contains('\0');
    if bad {
        return Err(ServiceError::ValidationError(format!(
            "invalid file reference '{}'",
            key
        )));
    }
    Ok(())
}

/// Validates an upload and writes it under a new unique key.
#[instrument(skip(store, bytes), fields(size = bytes.len()))]
pub async fn intake(
    store: &dyn FileStore,
    original_name: &str,
    bytes: &[u8],
    max_bytes: usize,
) -> Result<StoredFile, ServiceError> {
    if bytes.is_empty() {
        return Err(ServiceError::ValidationError("uploaded file is empty".into()));
    }
    if bytes.len() > max_bytes {
        return Err(ServiceError::ValidationError(format!(
            "file too large; maximum size is {} bytes",
            max_bytes
        )));
    }
    let ext = allowed_extension(original_name)?;

    let key = format!("{}.{}", Uuid::new_v4(), ext);
    store.save(&key, bytes).await?;

    info!(file_path = %key, "design file stored");
    Ok(StoredFile {
        file_path: key,
        file_name: original_name.to_string(),
        file_size: bytes.len() as u64,
    })
}

/// [`FileStore`] backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, ServiceError> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root).await?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, key: &str, bytes: &[u8]) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "wrote design file");
        Ok(())
    }

    async fn size(&self, key: &str) -> Result<Option<u64>, ServiceError> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(meta.len())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, ServiceError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ServiceError::NotFound(
                format!("design file '{}' not found", key),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, ServiceError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(file_path = %key, "design file already gone");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::TempDir;

    const MAX: usize = 1024;

    #[tokio::test]
    async fn intake_writes_under_unique_key() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::open(dir.path()).await.unwrap();

        let first = intake(&store, "Logo.PNG", b"png-bytes", MAX).await.unwrap();
        let second = intake(&store, "Logo.PNG", b"png-bytes", MAX).await.unwrap();

        assert_ne!(first.file_path, second.file_path);
        assert!(first.file_path.ends_with(".png"));
        assert_eq!(first.file_name, "Logo.PNG");
        assert_eq!(first.file_size, 9);
        assert_eq!(store.read(&first.file_path).await.unwrap(), b"png-bytes");
        assert!(store.exists(&second.file_path).await.unwrap());
    }

    #[tokio::test]
    async fn intake_rejects_before_writing() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::open(dir.path()).await.unwrap();

        assert_matches!(
            intake(&store, "design.exe", b"MZ", MAX).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            intake(&store, "design", b"data", MAX).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            intake(&store, "design.pdf", b"", MAX).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            intake(&store, "design.pdf", &vec![0u8; MAX + 1], MAX).await,
            Err(ServiceError::ValidationError(msg)) if msg.contains("too large")
        );

        let mut entries = std::fs::read_dir(dir.path()).unwrap();
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn file_at_exact_limit_is_accepted() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::open(dir.path()).await.unwrap();
        let stored = intake(&store, "cut.svg", &vec![1u8; MAX], MAX).await.unwrap();
        assert_eq!(store.size(&stored.file_path).await.unwrap(), Some(MAX as u64));
    }

    #[tokio::test]
    async fn keys_cannot_escape_root() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new(dir.path());

        for key in ["../etc/passwd", "a/b.png", "..", "", "c:\\x.png"] {
            assert_matches!(store.read(key).await, Err(ServiceError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn delete_reports_missing_files() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::open(dir.path()).await.unwrap();
        let stored = intake(&store, "a.ai", b"x", MAX).await.unwrap();

        assert!(store.delete(&stored.file_path).await.unwrap());
        assert!(!store.delete(&stored.file_path).await.unwrap());
        assert_eq!(store.size(&stored.file_path).await.unwrap(), None);
        assert_matches!(
            store.read(&stored.file_path).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert_eq!(allowed_extension("A.JpEg").unwrap(), "jpeg");
        assert_eq!(allowed_extension("plan.cdr").unwrap(), "cdr");
        assert!(allowed_extension("notes.txt").is_err());
    }
}
