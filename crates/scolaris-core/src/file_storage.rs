//! File storage abstraction for uploaded documents and notification media.
//!
//! Handlers only see the [`FileStorage`] trait; [`LocalFileStorage`] writes
//! under a directory that the router serves statically.
//!
//! # Example
//!
//! ```ignore
//! use scolaris_core::file_storage::{FileStorage, LocalFileStorage, object_key};
//!
//! let storage = LocalFileStorage::new(
//!     PathBuf::from("./uploads"),
//!     "http://localhost:3000/uploads".to_string(),
//!     10 * 1024 * 1024,
//! );
//!
//! let key = object_key(&format!("documents/{school_id}"), "bulletin.pdf");
//! storage.validate_content_type("application/pdf")?;
//! storage.save(&key, &bytes).await?;
//! let url = storage.get_url(&key)?;
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;
use uuid::Uuid;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Storage backend for uploaded files.
pub trait FileStorage: Send + Sync {
    /// Save file content under `key` and return the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Delete a file by key. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Public URL for a stored key.
    fn get_url(&self, key: &str) -> Result<String, StorageError>;

    /// Reject content types the backend does not accept.
    fn validate_content_type(&self, content_type: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File exceeds maximum size of {max_bytes} bytes")]
    InvalidFileSize { max_bytes: usize },

    #[error("MIME type '{received}' not allowed. Allowed types: {}", .allowed.join(", "))]
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },

    #[error("Uploaded file is empty")]
    EmptyFile,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Content types accepted for school documents and announcement media.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
    "video/mp4",
    "video/webm",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Builds a collision-free storage key: `{prefix}/{uuid}.{ext}`.
///
/// The extension is taken from the original filename, lowercased and limited
/// to alphanumerics; anything else falls back to `bin`.
pub fn object_key(prefix: &str, original_filename: &str) -> String {
    let ext = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());

    format!(
        "{}/{}.{}",
        prefix.trim_matches('/'),
        Uuid::new_v4(),
        ext
    )
}

#[derive(Clone, Debug)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    base_url: String,
    max_file_size: usize,
    allowed_mime_types: Vec<String>,
}

impl LocalFileStorage {
    pub fn new(base_dir: PathBuf, base_url: String, max_file_size: usize) -> Self {
        Self {
            base_dir,
            base_url,
            max_file_size,
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Rejects empty keys, traversal and absolute paths.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') || key.starts_with('\\') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '/' || c == '.')
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.is_empty() {
                return Err(StorageError::EmptyFile);
            }

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }

            fs::write(&file_path, content).await?;

            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(_) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn get_url(&self, key: &str) -> Result<String, StorageError> {
        Self::validate_key(key)?;
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), key))
    }

    fn validate_content_type(&self, content_type: &str) -> Result<(), StorageError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        if self.allowed_mime_types.iter().any(|m| *m == essence) {
            Ok(())
        } else {
            Err(StorageError::InvalidMimeType {
                received: essence,
                allowed: self.allowed_mime_types.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: PathBuf) -> LocalFileStorage {
        LocalFileStorage::new(dir, "http://localhost:3000/uploads".to_string(), 16)
    }

    #[test]
    fn test_validate_key_accepts_valid_keys() {
        assert!(LocalFileStorage::validate_key("documents/abc/report.pdf").is_ok());
        assert!(LocalFileStorage::validate_key("notifications/a-1_b.mp4").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_traversal_and_absolute() {
        assert!(LocalFileStorage::validate_key("../../etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("/etc/passwd").is_err());
        assert!(LocalFileStorage::validate_key("\\windows").is_err());
        assert!(LocalFileStorage::validate_key("").is_err());
        assert!(LocalFileStorage::validate_key("docs/a b.pdf").is_err());
    }

    #[test]
    fn test_object_key_keeps_extension_and_prefix() {
        let key = object_key("/documents/school-1/", "Bulletin T1.PDF");
        assert!(key.starts_with("documents/school-1/"));
        assert!(key.ends_with(".pdf"));
        assert!(LocalFileStorage::validate_key(&key).is_ok());
    }

    #[test]
    fn test_object_key_falls_back_to_bin() {
        assert!(object_key("media", "no_extension").ends_with(".bin"));
        assert!(object_key("media", "weird.ex$t").ends_with(".bin"));
    }

    #[test]
    fn test_get_url_handles_trailing_slash() {
        let storage = LocalFileStorage::new(
            PathBuf::from("./uploads"),
            "http://localhost:3000/uploads/".to_string(),
            1024,
        );
        assert_eq!(
            storage.get_url("documents/x.pdf").unwrap(),
            "http://localhost:3000/uploads/documents/x.pdf"
        );
    }

    #[test]
    fn test_content_type_whitelist() {
        let storage = storage(PathBuf::from("./uploads"));
        assert!(storage.validate_content_type("application/pdf").is_ok());
        assert!(storage.validate_content_type("image/PNG; charset=binary").is_ok());
        assert!(matches!(
            storage.validate_content_type("application/x-msdownload"),
            Err(StorageError::InvalidMimeType { .. })
        ));
    }

    #[tokio::test]
    async fn test_save_and_delete_roundtrip_on_disk() {
        let dir = std::env::temp_dir().join(format!("scolaris-storage-{}", Uuid::new_v4()));
        let storage = storage(dir.clone());

        storage.save("documents/a.pdf", b"%PDF-1.4").await.unwrap();
        assert!(dir.join("documents/a.pdf").exists());

        storage.delete("documents/a.pdf").await.unwrap();
        assert!(!dir.join("documents/a.pdf").exists());

        // Deleting twice is fine
        storage.delete("documents/a.pdf").await.unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_save_rejects_oversized_and_empty() {
        let storage = storage(std::env::temp_dir());
        assert!(matches!(
            storage.save("big.bin", &[0u8; 32]).await,
            Err(StorageError::InvalidFileSize { max_bytes: 16 })
        ));
        assert!(matches!(
            storage.save("empty.bin", &[]).await,
            Err(StorageError::EmptyFile)
        ));
    }
}
