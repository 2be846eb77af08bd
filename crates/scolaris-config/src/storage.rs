use std::env;
use std::path::PathBuf;

const DEFAULT_PUBLIC_URL: &str = "/uploads";

/// Where uploads are written and how they are addressed publicly.
///
/// - `UPLOAD_DIR`: directory on disk (default: `storage/uploads`)
/// - `UPLOAD_PUBLIC_URL`: base of the URLs handed to clients, either a path
///   such as `/uploads` or an absolute URL such as
///   `https://cdn.example.com/uploads` (default: `/uploads`)
/// - `UPLOAD_MAX_BYTES`: per-file limit (default: 20 MiB)
#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub public_url: String,
    pub max_file_bytes: usize,
}

impl StorageConfig {
    pub fn new(upload_dir: PathBuf, public_url: &str, max_file_bytes: usize) -> Self {
        Self {
            upload_dir,
            public_url: normalize_public_url(public_url),
            max_file_bytes,
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage/uploads")),
            &env::var("UPLOAD_PUBLIC_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_URL.to_string()),
            env::var("UPLOAD_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20 * 1024 * 1024),
        )
    }

    /// Path the router serves `upload_dir` under: the path part of
    /// `public_url`, always starting with `/` and never the bare root.
    pub fn mount_path(&self) -> String {
        let path = match self.public_url.split_once("://") {
            Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
            None => self.public_url.as_str(),
        };
        let path = path.trim_matches('/');

        if path.is_empty() {
            DEFAULT_PUBLIC_URL.to_string()
        } else {
            format!("/{path}")
        }
    }

    /// Request body limit for multipart routes: the file plus form overhead.
    pub fn body_limit(&self) -> usize {
        self.max_file_bytes + 1024 * 1024
    }
}

/// Drops trailing slashes, roots relative paths, and gives an absolute URL
/// without a path the default one, so URL and mount path stay in step.
fn normalize_public_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');

    match trimmed.split_once("://") {
        Some((_, rest)) if !rest.contains('/') => format!("{trimmed}{DEFAULT_PUBLIC_URL}"),
        Some(_) => trimmed.to_string(),
        None if trimmed.is_empty() => DEFAULT_PUBLIC_URL.to_string(),
        None => format!("/{}", trimmed.trim_start_matches('/')),
    }
}
