use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;

/// Persistent home for uploaded files (resumes, recorded answers).
///
/// `store` returns the path that gets recorded verbatim in the database as the
/// answer/resume reference, so `read` must accept exactly that string back.
#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn store(&self, key: &str, body: Bytes) -> anyhow::Result<String>;
    async fn read(&self, stored_path: &str) -> anyhow::Result<Bytes>;
}

/// Disk-backed store rooted at the configured upload directory.
/// Layout: `<root>/<category>/<owner-id>/<unique-name>.<ext>`.
#[derive(Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn store(&self, key: &str, body: Bytes) -> anyhow::Result<String> {
        let full = self.root.join(key);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create upload dir {}", parent.display()))?;
        }
        tokio::fs::write(&full, &body)
            .await
            .with_context(|| format!("write upload {}", full.display()))?;
        Ok(full.to_string_lossy().into_owned())
    }

    async fn read(&self, stored_path: &str) -> anyhow::Result<Bytes> {
        let data = tokio::fs::read(stored_path)
            .await
            .with_context(|| format!("read upload {}", stored_path))?;
        Ok(Bytes::from(data))
    }
}

/// Lowercased extension of an uploaded filename, restricted to safe
/// alphanumerics so it can be embedded in a storage key.
pub fn ext_from_filename(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_lowercase();
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

/// Collision-proof name for a stored upload: millisecond timestamp plus a
/// random suffix, with an optional slot prefix (`followup_...`) so the files
/// stay recognizable on disk.
pub fn unique_name(prefix: Option<&str>, ext: Option<&str>) -> String {
    let millis = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::random();
    let stem = match prefix {
        Some(p) => format!("{p}_{millis}-{suffix}"),
        None => format!("{millis}-{suffix}"),
    };
    match ext {
        Some(e) => format!("{stem}.{e}"),
        None => stem,
    }
}
