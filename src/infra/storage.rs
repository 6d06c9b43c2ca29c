use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Attachment bytes on local disk. Rows in `post_files` carry the metadata;
/// the file itself is written under `root` with a generated unique name so
/// user-supplied filenames never touch the filesystem.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("cannot create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `data` under a fresh unique name, keeping the original
    /// extension, and returns the stored name.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> Result<String> {
        let stored_name = match Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.root.join(&stored_name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;

        Ok(stored_name)
    }

    pub async fn read(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(stored_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("cannot read {}", path.display()))
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn remove(&self, stored_name: &str) {
        let path = self.root.join(stored_name);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %err, path = %path.display(), "failed to remove stored file");
            }
        }
    }
}
