use std::path::{Path, PathBuf};

use anyhow::Context;

const FILE_PREFIX: &str = "sonify_";

/// Directory holding generated WAV files.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
}

impl AudioStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create audio directory {}", self.dir.display()))
    }

    /// `sonify_<8 hex chars>.wav`
    pub fn new_filename() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("{}{}.wav", FILE_PREFIX, &id[..8])
    }

    /// Write a new file and return its name.
    pub async fn save(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let filename = Self::new_filename();
        let path = self.dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(filename)
    }

    /// Read a stored file; `None` unless `name` is a regular file in the store.
    /// `name` must already be validated.
    pub async fn load(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Ok(None),
        }
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(bytes))
    }
}
