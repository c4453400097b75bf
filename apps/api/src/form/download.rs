use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Failed to save {filename}: {source}")]
    Io {
        filename: String,
        #[source]
        source: std::io::Error,
    },
}

/// Materializes a returned PDF as a local file.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: Bytes) -> Result<PathBuf, DownloadError>;
}

/// Writes downloads into one directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: Bytes) -> Result<PathBuf, DownloadError> {
        let io_err = |source: std::io::Error| DownloadError::Io {
            filename: filename.to_string(),
            source,
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;
        let path = self.dir.join(file_name_only(filename));
        tokio::fs::write(&path, &bytes).await.map_err(io_err)?;
        Ok(path)
    }
}

/// Drops any directory components so a download cannot land outside the sink.
fn file_name_only(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "resume.pdf".to_string())
}
