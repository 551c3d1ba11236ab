use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

use super::{DocumentSink, ReportFile, SaveError, SavedReport};

/// The HTTP response carries the file as an attachment; nothing is written.
#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadSink;

#[async_trait]
impl DocumentSink for DownloadSink {
    async fn save(&self, file: &ReportFile) -> Result<SavedReport, SaveError> {
        Ok(SavedReport {
            filename: file.filename.clone(),
            path: None,
        })
    }
}

/// Writes reports into a directory, replacing a file of the same name.
/// Each save lands in a temp file next to the target and is renamed over
/// it, so concurrent saves of one name leave exactly one complete file.
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
impl DocumentSink for DirectorySink {
    async fn save(&self, file: &ReportFile) -> Result<SavedReport, SaveError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SaveError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(&file.filename);
        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", file.filename, Uuid::new_v4()));

        if let Err(source) = tokio::fs::write(&tmp, &file.bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(SaveError::Io { path: tmp, source });
        }
        if let Err(source) = tokio::fs::rename(&tmp, &path).await {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                log::warn!("Could not remove {}: {}", tmp.display(), e);
            }
            return Err(SaveError::Io {
                path: path.clone(),
                source,
            });
        }

        Ok(SavedReport {
            filename: file.filename.clone(),
            path: Some(path),
        })
    }
}
