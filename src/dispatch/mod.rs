//! Output dispatcher - hands a finished report to a share target, falling
//! back to a local save.
//!
//! - `share` - share targets (webhook, or none)
//! - `save` - document sinks (HTTP download, directory)

pub mod save;
pub mod share;

pub use save::{DirectorySink, DownloadSink};
pub use share::{NoShareTarget, WebhookShareTarget};

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::report::{report_filename, Document, PdfError};
use crate::status::{messages, StatusMessage};

pub const PDF_MIME: &str = "application/pdf";
pub const SHARE_TITLE: &str = "Relatório de Obra";
pub const SHARE_TEXT: &str = "Segue o relatório em anexo.";

/// A serialized report ready to leave the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl ReportFile {
    pub fn from_document(document: &Document, neighborhood: &str) -> Result<Self, PdfError> {
        Ok(Self {
            filename: report_filename(neighborhood),
            bytes: document.to_pdf()?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SharePayload<'a> {
    pub title: &'a str,
    pub text: &'a str,
    pub file: &'a ReportFile,
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share target rejected the report with status {0}")]
    Rejected(u16),
    #[error("share request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A sharing surface for report files.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this target accepts `file` at all.
    fn can_share(&self, file: &ReportFile) -> bool;

    async fn share(&self, payload: SharePayload<'_>) -> Result<(), ShareError>;
}

/// Where a report goes when it is saved.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn save(&self, file: &ReportFile) -> Result<SavedReport, SaveError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReport {
    pub filename: String,
    /// Set when the sink wrote the file to disk.
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ShareAttempt {
    Shared,
    Unsupported,
    Failed(ShareError),
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Shared,
    Saved {
        saved: SavedReport,
        /// Why sharing did not happen; `None` when it was not supported.
        share_error: Option<ShareError>,
    },
}

impl DispatchOutcome {
    pub fn status(&self) -> StatusMessage {
        match self {
            DispatchOutcome::Shared => StatusMessage::success(messages::SHARED),
            DispatchOutcome::Saved { .. } => StatusMessage::success(messages::SHARE_FALLBACK),
        }
    }
}

#[derive(Clone)]
pub struct OutputDispatcher {
    share_target: Arc<dyn ShareTarget>,
    sink: Arc<dyn DocumentSink>,
}

impl OutputDispatcher {
    pub fn new(share_target: Arc<dyn ShareTarget>, sink: Arc<dyn DocumentSink>) -> Self {
        Self { share_target, sink }
    }

    /// Offer the file to the share target. Never fails; a refused or failed
    /// share is reported in the returned attempt.
    pub async fn try_share(&self, file: &ReportFile) -> ShareAttempt {
        if !self.share_target.can_share(file) {
            log::debug!("Share target cannot take {}", file.filename);
            return ShareAttempt::Unsupported;
        }

        let payload = SharePayload {
            title: SHARE_TITLE,
            text: SHARE_TEXT,
            file,
        };
        match self.share_target.share(payload).await {
            Ok(()) => {
                log::info!("Report {} shared", file.filename);
                ShareAttempt::Shared
            }
            Err(e) => {
                log::warn!("{}: {}", messages::SHARE_CANCELLED, e);
                ShareAttempt::Failed(e)
            }
        }
    }

    pub async fn save(&self, file: &ReportFile) -> Result<SavedReport, SaveError> {
        let saved = self.sink.save(file).await?;
        log::info!("Report {} saved", saved.filename);
        Ok(saved)
    }

    /// Share, or save exactly once when sharing is unsupported or fails.
    pub async fn share_or_save(&self, file: &ReportFile) -> Result<DispatchOutcome, SaveError> {
        let share_error = match self.try_share(file).await {
            ShareAttempt::Shared => return Ok(DispatchOutcome::Shared),
            ShareAttempt::Unsupported => None,
            ShareAttempt::Failed(e) => Some(e),
        };

        let saved = self.save(file).await?;
        Ok(DispatchOutcome::Saved { saved, share_error })
    }
}
