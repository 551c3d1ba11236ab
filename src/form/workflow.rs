//! Submission and location flows for a single form session.

use thiserror::Error;

use super::FormSession;
use crate::dispatch::{DispatchOutcome, OutputDispatcher, ReportFile, SaveError, SavedReport};
use crate::geo::{AddressLookup, AddressLookupError, AddressResult, PositionProvider};
use crate::report::{PdfError, ReportBuilder, ValidationErrors};
use crate::status::{messages, StatusMessage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Plain submit: build and save.
    Save,
    /// Share button: share, falling back to a save.
    ShareOrSave,
}

#[derive(Debug)]
pub enum SubmissionOutcome {
    Saved(SavedReport),
    Shared,
    SharedFallback(SavedReport),
}

#[derive(Debug)]
pub struct Submission {
    pub file: ReportFile,
    pub outcome: SubmissionOutcome,
    pub status: StatusMessage,
    /// Photo could not be embedded; the report went out without it.
    pub warning: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("a submission is already in progress")]
    InFlight,
    #[error("required fields missing: {0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

pub const PDF_FAILED: &str = "Erro ao gerar o PDF.";
pub const SAVE_FAILED: &str = "Erro ao salvar o PDF.";

/// Validate, build and hand off the report. Only one submission per
/// session runs at a time; a second one is rejected, not queued.
pub async fn submit(
    session: &FormSession,
    builder: &ReportBuilder,
    dispatcher: &OutputDispatcher,
    mode: SubmitMode,
) -> Result<Submission, SubmitError> {
    let _guard = match session.submission().try_acquire() {
        Some(guard) => guard,
        None => {
            log::warn!("Session {}: submission rejected, one in flight", session.id());
            return Err(SubmitError::InFlight);
        }
    };

    let input = session.snapshot()?;
    let built = builder.build(&input).await;
    let warning = built.image_warning.as_ref().map(|e| {
        session.set_status(StatusMessage::error(messages::IMAGE_PROCESSING_FAILED));
        format!("{}: {}", messages::IMAGE_PROCESSING_FAILED, e)
    });

    let file = match ReportFile::from_document(&built.document, &built.neighborhood) {
        Ok(file) => file,
        Err(e) => {
            log::error!("Session {}: PDF serialization failed: {}", session.id(), e);
            session.set_status(StatusMessage::error(PDF_FAILED));
            return Err(e.into());
        }
    };

    let dispatched = match mode {
        SubmitMode::Save => dispatcher.save(&file).await.map(|saved| {
            (
                SubmissionOutcome::Saved(saved),
                StatusMessage::success(messages::SAVED),
            )
        }),
        SubmitMode::ShareOrSave => dispatcher.share_or_save(&file).await.map(|outcome| {
            let status = outcome.status();
            let outcome = match outcome {
                DispatchOutcome::Shared => SubmissionOutcome::Shared,
                DispatchOutcome::Saved { saved, .. } => SubmissionOutcome::SharedFallback(saved),
            };
            (outcome, status)
        }),
    };

    let (outcome, status) = match dispatched {
        Ok(dispatched) => dispatched,
        Err(e) => {
            log::error!("Session {}: {}", session.id(), e);
            session.set_status(StatusMessage::error(SAVE_FAILED));
            return Err(e.into());
        }
    };

    session.set_status(status.clone());
    log::info!(
        "Session {}: report {} dispatched ({:?})",
        session.id(),
        file.filename,
        outcome
    );

    Ok(Submission {
        file,
        outcome,
        status,
        warning,
    })
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("a location lookup is already in progress")]
    InFlight,
    #[error(transparent)]
    Lookup(#[from] AddressLookupError),
}

/// Fill neighborhood and street from the device position. On failure both
/// fields are cleared.
pub async fn locate(
    session: &FormSession,
    lookup: &AddressLookup,
    provider: &dyn PositionProvider,
) -> Result<AddressResult, LocateError> {
    let _guard = session.lookup().try_acquire().ok_or(LocateError::InFlight)?;

    match lookup.lookup(provider).await {
        Ok(address) => {
            session.apply_address(Some(&address));
            session.set_status(StatusMessage::success(messages::LOCATION_FILLED));
            Ok(address)
        }
        Err(e) => {
            log::warn!("Session {}: location lookup failed: {}", session.id(), e);
            session.apply_address(None);
            Err(e.into())
        }
    }
}
