//! Form sessions - one per open report form.
//!
//! A session owns the field values, the image slot and the status message.
//! Two in-flight flags stand in for disabled buttons: one covers
//! submit/share, the other the location lookup.

pub mod handlers;
pub mod models;
pub mod multipart_parser;
pub mod workflow;


use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::geo::AddressResult;
use crate::photo::{ImageSelection, ImageSource, ImageUpload, InvalidMediaError, PreviewHost};
use crate::report::{format_registration_time, ReportFields, ReportInput, ValidationErrors};
use crate::status::{messages, StatusMessage};
use models::FormView;

/// Flag held while an action runs; released when the guard drops.
#[derive(Debug, Default)]
pub struct InFlight(AtomicBool);

impl InFlight {
    pub fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.0))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
struct FormState {
    fields: ReportFields,
    selection: ImageSelection,
    status: StatusMessage,
}

#[derive(Debug)]
pub struct FormSession {
    id: Uuid,
    state: Mutex<FormState>,
    submission: InFlight,
    lookup: InFlight,
}

impl FormSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            state: Mutex::new(FormState::default()),
            submission: InFlight::default(),
            lookup: InFlight::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn submission(&self) -> &InFlight {
        &self.submission
    }

    pub fn lookup(&self) -> &InFlight {
        &self.lookup
    }

    pub fn view(&self) -> FormView {
        let state = self.state.lock();
        FormView {
            id: self.id,
            fields: state.fields.clone(),
            registered_at: format_registration_time(),
            preview: state.selection.preview_element(),
            controls: state.selection.controls().clone(),
            status: state.status.clone(),
            submit_enabled: !self.submission.is_active(),
            lookup_enabled: !self.lookup.is_active(),
        }
    }

    pub fn fields(&self) -> ReportFields {
        self.state.lock().fields.clone()
    }

    pub fn set_fields(&self, fields: ReportFields) {
        self.state.lock().fields = fields;
    }

    pub fn status(&self) -> StatusMessage {
        self.state.lock().status.clone()
    }

    pub fn set_status(&self, status: StatusMessage) {
        self.state.lock().status = status;
    }

    pub fn has_image(&self) -> bool {
        self.state.lock().selection.attachment().is_some()
    }

    pub fn select_image(
        &self,
        host: &dyn PreviewHost,
        upload: ImageUpload,
        source: ImageSource,
    ) -> Result<(), InvalidMediaError> {
        let mut state = self.state.lock();
        match state.selection.select(host, upload, source) {
            Ok(_) => Ok(()),
            Err(e) => {
                state.status = StatusMessage::error(messages::INVALID_IMAGE);
                Err(e)
            }
        }
    }

    pub fn clear_image(&self, host: &dyn PreviewHost) {
        self.state.lock().selection.clear(host);
    }

    /// Form reset: image released, fields emptied, status cleared.
    pub fn reset(&self, host: &dyn PreviewHost) {
        let mut state = self.state.lock();
        state.selection.clear(host);
        state.fields = ReportFields::default();
        state.status = StatusMessage::cleared();
    }

    /// Take the submission snapshot, stamped with the current time.
    pub fn snapshot(&self) -> Result<ReportInput, ValidationErrors> {
        let mut state = self.state.lock();
        let image = state.selection.attachment().cloned();
        let result = ReportInput::new(&state.fields, format_registration_time(), image);
        if result.is_err() {
            state.status = StatusMessage::error(messages::REQUIRED_FIELDS);
        }
        result
    }

    /// Write a lookup result into the address fields; `None` clears both.
    pub fn apply_address(&self, address: Option<&AddressResult>) {
        let mut state = self.state.lock();
        match address {
            Some(address) => {
                state.fields.neighborhood = address.neighborhood.clone();
                state.fields.street = address.street.clone();
            }
            None => {
                state.fields.neighborhood.clear();
                state.fields.street.clear();
            }
        }
    }
}

impl Default for FormSession {
    fn default() -> Self {
        Self::new()
    }
}
