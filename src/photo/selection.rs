//! The single image slot of a form.
//!
//! At most one image is live at a time. Replacing or clearing it always
//! revokes the previous preview resource before anything new is shown.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{ImageAttachment, ImageSource, ImageUpload, InvalidMediaError};

/// Handle to a revocable preview resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub id: Uuid,
    pub url: String,
}

/// Creates and revokes preview resources for selected images.
pub trait PreviewHost: Send + Sync {
    fn create_preview(&self, image: &ImageAttachment) -> PreviewHandle;
    fn revoke_preview(&self, handle: &PreviewHandle);
}

/// Current value of each image control (the selected filename, if any).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ControlValues {
    pub file: Option<String>,
    pub camera: Option<String>,
}

impl ControlValues {
    fn slot(&mut self, source: ImageSource) -> &mut Option<String> {
        match source {
            ImageSource::File => &mut self.file,
            ImageSource::Camera => &mut self.camera,
        }
    }

    pub fn get(&self, source: ImageSource) -> Option<&str> {
        match source {
            ImageSource::File => self.file.as_deref(),
            ImageSource::Camera => self.camera.as_deref(),
        }
    }
}

/// What the preview element shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PreviewElement {
    pub visible: bool,
    #[schema(example = "/api/previews/0b6f3c1e-8f0e-4a53-9f39-2b1f6f0c9a11")]
    pub src: Option<String>,
}

#[derive(Debug, Clone)]
struct Selected {
    attachment: ImageAttachment,
    preview: PreviewHandle,
}

#[derive(Debug, Default)]
pub struct ImageSelection {
    current: Option<Selected>,
    controls: ControlValues,
}

impl ImageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an image from `source`.
    ///
    /// Non-image uploads are rejected and the triggering control is cleared;
    /// the previously held image (if any) stays untouched in that case.
    pub fn select(
        &mut self,
        host: &dyn PreviewHost,
        upload: ImageUpload,
        source: ImageSource,
    ) -> Result<&ImageAttachment, InvalidMediaError> {
        if !upload.is_image() {
            *self.controls.slot(source) = None;
            return Err(InvalidMediaError {
                declared: upload.mime_type,
            });
        }

        self.release(host);

        let attachment = ImageAttachment::from_upload(upload);
        let preview = host.create_preview(&attachment);
        log::debug!(
            "Image '{}' selected from {:?}, preview {}",
            attachment.filename,
            source,
            preview.id
        );

        *self.controls.slot(source) = Some(attachment.filename.clone());
        *self.controls.slot(source.other()) = None;

        let selected = self.current.insert(Selected {
            attachment,
            preview,
        });
        Ok(&selected.attachment)
    }

    /// Release the preview and empty the slot. No-op when nothing is held.
    pub fn clear(&mut self, host: &dyn PreviewHost) {
        self.release(host);
        self.controls = ControlValues::default();
    }

    fn release(&mut self, host: &dyn PreviewHost) {
        if let Some(previous) = self.current.take() {
            log::debug!("Revoking preview {}", previous.preview.id);
            host.revoke_preview(&previous.preview);
        }
    }

    pub fn attachment(&self) -> Option<&ImageAttachment> {
        self.current.as_ref().map(|s| &s.attachment)
    }

    pub fn preview_handle(&self) -> Option<&PreviewHandle> {
        self.current.as_ref().map(|s| &s.preview)
    }

    pub fn controls(&self) -> &ControlValues {
        &self.controls
    }

    pub fn preview_element(&self) -> PreviewElement {
        match &self.current {
            Some(selected) => PreviewElement {
                visible: true,
                src: Some(selected.preview.url.clone()),
            },
            None => PreviewElement::default(),
        }
    }
}
