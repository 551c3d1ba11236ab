//! Photo attachment handling.
//!
//! - `selection` - the single image slot of a form and its preview lifecycle
//! - `preview` - in-memory registry of revocable preview resources
//! - `encoding` - data-URL encoding and PDF-ready image preparation

pub mod encoding;
pub mod preview;
pub mod selection;

pub use encoding::{prepare_attachment, ImageDecodeError};
pub use preview::PreviewStore;
pub use selection::{ControlValues, ImageSelection, PreviewElement, PreviewHandle, PreviewHost};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use utoipa::ToSchema;

/// The two mutually exclusive image-source controls of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// File picker
    File,
    /// Camera capture
    Camera,
}

impl ImageSource {
    pub fn other(self) -> Self {
        match self {
            ImageSource::File => ImageSource::Camera,
            ImageSource::Camera => ImageSource::File,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("'{declared}' is not an image type")]
pub struct InvalidMediaError {
    pub declared: String,
}

/// A file as received from one of the image controls.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.trim().to_ascii_lowercase().starts_with("image/")
    }
}

/// The image held by a form's image slot.
#[derive(Clone, PartialEq)]
pub struct ImageAttachment {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
    pub filename: String,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("len", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .field("filename", &self.filename)
            .finish()
    }
}

impl ImageAttachment {
    pub fn from_upload(upload: ImageUpload) -> Self {
        Self {
            bytes: Arc::new(upload.bytes),
            mime_type: upload.mime_type,
            filename: sanitize_filename::sanitize(&upload.filename),
        }
    }
}
