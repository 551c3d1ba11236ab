//! Revocable preview resources served at `/api/previews/{id}`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::selection::{PreviewHandle, PreviewHost};
use super::ImageAttachment;

pub const PREVIEW_ROUTE_PREFIX: &str = "/api/previews/";

#[derive(Debug, Clone)]
pub struct PreviewResource {
    pub bytes: Arc<Vec<u8>>,
    pub mime_type: String,
}

#[derive(Debug, Default)]
pub struct PreviewStore {
    resources: RwLock<HashMap<Uuid, PreviewResource>>,
}

impl PreviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<PreviewResource> {
        self.resources.read().get(id).cloned()
    }

    /// Number of previews not yet revoked.
    pub fn live_count(&self) -> usize {
        self.resources.read().len()
    }
}

impl PreviewHost for PreviewStore {
    fn create_preview(&self, image: &ImageAttachment) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.resources.write().insert(
            id,
            PreviewResource {
                bytes: Arc::clone(&image.bytes),
                mime_type: image.mime_type.clone(),
            },
        );
        PreviewHandle {
            id,
            url: format!("{}{}", PREVIEW_ROUTE_PREFIX, id),
        }
    }

    fn revoke_preview(&self, handle: &PreviewHandle) {
        if self.resources.write().remove(&handle.id).is_none() {
            log::warn!("Preview {} was already revoked", handle.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::{test_images, ImageSelection, ImageSource, ImageUpload};

    #[test]
    fn test_create_and_revoke() {
        let store = PreviewStore::new();
        let attachment =
            ImageAttachment::from_upload(ImageUpload::new(test_images::png(2, 2), "image/png", "a.png"));

        let handle = store.create_preview(&attachment);
        assert_eq!(handle.url, format!("/api/previews/{}", handle.id));
        assert_eq!(store.get(&handle.id).unwrap().mime_type, "image/png");

        store.revoke_preview(&handle);
        assert!(store.get(&handle.id).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_selection_keeps_single_live_preview() {
        let store = PreviewStore::new();
        let mut selection = ImageSelection::new();

        for name in ["a.png", "b.png", "c.png"] {
            let upload = ImageUpload::new(test_images::png(2, 2), "image/png", name);
            selection.select(&store, upload, ImageSource::File).unwrap();
            assert_eq!(store.live_count(), 1);
        }

        selection.clear(&store);
        assert_eq!(store.live_count(), 0);
    }
}
