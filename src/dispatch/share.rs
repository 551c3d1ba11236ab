use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::{ReportFile, ShareError, SharePayload, ShareTarget, PDF_MIME};

/// Sharing is not available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShareTarget;

#[async_trait]
impl ShareTarget for NoShareTarget {
    fn can_share(&self, _file: &ReportFile) -> bool {
        false
    }

    async fn share(&self, _payload: SharePayload<'_>) -> Result<(), ShareError> {
        Err(ShareError::Rejected(501))
    }
}

/// Posts the report as `multipart/form-data` (`title`, `text`, `file`) to a
/// configured URL.
#[derive(Debug, Clone)]
pub struct WebhookShareTarget {
    client: reqwest::Client,
    url: String,
    max_bytes: usize,
}

impl WebhookShareTarget {
    pub fn new(client: reqwest::Client, url: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            client,
            url: url.into(),
            max_bytes,
        }
    }
}

#[async_trait]
impl ShareTarget for WebhookShareTarget {
    fn can_share(&self, file: &ReportFile) -> bool {
        !file.bytes.is_empty() && file.bytes.len() <= self.max_bytes
    }

    async fn share(&self, payload: SharePayload<'_>) -> Result<(), ShareError> {
        let part = Part::bytes(payload.file.bytes.clone())
            .file_name(payload.file.filename.clone())
            .mime_str(PDF_MIME)?;
        let form = Form::new()
            .text("title", payload.title.to_string())
            .text("text", payload.text.to_string())
            .part("file", part);

        let response = self.client.post(&self.url).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ShareError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
