use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures_util::StreamExt;
use log::debug;

use crate::photo::{ImageSource, ImageUpload};
use crate::ErrorResponse;

/// One image taken from the upload form.
#[derive(Debug)]
pub struct ParsedImageUpload {
    pub source: ImageSource,
    pub upload: ImageUpload,
}

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("No image field found; expected 'file' or 'camera'")]
    MissingImage,
}

impl From<MultipartParseError> for HttpResponse {
    fn from(error: MultipartParseError) -> Self {
        match error {
            MultipartParseError::TooLarge { .. } => HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::new("PayloadTooLarge", &error.to_string())),
            MultipartParseError::FieldError(_) | MultipartParseError::MissingImage => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            MultipartParseError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error(&error.to_string())),
        }
    }
}

/// Map a form field name to the control it came from.
pub fn source_for_field(name: &str) -> Option<ImageSource> {
    match name {
        "file" | "fotoArquivo" => Some(ImageSource::File),
        "camera" | "fotoCamera" => Some(ImageSource::Camera),
        _ => None,
    }
}

/// Declared type of the part, guessed from the filename when the client
/// sent none or only a generic octet-stream.
fn declared_mime(declared: Option<&mime_guess::Mime>, filename: &str) -> String {
    match declared {
        Some(mime) if *mime != mime_guess::mime::APPLICATION_OCTET_STREAM => mime.to_string(),
        _ => mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string(),
    }
}

pub struct MultipartParser;

impl MultipartParser {
    /// Read the first image field; later image fields are ignored.
    pub async fn parse_image_multipart(
        mut multipart: Multipart,
        max_bytes: usize,
    ) -> Result<ParsedImageUpload, MultipartParseError> {
        let mut parsed: Option<ParsedImageUpload> = None;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field.content_disposition().ok_or_else(|| {
                MultipartParseError::FieldError("Content disposition not found".to_string())
            })?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let filename = content_disposition
                .get_filename()
                .unwrap_or("upload")
                .to_string();

            let source = match source_for_field(&name) {
                Some(source) if parsed.is_none() => source,
                _ => {
                    debug!("Skipping multipart field '{}'", name);
                    while let Some(chunk) = field.next().await {
                        chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
                    }
                    continue;
                }
            };

            let mime_type = declared_mime(field.content_type(), &filename);

            let mut buffer = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
                if buffer.len() + data.len() > max_bytes {
                    return Err(MultipartParseError::TooLarge { limit: max_bytes });
                }
                buffer.extend_from_slice(&data);
            }

            parsed = Some(ParsedImageUpload {
                source,
                upload: ImageUpload::new(buffer, mime_type, filename),
            });
        }

        parsed.ok_or(MultipartParseError::MissingImage)
    }
}
