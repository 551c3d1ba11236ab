//! Image encoding for the report document.
//!
//! The held image is first turned into a data URL. The output format label
//! is sniffed from the data URL's MIME marker (`image/png` → PNG, anything
//! else → JPEG) and the payload is then prepared for embedding with that
//! label: PNG becomes zlib-compressed samples, JPEG stays as DCT bytes
//! (other formats are transcoded to JPEG).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GenericImageView};
use std::io::{Cursor, Write};
use thiserror::Error;

use super::ImageAttachment;
use crate::report::document::{ColorSpace, EmbeddedImage, ImageFormat, StreamFilter};

#[derive(Debug, Error)]
pub enum ImageDecodeError {
    #[error("malformed data URL")]
    MalformedDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has no pixels")]
    Empty,
    #[error("failed to compress image samples: {0}")]
    Compress(#[source] std::io::Error),
    #[error("image processing task failed: {0}")]
    Task(String),
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_url(attachment: &ImageAttachment) -> String {
    format!(
        "data:{};base64,{}",
        attachment.mime_type,
        BASE64.encode(attachment.bytes.as_slice())
    )
}

fn split_data_url(data_url: &str) -> Result<(&str, &str), ImageDecodeError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(ImageDecodeError::MalformedDataUrl)?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(ImageDecodeError::MalformedDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(ImageDecodeError::MalformedDataUrl);
    }
    Ok((header, payload))
}

/// Output format label for a data URL, judged from its MIME marker only.
pub fn sniff_format(data_url: &str) -> ImageFormat {
    let header = data_url.split(',').next().unwrap_or_default();
    if header.to_ascii_lowercase().contains("image/png") {
        ImageFormat::Png
    } else {
        ImageFormat::Jpeg
    }
}

fn zlib(raw: &[u8]) -> Result<Vec<u8>, ImageDecodeError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(raw).map_err(ImageDecodeError::Compress)?;
    encoder.finish().map_err(ImageDecodeError::Compress)
}

/// Blend `value` over a white background.
fn over_white(value: u8, alpha: u8) -> u8 {
    let (v, a) = (value as u32, alpha as u32);
    ((v * a + 255 * (255 - a)) / 255) as u8
}

fn flatten_samples(decoded: &DynamicImage) -> (Vec<u8>, ColorSpace) {
    if decoded.color().has_color() {
        let rgba = decoded.to_rgba8();
        let mut samples = Vec::with_capacity((rgba.width() * rgba.height() * 3) as usize);
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            samples.extend_from_slice(&[over_white(r, a), over_white(g, a), over_white(b, a)]);
        }
        (samples, ColorSpace::DeviceRgb)
    } else {
        let la = decoded.to_luma_alpha8();
        let samples = la.pixels().map(|p| over_white(p.0[0], p.0[1])).collect();
        (samples, ColorSpace::DeviceGray)
    }
}

fn flattened(decoded: &DynamicImage) -> DynamicImage {
    let (samples, color_space) = flatten_samples(decoded);
    let (width, height) = decoded.dimensions();
    match color_space {
        ColorSpace::DeviceRgb => image::RgbImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageRgb8)
            .unwrap_or_else(|| DynamicImage::ImageRgb8(decoded.to_rgb8())),
        ColorSpace::DeviceGray => image::GrayImage::from_raw(width, height, samples)
            .map(DynamicImage::ImageLuma8)
            .unwrap_or_else(|| DynamicImage::ImageLuma8(decoded.to_luma8())),
    }
}

/// Component count from the first SOF segment of a JPEG stream. `None` when
/// the bytes are not JPEG or the scan starts before any frame header.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut i = 2;
    loop {
        if *bytes.get(i)? != 0xFF {
            return None;
        }
        // fill bytes
        while *bytes.get(i + 1)? == 0xFF {
            i += 1;
        }
        let marker = *bytes.get(i + 1)?;
        match marker {
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            0xD9 | 0xDA => return None,
            // FF C0..CF minus DHT, JPG and DAC: FF Cn, length(2), P, Y(2), X(2), Nf
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => {
                return bytes.get(i + 9).copied();
            }
            _ => {}
        }
        let length = u16::from_be_bytes([*bytes.get(i + 2)?, *bytes.get(i + 3)?]) as usize;
        i += 2 + length;
    }
}

/// DCT bytes go into the PDF untouched only when the stream itself is YCbCr
/// or gray. CMYK and YCCK frames decode to RGB but must not be labelled so.
fn passthrough_color_space(
    components: Option<u8>,
    decoded: image::ColorType,
) -> Option<ColorSpace> {
    match (components, decoded) {
        (Some(3), image::ColorType::Rgb8) => Some(ColorSpace::DeviceRgb),
        (Some(1), image::ColorType::L8) => Some(ColorSpace::DeviceGray),
        _ => None,
    }
}

/// Decode a data URL into an image the PDF writer can place.
pub fn prepare_embedded(data_url: &str) -> Result<EmbeddedImage, ImageDecodeError> {
    let (_, payload) = split_data_url(data_url)?;
    let format = sniff_format(data_url);
    let bytes = BASE64.decode(payload)?;
    let decoded = image::load_from_memory(&bytes)?;
    let (pixel_width, pixel_height) = decoded.dimensions();
    if pixel_width == 0 || pixel_height == 0 {
        return Err(ImageDecodeError::Empty);
    }

    match format {
        ImageFormat::Png => {
            let (samples, color_space) = flatten_samples(&decoded);
            Ok(EmbeddedImage {
                format,
                pixel_width,
                pixel_height,
                color_space,
                filter: StreamFilter::FlateDecode,
                data: zlib(&samples)?,
            })
        }
        ImageFormat::Jpeg => {
            let passthrough = passthrough_color_space(jpeg_components(&bytes), decoded.color());

            let (data, color_space) = match passthrough {
                Some(color_space) => (bytes, color_space),
                _ => {
                    let flat = flattened(&decoded);
                    let color_space = if flat.color().has_color() {
                        ColorSpace::DeviceRgb
                    } else {
                        ColorSpace::DeviceGray
                    };
                    let mut out = Cursor::new(Vec::new());
                    flat.write_to(&mut out, image::ImageFormat::Jpeg)?;
                    (out.into_inner(), color_space)
                }
            };

            Ok(EmbeddedImage {
                format,
                pixel_width,
                pixel_height,
                color_space,
                filter: StreamFilter::DctDecode,
                data,
            })
        }
    }
}

/// Encode and decode the attachment on the blocking pool.
pub async fn prepare_attachment(
    attachment: ImageAttachment,
) -> Result<EmbeddedImage, ImageDecodeError> {
    tokio::task::spawn_blocking(move || {
        let data_url = to_data_url(&attachment);
        prepare_embedded(&data_url)
    })
    .await
    .map_err(|e| ImageDecodeError::Task(e.to_string()))?
}
