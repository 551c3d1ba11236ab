//! In-memory paginated document.
//!
//! A [`Document`] is an ordered list of drawing operations produced once by a
//! [`DocumentWriter`]. It cannot be changed after [`DocumentWriter::finish`];
//! serialization to PDF lives in [`crate::report::pdf`].

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    pub(crate) fn resource_name(self) -> &'static str {
        match self {
            Font::Helvetica => "F1",
            Font::HelveticaBold => "F2",
        }
    }

    pub(crate) fn base_font(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// Encoding label of an embedded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Jpeg => write!(f, "JPEG"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceRgb,
    DeviceGray,
}

/// PDF stream filter matching the bytes in [`EmbeddedImage::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFilter {
    /// Raw JPEG bytes.
    DctDecode,
    /// zlib-compressed 8-bit samples.
    FlateDecode,
}

/// An image ready to be placed in a PDF.
#[derive(Clone, PartialEq)]
pub struct EmbeddedImage {
    pub format: ImageFormat,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub color_space: ColorSpace,
    pub filter: StreamFilter,
    pub data: Vec<u8>,
}

impl fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("format", &self.format)
            .field("pixel_width", &self.pixel_width)
            .field("pixel_height", &self.pixel_height)
            .field("color_space", &self.color_space)
            .field("filter", &self.filter)
            .field("data_len", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        content: String,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: EmbeddedImage,
    },
    PageBreak,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    ops: Vec<DrawOp>,
}

impl Document {
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn page_count(&self) -> usize {
        1 + self
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::PageBreak))
            .count()
    }

    /// Text placements in drawing order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_image(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }

    /// Ops grouped per page.
    pub fn pages(&self) -> Vec<&[DrawOp]> {
        self.ops
            .split(|op| matches!(op, DrawOp::PageBreak))
            .collect()
    }
}

/// Sequential writer; the only way to build a [`Document`].
#[derive(Debug, Default)]
pub struct DocumentWriter {
    ops: Vec<DrawOp>,
}

impl DocumentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, content: impl Into<String>) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            font,
            size,
            content: content.into(),
        });
    }

    pub fn image(&mut self, x: f32, y: f32, width: f32, height: f32, image: EmbeddedImage) {
        self.ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
            image,
        });
    }

    pub fn add_page(&mut self) {
        self.ops.push(DrawOp::PageBreak);
    }

    pub fn finish(self) -> Document {
        Document { ops: self.ops }
    }
}
