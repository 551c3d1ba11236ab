//! PDF serialization of a [`Document`] with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat};
use thiserror::Error;

use super::document::{ColorSpace, Document, DrawOp, EmbeddedImage, Font, StreamFilter};
use super::layout::{PAGE_HEIGHT_MM, PAGE_WIDTH_MM};

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const DOCUMENT_TITLE: &str = "Relatório de Obra";
const PRODUCER: &str = concat!("obra-report-server ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to encode page content: {0}")]
    Content(#[source] lopdf::Error),
    #[error("failed to write PDF: {0}")]
    Write(String),
}

fn pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

fn real(v: f32) -> Object {
    Object::from(v)
}

fn name(n: &str) -> Object {
    Object::Name(n.as_bytes().to_vec())
}

/// Map text to WinAnsiEncoding bytes; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}

/// UTF-16BE text string with BOM, used for document metadata.
fn text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn font_dictionary(font: Font) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", name("Font")),
        ("Subtype", name("Type1")),
        ("BaseFont", name(font.base_font())),
        ("Encoding", name("WinAnsiEncoding")),
    ])
}

fn image_stream(image: &EmbeddedImage) -> Stream {
    let color_space = match image.color_space {
        ColorSpace::DeviceRgb => "DeviceRGB",
        ColorSpace::DeviceGray => "DeviceGray",
    };
    let filter = match image.filter {
        StreamFilter::DctDecode => "DCTDecode",
        StreamFilter::FlateDecode => "FlateDecode",
    };
    let dict = Dictionary::from_iter(vec![
        ("Type", name("XObject")),
        ("Subtype", name("Image")),
        ("Width", Object::Integer(image.pixel_width as i64)),
        ("Height", Object::Integer(image.pixel_height as i64)),
        ("ColorSpace", name(color_space)),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", name(filter)),
    ]);
    // Already encoded; lopdf must not compress it a second time.
    Stream::new(dict, image.data.clone()).with_compression(false)
}

impl Document {
    /// Serialize to PDF bytes (A4 pages, Helvetica text).
    pub fn to_pdf(&self) -> Result<Vec<u8>, PdfError> {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let mut fonts = Dictionary::new();
        for font in [Font::Helvetica, Font::HelveticaBold] {
            let font_id = pdf.add_object(font_dictionary(font));
            fonts.set(font.resource_name(), Object::Reference(font_id));
        }

        let page_height = pt(PAGE_HEIGHT_MM);
        let mut page_ids: Vec<ObjectId> = Vec::new();
        let mut image_counter = 0usize;

        for page_ops in self.pages() {
            let mut operations = Vec::new();
            let mut xobjects = Dictionary::new();

            for op in page_ops {
                match op {
                    DrawOp::Text {
                        x,
                        y,
                        font,
                        size,
                        content,
                    } => {
                        operations.push(Operation::new("BT", vec![]));
                        operations.push(Operation::new(
                            "Tf",
                            vec![name(font.resource_name()), real(*size)],
                        ));
                        operations.push(Operation::new(
                            "Td",
                            vec![real(pt(*x)), real(page_height - pt(*y))],
                        ));
                        operations.push(Operation::new(
                            "Tj",
                            vec![Object::String(encode_win_ansi(content), StringFormat::Literal)],
                        ));
                        operations.push(Operation::new("ET", vec![]));
                    }
                    DrawOp::Image {
                        x,
                        y,
                        width,
                        height,
                        image,
                    } => {
                        image_counter += 1;
                        let resource = format!("Im{}", image_counter);
                        let image_id = pdf.add_object(image_stream(image));
                        xobjects.set(resource.as_str(), Object::Reference(image_id));

                        operations.push(Operation::new("q", vec![]));
                        operations.push(Operation::new(
                            "cm",
                            vec![
                                real(pt(*width)),
                                real(0.0),
                                real(0.0),
                                real(pt(*height)),
                                real(pt(*x)),
                                real(page_height - pt(*y) - pt(*height)),
                            ],
                        ));
                        operations.push(Operation::new("Do", vec![name(&resource)]));
                        operations.push(Operation::new("Q", vec![]));
                    }
                    DrawOp::PageBreak => {}
                }
            }

            let content = Content { operations };
            let content_id = pdf.add_object(Stream::new(
                Dictionary::new(),
                content.encode().map_err(PdfError::Content)?,
            ));

            let mut resources = Dictionary::new();
            resources.set("Font", Object::Dictionary(fonts.clone()));
            if xobjects.len() > 0 {
                resources.set("XObject", Object::Dictionary(xobjects));
            }

            let page = Dictionary::from_iter(vec![
                ("Type", name("Page")),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        real(pt(PAGE_WIDTH_MM)),
                        real(page_height),
                    ]),
                ),
                ("Resources", Object::Dictionary(resources)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(pdf.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", name("Pages")),
            ("Count", Object::Integer(page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        pdf.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = pdf.add_object(Dictionary::from_iter(vec![
            ("Type", name("Catalog")),
            ("Pages", Object::Reference(pages_id)),
        ]));
        let info_id = pdf.add_object(Dictionary::from_iter(vec![
            ("Title", text_string(DOCUMENT_TITLE)),
            ("Producer", text_string(PRODUCER)),
        ]));
        pdf.trailer.set("Root", Object::Reference(catalog_id));
        pdf.trailer.set("Info", Object::Reference(info_id));

        let mut buffer = Vec::new();
        pdf.save_to(&mut buffer)
            .map_err(|e| PdfError::Write(e.to_string()))?;
        Ok(buffer)
    }
}
