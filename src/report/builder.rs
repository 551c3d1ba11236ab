//! Report builder.
//!
//! Writes the title, the labeled fields and, when an image is held, the
//! scaled photo. A photo that cannot be decoded does not abort the build:
//! the document is returned without it and the failure is reported as a
//! warning.

use super::document::{Document, DocumentWriter, EmbeddedImage, Font};
use super::input::ReportInput;
use super::layout::LayoutConfig;
use crate::photo::{prepare_attachment, ImageDecodeError};

#[derive(Debug)]
pub struct BuiltReport {
    pub document: Document,
    pub neighborhood: String,
    pub image_warning: Option<ImageDecodeError>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    layout: LayoutConfig,
}

impl ReportBuilder {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub async fn build(&self, input: &ReportInput) -> BuiltReport {
        let mut writer = DocumentWriter::new();
        let mut cursor = self.write_fields(&mut writer, input);

        let mut image_warning = None;
        if let Some(attachment) = &input.image {
            match prepare_attachment(attachment.clone()).await {
                Ok(embedded) => {
                    cursor = self.place_image(&mut writer, cursor, embedded);
                    log::debug!("Image placed, cursor at {:.1}", cursor);
                }
                Err(e) => {
                    log::warn!("Report image skipped: {}", e);
                    image_warning = Some(e);
                }
            }
        }

        BuiltReport {
            document: writer.finish(),
            neighborhood: input.neighborhood.clone(),
            image_warning,
        }
    }

    /// Title and labeled lines; returns the cursor below them.
    fn write_fields(&self, writer: &mut DocumentWriter, input: &ReportInput) -> f32 {
        let layout = &self.layout;
        writer.text(
            layout.left_margin,
            layout.title_y,
            Font::HelveticaBold,
            layout.title_font_size,
            format!("Relatório de Obra Concluída {}", input.neighborhood),
        );

        let lines = [
            format!("Bairro: {}", input.neighborhood),
            format!("Rua: {}", input.street),
            format!("Complemento: {}", input.complement),
            format!("Descrição: {}", input.description),
            format!("Hora do Registro: {}", input.registered_at),
        ];

        let mut y = layout.first_field_y;
        for line in lines {
            writer.text(layout.left_margin, y, Font::Helvetica, layout.body_font_size, line);
            y += layout.line_height;
        }

        let attached = if input.image.is_some() { "Sim" } else { "Não" };
        writer.text(
            layout.left_margin,
            y,
            Font::Helvetica,
            layout.body_font_size,
            format!("Imagem anexada: {}", attached),
        );
        y + layout.image_gap
    }

    fn place_image(&self, writer: &mut DocumentWriter, cursor: f32, image: EmbeddedImage) -> f32 {
        let size = self.layout.fit_image(image.pixel_width, image.pixel_height);
        let mut y = cursor;
        if self.layout.needs_page_break(y, size.height) {
            writer.add_page();
            y = self.layout.top_margin;
        }
        writer.image(self.layout.left_margin, y, size.width, size.height, image);
        y + size.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::{test_images, ImageAttachment, ImageUpload};
    use crate::report::document::DrawOp;
    use crate::report::input::ReportFields;

    fn input(image: Option<ImageAttachment>) -> ReportInput {
        let fields = ReportFields {
            neighborhood: "Vila Nova".into(),
            street: "rua sete".into(),
            complement: "Casa 2".into(),
            description: "Meio-fio".into(),
        };
        ReportInput::new(&fields, "05/05/2026, 08:00:00", image).unwrap()
    }

    fn image(bytes: Vec<u8>, mime: &str) -> Option<ImageAttachment> {
        Some(ImageAttachment::from_upload(ImageUpload::new(bytes, mime, "foto")))
    }

    #[tokio::test]
    async fn test_text_only_report() {
        let built = ReportBuilder::default().build(&input(None)).await;

        assert_eq!(
            built.document.text_lines(),
            vec![
                "Relatório de Obra Concluída Vila Nova",
                "Bairro: Vila Nova",
                "Rua: RUA SETE",
                "Complemento: Casa 2",
                "Descrição: Meio-fio",
                "Hora do Registro: 05/05/2026, 08:00:00",
                "Imagem anexada: Não",
            ]
        );
        assert_eq!(built.neighborhood, "Vila Nova");
        assert!(built.image_warning.is_none());
        assert_eq!(built.document.page_count(), 1);
    }

    #[tokio::test]
    async fn test_wide_image_placed_below_fields() {
        let built = ReportBuilder::default()
            .build(&input(image(test_images::png(360, 100), "image/png")))
            .await;

        let placed = built.document.ops().iter().find_map(|op| match op {
            DrawOp::Image { x, y, width, height, .. } => Some((*x, *y, *width, *height)),
            _ => None,
        });
        let (x, y, width, height) = placed.unwrap();
        assert_eq!(x, 14.0);
        // 40 + 5 lines * 10 + 15 after the indicator line
        assert_eq!(y, 105.0);
        assert!((width - 180.0).abs() < 1e-3);
        assert!((height - 50.0).abs() < 1e-3);
        assert_eq!(built.document.page_count(), 1);
    }

    #[tokio::test]
    async fn test_tall_image_forces_page_break() {
        // With the default geometry a 150 mm photo ends at 255 mm, so lower
        // the limit to make the placement overflow.
        let layout = LayoutConfig {
            page_break_y: 200.0,
            ..LayoutConfig::default()
        };
        let built = ReportBuilder::new(layout)
            .build(&input(image(test_images::png(100, 300), "image/png")))
            .await;

        let ops = built.document.ops();
        let break_at = ops.iter().position(|op| matches!(op, DrawOp::PageBreak)).unwrap();
        match &ops[break_at + 1] {
            DrawOp::Image { y, height, .. } => {
                assert_eq!(*y, 20.0);
                assert!((height - 150.0).abs() < 1e-3);
            }
            other => panic!("expected image after page break, got {:?}", other),
        }
        assert_eq!(built.document.page_count(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_a_warning() {
        let built = ReportBuilder::default()
            .build(&input(image(b"broken".to_vec(), "image/jpeg")))
            .await;

        assert!(built.image_warning.is_some());
        assert!(!built.document.has_image());
        assert!(built.document.text_lines().contains(&"Imagem anexada: Sim"));
    }

    #[tokio::test]
    async fn test_custom_layout_is_respected() {
        let layout = LayoutConfig {
            line_height: 8.0,
            ..LayoutConfig::default()
        };
        let built = ReportBuilder::new(layout).build(&input(None)).await;
        let ys: Vec<f32> = built
            .document
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys, vec![20.0, 40.0, 48.0, 56.0, 64.0, 72.0, 80.0]);
    }
}
