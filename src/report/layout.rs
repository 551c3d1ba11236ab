//! Page layout constants.
//!
//! Units are millimetres on an A4 page with the origin at the top-left
//! corner. Text positions are baselines; image positions are the top edge.

/// A4 page size in millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

pub const LEFT_MARGIN: f32 = 14.0;
pub const TITLE_Y: f32 = 20.0;
pub const TITLE_FONT_SIZE: f32 = 18.0;
pub const BODY_FONT_SIZE: f32 = 12.0;
pub const FIRST_FIELD_Y: f32 = 40.0;
pub const LINE_HEIGHT: f32 = 10.0;
pub const IMAGE_GAP: f32 = 15.0;
pub const IMAGE_MAX_WIDTH: f32 = 180.0;
pub const IMAGE_MAX_HEIGHT: f32 = 150.0;
pub const PAGE_BREAK_Y: f32 = 280.0;
pub const TOP_MARGIN: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub left_margin: f32,
    pub title_y: f32,
    pub title_font_size: f32,
    pub body_font_size: f32,
    pub first_field_y: f32,
    pub line_height: f32,
    /// Cursor advance after the image-presence line.
    pub image_gap: f32,
    pub image_max_width: f32,
    pub image_max_height: f32,
    /// Lowest offset an image may reach before a page break is forced.
    pub page_break_y: f32,
    /// Cursor position on a freshly started page.
    pub top_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left_margin: LEFT_MARGIN,
            title_y: TITLE_Y,
            title_font_size: TITLE_FONT_SIZE,
            body_font_size: BODY_FONT_SIZE,
            first_field_y: FIRST_FIELD_Y,
            line_height: LINE_HEIGHT,
            image_gap: IMAGE_GAP,
            image_max_width: IMAGE_MAX_WIDTH,
            image_max_height: IMAGE_MAX_HEIGHT,
            page_break_y: PAGE_BREAK_Y,
            top_margin: TOP_MARGIN,
        }
    }
}

/// Rendered size of an image inside the bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledSize {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl LayoutConfig {
    /// Uniform scale that fits `width x height` pixels into the image box.
    pub fn fit_image(&self, width: u32, height: u32) -> ScaledSize {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let scale = (self.image_max_width / w).min(self.image_max_height / h);
        ScaledSize {
            width: w * scale,
            height: h * scale,
            scale,
        }
    }

    /// Whether an image of `height` placed at `cursor` runs past the page.
    pub fn needs_page_break(&self, cursor: f32, height: f32) -> bool {
        cursor + height > self.page_break_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_wide_image_is_width_bound() {
        let layout = LayoutConfig::default();
        let size = layout.fit_image(1600, 900);
        assert!(approx(size.width, 180.0));
        assert!(approx(size.height, 180.0 * 900.0 / 1600.0));
    }

    #[test]
    fn test_tall_image_is_height_bound() {
        let layout = LayoutConfig::default();
        let size = layout.fit_image(600, 1200);
        assert!(approx(size.height, 150.0));
        assert!(approx(size.width, 75.0));
    }

    #[test]
    fn test_aspect_ratio_preserved_for_small_images() {
        let layout = LayoutConfig::default();
        let size = layout.fit_image(36, 30);
        assert!(size.width <= 180.0 + 1e-3 && size.height <= 150.0 + 1e-3);
        assert!(approx(size.width / size.height, 36.0 / 30.0));
    }

    #[test]
    fn test_page_break_threshold() {
        let layout = LayoutConfig::default();
        assert!(!layout.needs_page_break(130.0, 150.0));
        assert!(layout.needs_page_break(130.1, 150.0));
    }
}
