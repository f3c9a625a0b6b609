//! Centers a single line of text on a fixed-size canvas.
//!
//! The layout is pure geometry: it picks a font from an ordered candidate
//! list, measures the text and computes where drawing has to start. Drawing
//! itself lives in [`crate::render`].

mod font;

use tracing::debug;

pub use font::{FontCandidate, FontMetrics, FontSource, ResolvedFont, load_font_metrics, resolve_font};
pub(crate) use font::system_font_db;

pub const DEFAULT_CANVAS_WIDTH: u32 = 800;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 200;

/// Pixel rectangle a rendered string occupies, relative to the pen origin
/// at the ascender line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl TextBBox {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Geometry estimate used when no font could be measured. Rough on purpose;
/// proportional or non-Latin text will sit visibly off-center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackMetrics {
    pub char_width: u32,
    pub text_height: u32,
}

impl Default for FallbackMetrics {
    fn default() -> Self {
        Self {
            char_width: 10,
            text_height: 20,
        }
    }
}

impl FallbackMetrics {
    fn estimate(&self, text: &str) -> TextBBox {
        let chars = text.chars().count() as i64;
        let width = (chars * self.char_width as i64).min(i32::MAX as i64) as i32;
        TextBBox {
            left: 0,
            top: 0,
            right: width,
            bottom: self.text_height as i32,
        }
    }
}

/// Everything the label needs besides the text itself.
#[derive(Debug, Clone)]
pub struct LabelConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub font_candidates: Vec<FontCandidate>,
    pub background: String,
    pub foreground: String,
    pub fallback: FallbackMetrics,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            font_candidates: Vec::new(),
            background: "white".to_string(),
            foreground: "black".to_string(),
            fallback: FallbackMetrics::default(),
        }
    }
}

impl LabelConfig {
    pub fn layout(&self, text: &str) -> Layout {
        layout_with(
            text,
            self.canvas_width,
            self.canvas_height,
            &self.font_candidates,
            &self.fallback,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    /// `None` when every candidate failed and the generic font is used.
    pub font: Option<ResolvedFont>,
    pub bbox: TextBBox,
    pub origin_x: i32,
    pub origin_y: i32,
}

impl Layout {
    /// Pen position for the first glyph's baseline, placing the ink box at
    /// the origin.
    pub fn baseline(&self) -> (f32, f32) {
        match &self.font {
            Some(font) => (
                (self.origin_x - self.bbox.left) as f32,
                (self.origin_y - self.bbox.top) as f32 + font.ascent_px(),
            ),
            None => (
                self.origin_x as f32,
                (self.origin_y + self.bbox.height()) as f32,
            ),
        }
    }
}

pub fn layout(
    text: &str,
    canvas_width: u32,
    canvas_height: u32,
    font_candidates: &[FontCandidate],
) -> Layout {
    layout_with(
        text,
        canvas_width,
        canvas_height,
        font_candidates,
        &FallbackMetrics::default(),
    )
}

pub fn layout_with(
    text: &str,
    canvas_width: u32,
    canvas_height: u32,
    font_candidates: &[FontCandidate],
    fallback: &FallbackMetrics,
) -> Layout {
    let font = resolve_font(font_candidates);
    let bbox = font
        .as_ref()
        .and_then(|font| font::measure_text_bbox(text, font))
        .unwrap_or_else(|| fallback.estimate(text));
    let origin_x = center(canvas_width, bbox.width());
    let origin_y = center(canvas_height, bbox.height());
    debug!(
        "text box {}x{} on {}x{} canvas, origin ({}, {})",
        bbox.width(),
        bbox.height(),
        canvas_width,
        canvas_height,
        origin_x,
        origin_y
    );
    Layout {
        font,
        bbox,
        origin_x,
        origin_y,
    }
}

/// Floor division, so oversized text gets the same negative origin as
/// rounding toward negative infinity would give.
fn center(canvas: u32, extent: i32) -> i32 {
    (canvas as i64 - extent as i64).div_euclid(2) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use usvg::fontdb;

    fn first_system_family() -> Option<String> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        db.faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
    }

    #[test]
    fn centers_heuristic_box_without_fonts() {
        let layout = layout("Hello", 800, 200, &[]);
        assert!(layout.font.is_none());
        assert_eq!(
            layout.bbox,
            TextBBox {
                left: 0,
                top: 0,
                right: 50,
                bottom: 20
            }
        );
        assert_eq!((layout.origin_x, layout.origin_y), (375, 90));
        assert_eq!(layout.baseline(), (375.0, 110.0));
    }

    #[test]
    fn missing_candidates_fall_back_in_order() {
        let candidates = vec![
            FontCandidate::path("/nonexistent/a.ttf", 24.0),
            FontCandidate::path("/nonexistent/b.ttf", 24.0),
        ];
        let first = layout("abc", 800, 200, &candidates);
        let second = layout("abc", 800, 200, &candidates);
        assert!(first.font.is_none());
        assert_eq!(first.bbox, second.bbox);
        assert_eq!(
            (first.origin_x, first.origin_y),
            (second.origin_x, second.origin_y)
        );
    }

    #[test]
    fn oversized_text_gets_floored_negative_origin() {
        let text = "x".repeat(100);
        let layout = layout(&text, 801, 11, &[]);
        assert_eq!(layout.bbox.width(), 1000);
        assert_eq!(layout.origin_x, -100);
        assert_eq!(layout.origin_y, -5);
    }

    #[test]
    fn fallback_metrics_are_tunable() {
        let fallback = FallbackMetrics {
            char_width: 15,
            text_height: 30,
        };
        let layout = layout_with("abcd", 400, 100, &[], &fallback);
        assert_eq!(layout.bbox.width(), 60);
        assert_eq!((layout.origin_x, layout.origin_y), (170, 35));
    }

    #[test]
    fn heuristic_counts_characters_not_bytes() {
        let layout = layout("日本語", 800, 200, &[]);
        assert_eq!(layout.bbox.width(), 30);
    }

    #[test]
    fn measured_text_is_centered_within_a_pixel() {
        let Some(family) = first_system_family() else {
            return;
        };
        let candidates = vec![FontCandidate::family(family, 24.0)];
        let layout = layout("Hello from Copilot!", 800, 200, &candidates);
        let Some(font) = layout.font.as_ref() else {
            return;
        };
        assert_eq!(font.size, 24.0);
        assert!(layout.bbox.width() > 0);
        assert!(layout.bbox.height() > 0);
        assert!((layout.origin_x * 2 + layout.bbox.width() - 800).abs() <= 1);
        assert!((layout.origin_y * 2 + layout.bbox.height() - 200).abs() <= 1);

        let again = super::layout("Hello from Copilot!", 800, 200, &candidates);
        assert_eq!(again.bbox, layout.bbox);
        assert_eq!(again.font.map(|font| font.family), Some(font.family.clone()));
    }

    #[test]
    fn whitespace_only_text_still_has_a_box() {
        let Some(family) = first_system_family() else {
            return;
        };
        let layout = layout("   ", 800, 200, &[FontCandidate::family(family, 24.0)]);
        if layout.font.is_none() {
            return;
        }
        assert!(layout.bbox.height() > 0);
    }
}
