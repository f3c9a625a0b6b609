use anyhow::{Context, Result, anyhow};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use ttf_parser::{Face, GlyphId, name_id};
use usvg::fontdb;

use super::TextBBox;

/// Where a font candidate is loaded from.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSource {
    Path(PathBuf),
    Family(String),
}

impl fmt::Display for FontSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSource::Path(path) => write!(f, "{}", path.display()),
            FontSource::Family(name) => write!(f, "family '{}'", name),
        }
    }
}

/// A typeface plus the pixel size to render it at.
#[derive(Debug, Clone, PartialEq)]
pub struct FontCandidate {
    pub source: FontSource,
    pub size: f32,
}

impl FontCandidate {
    pub fn path(path: impl Into<PathBuf>, size: f32) -> Self {
        Self {
            source: FontSource::Path(path.into()),
            size,
        }
    }

    pub fn family(name: impl Into<String>, size: f32) -> Self {
        Self {
            source: FontSource::Family(name.into()),
            size,
        }
    }
}

#[derive(Clone)]
pub struct FontMetrics {
    data: Arc<Vec<u8>>,
    face_index: u32,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    space_advance: u16,
    family: Option<String>,
}

impl fmt::Debug for FontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontMetrics")
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .field("units_per_em", &self.units_per_em)
            .field("family", &self.family)
            .finish()
    }
}

impl FontMetrics {
    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }
}

/// The font picked from the candidate list.
#[derive(Debug, Clone)]
pub struct ResolvedFont {
    pub metrics: FontMetrics,
    pub family: String,
    pub size: f32,
    pub source: FontSource,
}

impl ResolvedFont {
    fn scale(&self) -> f32 {
        self.size / self.metrics.units_per_em.max(1) as f32
    }

    /// Distance from the ascender line down to the baseline, in pixels.
    pub fn ascent_px(&self) -> f32 {
        self.metrics.ascender as f32 * self.scale()
    }
}

pub fn load_font_metrics(path: &Path) -> Result<FontMetrics> {
    let data =
        std::fs::read(path).with_context(|| format!("failed to read font: {}", path.display()))?;
    load_font_metrics_from_data(data, None)
        .map_err(|err| anyhow!("failed to parse font: {} ({})", path.display(), err))
}

/// Walks the candidates in order and returns the first one that loads.
/// `None` means the generic fallback font should be used.
pub fn resolve_font(candidates: &[FontCandidate]) -> Option<ResolvedFont> {
    let mut db: Option<fontdb::Database> = None;
    for candidate in candidates {
        if !(candidate.size > 0.0) {
            debug!("skipping font {}: size {} is not positive", candidate.source, candidate.size);
            continue;
        }
        let attempt = match &candidate.source {
            FontSource::Path(path) => load_font_metrics(path),
            FontSource::Family(name) => {
                let db = db.get_or_insert_with(system_font_db);
                load_font_metrics_from_family(db, name)
            }
        };
        match attempt {
            Ok(metrics) => {
                let family = metrics
                    .family()
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| fallback_family_name(&candidate.source));
                debug!("using font {} ({}, {}px)", candidate.source, family, candidate.size);
                return Some(ResolvedFont {
                    metrics,
                    family,
                    size: candidate.size,
                    source: candidate.source.clone(),
                });
            }
            Err(err) => debug!("font {} unavailable: {:#}", candidate.source, err),
        }
    }
    None
}

const SANS_SERIF_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Noto Sans", "Arial"];
const SERIF_FAMILIES: &[&str] = &["DejaVu Serif", "Liberation Serif", "Noto Serif", "Times New Roman"];
const MONOSPACE_FAMILIES: &[&str] = &[
    "DejaVu Sans Mono",
    "Liberation Mono",
    "Noto Sans Mono",
    "Courier New",
];

/// System fonts with the generic families pointed at installed faces.
/// fontdb defaults them to Arial, Times New Roman and Courier New, which
/// most Linux machines do not have.
pub(crate) fn system_font_db() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    if let Some(name) = generic_family(&db, SANS_SERIF_FAMILIES) {
        db.set_sans_serif_family(name);
    }
    if let Some(name) = generic_family(&db, SERIF_FAMILIES) {
        db.set_serif_family(name);
    }
    if let Some(name) = generic_family(&db, MONOSPACE_FAMILIES) {
        db.set_monospace_family(name);
    }
    db
}

/// First preferred family that is installed, else the alphabetically first
/// installed family able to draw Latin text.
pub(crate) fn generic_family(db: &fontdb::Database, preferred: &[&str]) -> Option<String> {
    let installed = |name: &str| {
        db.faces().find_map(|face| {
            face.families
                .iter()
                .find(|(family, _)| family.eq_ignore_ascii_case(name))
                .map(|(family, _)| family.clone())
        })
    };
    if let Some(found) = preferred.iter().find_map(|name| installed(*name)) {
        return Some(found);
    }
    db.faces()
        .filter(|face| {
            db.with_face_data(face.id, |data, index| {
                Face::parse(data, index)
                    .map(|face| face.glyph_index('A').is_some())
                    .unwrap_or(false)
            })
            .unwrap_or(false)
        })
        .filter_map(|face| face.families.first().map(|(family, _)| family.clone()))
        .min()
}

/// Ink bounding box of `text`, measured from the pen origin at the
/// ascender line with y pointing down.
pub(crate) fn measure_text_bbox(text: &str, font: &ResolvedFont) -> Option<TextBBox> {
    let metrics = &font.metrics;
    let face = Face::parse(metrics.data(), metrics.face_index).ok()?;

    let mut pen = 0i32;
    let mut ink: Option<(i32, i32, i32, i32)> = None;
    for ch in text.chars() {
        if ch.is_control() {
            continue;
        }
        let glyph = face.glyph_index(ch).unwrap_or(GlyphId(0));
        let advance = face
            .glyph_hor_advance(glyph)
            .unwrap_or(metrics.space_advance);
        if let Some(rect) = face.glyph_bounding_box(glyph) {
            let x0 = pen + rect.x_min as i32;
            let x1 = pen + rect.x_max as i32;
            let y0 = rect.y_min as i32;
            let y1 = rect.y_max as i32;
            ink = Some(match ink {
                Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
                None => (x0, y0, x1, y1),
            });
        }
        pen = pen.saturating_add(advance as i32);
    }

    let ascender = metrics.ascender as i32;
    // Whitespace-only text has no outlines: fall back to the advance box.
    let (x_min, y_min, x_max, y_max) =
        ink.unwrap_or((0, metrics.descender as i32, pen, ascender));
    let scale = font.scale();
    Some(TextBBox {
        left: (x_min as f32 * scale).floor() as i32,
        top: ((ascender - y_max) as f32 * scale).floor() as i32,
        right: (x_max as f32 * scale).ceil() as i32,
        bottom: ((ascender - y_min) as f32 * scale).ceil() as i32,
    })
}

fn load_font_metrics_from_data(data: Vec<u8>, face_index: Option<u32>) -> Result<FontMetrics> {
    let indices = match face_index {
        Some(index) => index..index + 1,
        None => 0..ttf_parser::fonts_in_collection(&data).unwrap_or(1),
    };
    let data = Arc::new(data);
    for index in indices {
        let Ok(face) = Face::parse(&data, index) else {
            continue;
        };
        let units_per_em = face.units_per_em().max(1);
        let space_advance = face
            .glyph_index(' ')
            .and_then(|id| face.glyph_hor_advance(id))
            .unwrap_or(units_per_em / 2);
        return Ok(FontMetrics {
            face_index: index,
            units_per_em,
            ascender: face.ascender(),
            descender: face.descender(),
            space_advance,
            family: extract_family_name(&face),
            data: Arc::clone(&data),
        });
    }
    Err(anyhow!("failed to parse font data"))
}

fn load_font_metrics_from_family(db: &fontdb::Database, family: &str) -> Result<FontMetrics> {
    let families = match family.to_ascii_lowercase().as_str() {
        "sans-serif" => vec![fontdb::Family::SansSerif],
        "serif" => vec![fontdb::Family::Serif],
        "monospace" => vec![fontdb::Family::Monospace],
        _ => vec![fontdb::Family::Name(family)],
    };
    let query = fontdb::Query {
        families: &families,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| anyhow!("font not found: {}", family))?;
    let (data, face_index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| anyhow!("failed to load font data: {}", family))?;
    load_font_metrics_from_data(data, Some(face_index))
}

fn fallback_family_name(source: &FontSource) -> String {
    match source {
        FontSource::Family(name) => name.clone(),
        FontSource::Path(path) => path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("sans-serif")
            .to_string(),
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unreadable_font_files_are_skipped() {
        let dir = tempdir().expect("tempdir");
        let garbage = dir.path().join("broken.ttf");
        std::fs::write(&garbage, b"definitely not a font").expect("write font");

        let candidates = vec![
            FontCandidate::path(dir.path().join("missing.ttf"), 24.0),
            FontCandidate::path(&garbage, 24.0),
        ];
        assert!(resolve_font(&candidates).is_none());
    }

    #[test]
    fn load_font_metrics_reports_the_path() {
        let err = load_font_metrics(Path::new("/nonexistent/font.ttf")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/font.ttf"));
    }

    #[test]
    fn family_names_are_used_when_a_face_has_none() {
        assert_eq!(
            fallback_family_name(&FontSource::Path(PathBuf::from("/fonts/Foo-Regular.ttf"))),
            "Foo-Regular"
        );
        assert_eq!(
            fallback_family_name(&FontSource::Family("Bar".to_string())),
            "Bar"
        );
    }

    #[test]
    fn generic_families_point_at_installed_fonts() {
        let db = system_font_db();
        let Some(expected) = generic_family(&db, SANS_SERIF_FAMILIES) else {
            return;
        };
        assert_eq!(db.family_name(&fontdb::Family::SansSerif), expected);

        let resolved = resolve_font(&[FontCandidate::family("sans-serif", 24.0)])
            .expect("sans-serif resolves to an installed face");
        assert_eq!(resolved.size, 24.0);
        assert_eq!(resolved.source, FontSource::Family("sans-serif".to_string()));
    }

    #[test]
    fn preferred_generic_family_wins_when_installed() {
        let db = system_font_db();
        let Some(first_installed) = db
            .faces()
            .find_map(|face| face.families.first().map(|(name, _)| name.clone()))
        else {
            return;
        };
        let preferred = ["No Such Family", first_installed.as_str()];
        assert_eq!(generic_family(&db, &preferred), Some(first_installed.clone()));
    }

    #[test]
    fn non_positive_sizes_never_resolve() {
        let candidates = vec![FontCandidate::family("sans-serif", 0.0)];
        assert!(resolve_font(&candidates).is_none());
    }
}
