use anyhow::{Context, Result, anyhow};
use image::{ImageFormat, RgbaImage};
use resvg::render;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::Pixmap;
use tracing::{debug, info};
use usvg::{Options, Tree, fontdb};

use crate::error::AppError;
use crate::label::{LabelConfig, Layout, system_font_db};

const FALLBACK_FAMILY: &str = "sans-serif";

/// Draws `text` at the computed layout and writes the image to `path`, in
/// the format implied by its extension.
pub fn render_to_file(
    text: &str,
    layout: &Layout,
    config: &LabelConfig,
    path: &Path,
) -> Result<(), AppError> {
    let format = output_format(path).map_err(AppError::RenderFailure)?;
    let svg = build_svg(text, layout, config);
    let image = rasterize(&svg, layout).map_err(AppError::RenderFailure)?;
    let rgb = image::DynamicImage::ImageRgba8(image).to_rgb8();
    rgb.save_with_format(path, format)
        .with_context(|| format!("failed to write image: {}", path.display()))
        .map_err(AppError::RenderFailure)?;
    info!(
        "wrote {}x{} {:?} image to {}",
        rgb.width(),
        rgb.height(),
        format,
        path.display()
    );
    Ok(())
}

pub fn build_svg(text: &str, layout: &Layout, config: &LabelConfig) -> String {
    let (x, y) = layout.baseline();
    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = config.canvas_width,
        h = config.canvas_height
    ));
    svg.push_str(&format!(
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{fill}"/>"#,
        w = config.canvas_width,
        h = config.canvas_height,
        fill = escape_xml(&config.background)
    ));
    match &layout.font {
        Some(font) => svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{size}" font-family="{family}" fill="{color}" xml:space="preserve">"#,
            x = x,
            y = y,
            size = font.size,
            family = escape_xml(&font.family),
            color = escape_xml(&config.foreground)
        )),
        None => svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-family="{family}" fill="{color}" xml:space="preserve">"#,
            x = x,
            y = y,
            family = FALLBACK_FAMILY,
            color = escape_xml(&config.foreground)
        )),
    }
    svg.push_str(&escape_xml(text));
    svg.push_str("</text></svg>");
    svg
}

fn rasterize(svg: &str, layout: &Layout) -> Result<RgbaImage> {
    let db = match &layout.font {
        Some(font) => {
            let mut db = fontdb::Database::new();
            db.load_font_data(font.metrics.data().to_vec());
            db
        }
        None => {
            let db = system_font_db();
            debug!(
                "no font resolved; rendering {} as {}",
                FALLBACK_FAMILY,
                db.family_name(&fontdb::Family::SansSerif)
            );
            db
        }
    };
    let options = Options {
        fontdb: Arc::new(db),
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    RgbaImage::from_raw(size.width(), size.height(), pixmap.take())
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))
}

fn output_format(path: &Path) -> Result<ImageFormat> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| anyhow!("unsupported image format: {}", path.display()))?;
    if !format.writing_enabled() {
        return Err(anyhow!(
            "writing {:?} images is not supported: {}",
            format,
            path.display()
        ));
    }
    Ok(format)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
