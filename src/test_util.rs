use std::path::Path;

use crate::label::{FontCandidate, resolve_font};

/// Inclusive `(min_x, min_y, max_x, max_y)` of pixels darker than mid-grey.
pub(crate) fn dark_pixel_bounds(path: &Path) -> Option<(u32, u32, u32, u32)> {
    let image = image::open(path).expect("open image").to_luma8();
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[0] >= 128 {
            continue;
        }
        bounds = Some(match bounds {
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            None => (x, y, x, y),
        });
    }
    bounds
}

/// A `sans-serif` candidate, if the machine has any font it can map to.
pub(crate) fn sans_serif_candidate(size: f32) -> Option<FontCandidate> {
    let candidate = FontCandidate::family("sans-serif", size);
    resolve_font(std::slice::from_ref(&candidate)).map(|_| candidate)
}
