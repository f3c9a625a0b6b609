mod tesseract;

use std::path::Path;

use crate::error::AppError;

pub use tesseract::TesseractCli;

/// Turns an image file into the text it shows.
pub trait Recognizer {
    fn recognize(&self, image_path: &Path) -> Result<String, AppError>;
}

/// Rejects paths that do not point at a readable image before any engine
/// is invoked.
pub(crate) fn check_image(image_path: &Path) -> Result<(u32, u32), AppError> {
    if !image_path.exists() {
        return Err(AppError::MissingFile(image_path.to_path_buf()));
    }
    image::image_dimensions(image_path)
        .map_err(|err| {
            AppError::RecognitionFailure(anyhow::Error::new(err).context(format!(
                "failed to read image: {}",
                image_path.display()
            )))
        })
}
