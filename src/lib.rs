use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

mod error;
pub mod label;
pub mod logging;
pub mod ocr;
pub mod render;
pub mod settings;
#[cfg(test)]
mod test_util;

pub use error::AppError;
pub use label::{FontCandidate, LabelConfig, Layout, layout};
pub use ocr::{Recognizer, TesseractCli};
pub use settings::Settings;

pub const SEPARATOR: &str = "----------------";
pub const NO_TEXT_DETECTED: &str = "(No text detected)";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub text: String,
    pub filename: String,
    pub settings_path: Option<String>,
    pub ocr_languages: Option<String>,
}

/// What a successful run prints to stdout.
#[derive(Debug, Clone)]
pub struct Report {
    pub image_path: PathBuf,
    pub text: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generated image: {}", self.image_path.display())?;
        writeln!(f, "Extracted Text:")?;
        writeln!(f, "{}", SEPARATOR)?;
        if self.text.is_empty() {
            write!(f, "{}", NO_TEXT_DETECTED)
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// Validates the arguments, loads settings and runs the pipeline with the
/// configured tesseract executable.
pub fn run(config: Config) -> Result<Report, AppError> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path).map_err(AppError::Settings)?;
    let mut recognizer = settings.recognizer();
    if let Some(languages) = config.ocr_languages.as_deref() {
        recognizer.languages = languages.to_string();
    }
    run_with(&config, &settings, &recognizer)
}

pub fn run_with<R: Recognizer>(
    config: &Config,
    settings: &Settings,
    recognizer: &R,
) -> Result<Report, AppError> {
    validate(config)?;
    let path = Path::new(&config.filename);

    let label = settings.label_config(&config.text);
    let layout = label.layout(&config.text);
    render::render_to_file(&config.text, &layout, &label, path)?;
    info!("generated image: {}", path.display());

    let text = recognizer.recognize(path)?;
    Ok(Report {
        image_path: path.to_path_buf(),
        text,
    })
}

fn validate(config: &Config) -> Result<(), AppError> {
    if config.text.trim().is_empty() {
        return Err(AppError::invalid_argument("Text cannot be empty."));
    }
    if config.filename.trim().is_empty() {
        return Err(AppError::invalid_argument(
            "Output filename cannot be empty.",
        ));
    }
    Ok(())
}
