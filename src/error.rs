use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds surfaced to the user. Each one ends the process with
/// status 1 after a single `Error: ...` line on stderr.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error("failed to load settings: {0:#}")]
    Settings(anyhow::Error),
    #[error("failed to generate image: {0:#}")]
    RenderFailure(anyhow::Error),
    #[error("Image file '{}' not found.", .0.display())]
    MissingFile(PathBuf),
    #[error("failed during OCR processing: {0:#}")]
    RecognitionFailure(anyhow::Error),
}

impl AppError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        AppError::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};

    #[test]
    fn render_failure_prints_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow!("disk full"));
        let err = err.context("failed to write image: out.png").unwrap_err();
        let message = AppError::RenderFailure(err).to_string();
        assert_eq!(
            message,
            "failed to generate image: failed to write image: out.png: disk full"
        );
    }

    #[test]
    fn missing_file_names_the_path() {
        let message = AppError::MissingFile(PathBuf::from("gone.png")).to_string();
        assert_eq!(message, "Image file 'gone.png' not found.");
    }
}
