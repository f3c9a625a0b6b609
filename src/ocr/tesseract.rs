use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use super::{Recognizer, check_image};
use crate::error::AppError;

/// Runs the `tesseract` executable and reads the text it prints.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    pub command: PathBuf,
    pub languages: String,
    pub psm: u32,
    pub dpi: Option<u32>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            languages: "eng".to_string(),
            psm: 3,
            dpi: Some(300),
        }
    }
}

impl TesseractCli {
    pub fn list_languages(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.command)
            .arg("--list-langs")
            .output()
            .with_context(|| format!("failed to run {} --list-langs", self.command.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut langs = Vec::new();
        for (idx, line) in stdout.lines().enumerate() {
            if idx == 0 {
                continue;
            }
            let value = line.trim();
            if !value.is_empty() {
                langs.push(value.to_string());
            }
        }
        Ok(langs)
    }

    fn normalize_languages(&self) -> Result<String> {
        let trimmed = self.languages.trim();
        if trimmed.is_empty() {
            return Err(anyhow!("ocr languages is empty"));
        }

        let available = match self.list_languages() {
            Ok(list) => list,
            Err(err) => {
                debug!("could not list tesseract languages: {:#}", err);
                return Ok(trimmed.to_string());
            }
        };

        let mut chosen = Vec::new();
        let mut missing = Vec::new();
        for raw in trimmed.split(['+', ',', ' ']) {
            let lang = raw.trim();
            if lang.is_empty() {
                continue;
            }
            if available.iter().any(|value| value == lang) {
                chosen.push(lang.to_string());
            } else {
                missing.push(lang.to_string());
            }
        }

        if chosen.is_empty() {
            return Err(anyhow!(
                "ocr language(s) not available: {} (available: {})",
                missing.join(", "),
                available.join(", ")
            ));
        }
        if !missing.is_empty() {
            warn!(
                "ocr language(s) not available: {} (available: {})",
                missing.join(", "),
                available.join(", ")
            );
        }

        Ok(chosen.join("+"))
    }

    fn run(&self, path: &Path, languages: &str) -> Result<String> {
        let mut command = Command::new(&self.command);
        command
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(languages)
            .arg("--psm")
            .arg(self.psm.to_string());
        if let Some(dpi) = self.dpi {
            command.arg("--dpi").arg(dpi.to_string());
        }
        let output = command
            .output()
            .with_context(|| format!("failed to run {} (is it installed?)", self.command.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Recognizer for TesseractCli {
    fn recognize(&self, image_path: &Path) -> Result<String, AppError> {
        let (width, height) = check_image(image_path)?;
        debug!("running OCR on {}x{} image {}", width, height, image_path.display());

        let languages = self
            .normalize_languages()
            .map_err(AppError::RecognitionFailure)?;
        let text = self
            .run(image_path, &languages)
            .map_err(AppError::RecognitionFailure)?;
        let text = text.trim().to_string();
        info!("recognized {} characters", text.chars().count());
        Ok(text)
    }
}
