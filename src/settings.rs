use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::label::{FallbackMetrics, FontCandidate, LabelConfig};
use crate::ocr::TesseractCli;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub grow_per_char: Option<u32>,
    pub background: String,
    pub foreground: String,
    pub fonts: Vec<FontCandidate>,
    pub fallback: FallbackMetrics,
    pub ocr_command: PathBuf,
    pub ocr_languages: String,
    pub ocr_psm: u32,
    pub ocr_dpi: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        let label = LabelConfig::default();
        let ocr = TesseractCli::default();
        Self {
            canvas_width: label.canvas_width,
            canvas_height: label.canvas_height,
            grow_per_char: None,
            background: label.background,
            foreground: label.foreground,
            fonts: label.font_candidates,
            fallback: label.fallback,
            ocr_command: ocr.command,
            ocr_languages: ocr.languages,
            ocr_psm: ocr.psm,
            ocr_dpi: ocr.dpi,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    canvas: Option<CanvasSettings>,
    fonts: Option<Vec<FontEntry>>,
    fallback: Option<FallbackSettings>,
    ocr: Option<OcrSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct CanvasSettings {
    width: Option<u32>,
    height: Option<u32>,
    background: Option<String>,
    foreground: Option<String>,
    grow_per_char: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FontEntry {
    path: Option<String>,
    family: Option<String>,
    size: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct FallbackSettings {
    char_width: Option<u32>,
    text_height: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    command: Option<String>,
    languages: Option<String>,
    psm: Option<u32>,
    dpi: Option<u32>,
}

/// Embedded defaults, then `extra_path` on top when given.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    let defaults: SettingsFile =
        toml::from_str(DEFAULT_SETTINGS_TOML).with_context(|| "failed to parse default settings")?;
    settings.merge(defaults);

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        let content = fs::read_to_string(extra)
            .with_context(|| format!("failed to read settings: {}", extra.display()))?;
        let parsed: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings: {}", extra.display()))?;
        settings.merge(parsed);
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(canvas) = incoming.canvas {
            if let Some(width) = canvas.width.filter(|value| *value > 0) {
                self.canvas_width = width;
            }
            if let Some(height) = canvas.height.filter(|value| *value > 0) {
                self.canvas_height = height;
            }
            if let Some(color) = canvas.background {
                if !color.trim().is_empty() {
                    self.background = color;
                }
            }
            if let Some(color) = canvas.foreground {
                if !color.trim().is_empty() {
                    self.foreground = color;
                }
            }
            if let Some(grow) = canvas.grow_per_char {
                self.grow_per_char = (grow > 0).then_some(grow);
            }
        }
        if let Some(entries) = incoming.fonts {
            let fonts: Vec<FontCandidate> = entries
                .into_iter()
                .filter_map(FontEntry::into_candidate)
                .collect();
            if !fonts.is_empty() {
                self.fonts = fonts;
            }
        }
        if let Some(fallback) = incoming.fallback {
            if let Some(width) = fallback.char_width.filter(|value| *value > 0) {
                self.fallback.char_width = width;
            }
            if let Some(height) = fallback.text_height.filter(|value| *value > 0) {
                self.fallback.text_height = height;
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(command) = ocr.command {
                if !command.trim().is_empty() {
                    self.ocr_command = PathBuf::from(command.trim());
                }
            }
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
            if let Some(dpi) = ocr.dpi {
                self.ocr_dpi = (dpi > 0).then_some(dpi);
            }
        }
    }

    /// Label configuration for `text`; the canvas widens with the text when
    /// `grow_per_char` is set.
    pub fn label_config(&self, text: &str) -> LabelConfig {
        let mut canvas_width = self.canvas_width;
        if let Some(per_char) = self.grow_per_char {
            let wanted = (text.chars().count() as u64 * per_char as u64).min(u32::MAX as u64);
            canvas_width = canvas_width.max(wanted as u32);
        }
        LabelConfig {
            canvas_width,
            canvas_height: self.canvas_height,
            font_candidates: self.fonts.clone(),
            background: self.background.clone(),
            foreground: self.foreground.clone(),
            fallback: self.fallback,
        }
    }

    pub fn recognizer(&self) -> TesseractCli {
        TesseractCli {
            command: self.ocr_command.clone(),
            languages: self.ocr_languages.clone(),
            psm: self.ocr_psm,
            dpi: self.ocr_dpi,
        }
    }
}

impl FontEntry {
    fn into_candidate(self) -> Option<FontCandidate> {
        let size = self.size.filter(|size| *size > 0.0)?;
        if let Some(path) = self.path.filter(|path| !path.trim().is_empty()) {
            return Some(FontCandidate::path(path, size));
        }
        self.family
            .filter(|family| !family.trim().is_empty())
            .map(|family| FontCandidate::family(family, size))
    }
}
