use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub mod error;
mod extractor;
pub mod logging;
pub mod ocr;
pub mod settings;
mod test_util;

pub use error::{Error, ErrorKind};
pub use extractor::{ImageExtractor, SubstitutionSummary};

use crate::ocr::{FontBook, RecognitionBackend, Replacement, StaticReport, Tesseract};

#[derive(Debug, Clone)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub replacement: Replacement,
    pub languages: Option<String>,
    pub psm: Option<u32>,
    /// Saved recognition report used instead of running tesseract.
    pub report: Option<PathBuf>,
    pub font_family: Option<String>,
    pub font_path: Option<PathBuf>,
    pub dump_json: Option<PathBuf>,
    pub settings_path: Option<PathBuf>,
    pub show: bool,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub occurrences: usize,
    pub summary: SubstitutionSummary,
    pub output: PathBuf,
}

/// Extract occurrences from `config.input`, substitute all of them and save the result.
pub fn run(config: &Config) -> Result<RunOutcome> {
    if let Replacement::Text(text) = &config.replacement {
        if text.trim().is_empty() {
            return Err(anyhow!("replacement text is empty"));
        }
    }
    let settings = settings::load_settings(config.settings_path.as_deref())?;
    let style = settings.style()?;

    let backend: Box<dyn RecognitionBackend> = match &config.report {
        Some(path) => Box::new(StaticReport::from_file(path)?),
        None => {
            let languages = config
                .languages
                .as_deref()
                .unwrap_or(&settings.ocr_languages);
            let psm = config.psm.unwrap_or(settings.ocr_psm);
            Box::new(Tesseract::new(languages, psm)?)
        }
    };

    let mut extractor =
        ImageExtractor::open(&config.input, backend.as_ref(), &settings.parse_options())
            .with_context(|| format!("failed to extract text from {}", config.input.display()))?;

    if let Some(path) = &config.dump_json {
        fs::write(path, extractor.to_json()?)
            .with_context(|| format!("failed to write occurrences: {}", path.display()))?;
    }

    let font_path = config
        .font_path
        .clone()
        .or_else(|| settings.font_path.as_ref().map(PathBuf::from));
    let book = match font_path {
        Some(path) => FontBook::with_font_file(&path)?,
        None => FontBook::system(),
    };
    let family = config
        .font_family
        .as_deref()
        .or(book.file_family())
        .unwrap_or(&settings.font_family);
    let fonts = book.resolve(family, &settings.fallback_fonts)?;

    let summary = extractor.substitute_all(&fonts, &config.replacement, &style)?;
    extractor.save(&config.output)?;
    info!(
        output = %config.output.display(),
        substituted = summary.substituted,
        skipped = summary.skipped,
        "saved image"
    );

    if config.show {
        extractor.show()?;
    }

    Ok(RunOutcome {
        occurrences: extractor.occurrences().len(),
        summary,
        output: config.output.clone(),
    })
}
