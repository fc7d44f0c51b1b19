use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::RecognitionBackend;

/// Page segmentation mode tesseract uses when none is requested.
pub const DEFAULT_PSM: u32 = 3;

pub fn list_tesseract_languages() -> Result<Vec<String>> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .map_err(|err| Error::resource_with("failed to run tesseract --list-langs", err))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::resource(format!(
            "tesseract --list-langs failed: {}",
            stderr.trim()
        )));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
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
    langs
}

fn normalize_languages(requested: &str, available: Option<&[String]>) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(Error::resource("ocr languages is empty"));
    }

    let Some(available) = available else {
        return Ok(trimmed.to_string());
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
        return Err(Error::resource(format!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        )));
    }
    if !missing.is_empty() {
        warn!(
            missing = %missing.join(", "),
            available = %available.join(", "),
            "ocr language(s) not available"
        );
    }

    Ok(chosen.join("+"))
}

/// The `tesseract` executable, invoked in TSV mode.
#[derive(Debug, Clone)]
pub struct Tesseract {
    languages: String,
    psm: u32,
}

impl Tesseract {
    /// Checks `languages` against the installed set when tesseract can list it.
    pub fn new(languages: &str, psm: u32) -> Result<Self> {
        let available = list_tesseract_languages().ok();
        let languages = normalize_languages(languages, available.as_deref())?;
        Ok(Self { languages, psm })
    }

    fn run_tsv(&self, path: &Path) -> Result<String> {
        debug!(languages = %self.languages, psm = self.psm, "running tesseract");
        let output = Command::new("tesseract")
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("tsv")
            .output()
            .map_err(|err| {
                Error::resource_with("failed to run tesseract (is it installed?)", err)
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::resource(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl RecognitionBackend for Tesseract {
    fn report(&self, image: &RgbaImage) -> Result<String> {
        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|err| Error::resource_with("failed to create temp file for OCR", err))?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .map_err(|err| Error::resource_with("failed to write temp image for OCR", err))?;
        tmp.flush().ok();
        self.run_tsv(tmp.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn language_list_skips_banner() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\nosd\n\npol\n";
        assert_eq!(parse_language_list(stdout), langs(&["eng", "osd", "pol"]));
    }

    #[test]
    fn normalize_keeps_available_languages() {
        let available = langs(&["eng", "pol"]);
        let chosen = normalize_languages("eng, deu+pol", Some(available.as_slice())).unwrap();
        assert_eq!(chosen, "eng+pol");
    }

    #[test]
    fn normalize_rejects_when_nothing_available() {
        let available = langs(&["eng"]);
        let err = normalize_languages("jpn", Some(available.as_slice())).unwrap_err();
        assert!(err.to_string().contains("jpn"));
    }

    #[test]
    fn normalize_passes_through_without_listing() {
        assert_eq!(normalize_languages(" eng ", None).unwrap(), "eng");
        assert!(normalize_languages("  ", None).is_err());
    }
}
