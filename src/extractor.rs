use image::RgbaImage;
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ocr::{
    ImageCanvas, ParseOptions, Rect, RecognitionBackend, Replacement, ResolvedFont,
    SubstituteStyle, TextOccurrence, overlapping_pairs, parse_report, substitute,
};

/// Counts reported by [`ImageExtractor::substitute_all`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubstitutionSummary {
    pub substituted: usize,
    pub skipped: usize,
}

#[derive(Serialize)]
struct OccurrenceJson<'a> {
    #[serde(flatten)]
    occurrence: &'a TextOccurrence,
    rectangle: Rect,
    font_size: Option<u32>,
}

/// One run over one image: the drawing surface plus the occurrences found on it.
pub struct ImageExtractor {
    canvas: ImageCanvas,
    occurrences: Vec<TextOccurrence>,
}

impl ImageExtractor {
    /// Run `backend` on `image` and parse its report.
    pub fn new(
        image: RgbaImage,
        backend: &dyn RecognitionBackend,
        options: &ParseOptions,
    ) -> Result<Self> {
        let report = backend.report(&image)?;
        let occurrences = parse_report(&report, options)?;
        info!(occurrences = occurrences.len(), "extracted text occurrences");
        for (a, b, ratio) in overlapping_pairs(&occurrences) {
            warn!(a, b, iou = ratio, "occurrence boxes overlap; the later one wins");
        }
        Ok(Self {
            canvas: ImageCanvas::new(image),
            occurrences,
        })
    }

    pub fn open(
        path: &Path,
        backend: &dyn RecognitionBackend,
        options: &ParseOptions,
    ) -> Result<Self> {
        let image = load_rgba(path)?;
        Self::new(image, backend, options)
    }

    pub fn occurrences(&self) -> &[TextOccurrence] {
        &self.occurrences
    }

    pub fn occurrence(&self, id: usize) -> Option<&TextOccurrence> {
        self.occurrences.get(id)
    }

    pub fn image(&self) -> &RgbaImage {
        self.canvas.image()
    }

    pub fn into_image(self) -> RgbaImage {
        self.canvas.into_image()
    }

    pub fn substitute(
        &mut self,
        id: usize,
        fonts: &ResolvedFont,
        replacement: &Replacement,
        style: &SubstituteStyle,
    ) -> Result<()> {
        let occurrence = self
            .occurrences
            .get(id)
            .ok_or(Error::UnknownOccurrence { id })?;
        substitute(occurrence, &mut self.canvas, fonts, replacement, style)
    }

    /// Substitute every occurrence in id order.
    ///
    /// Occurrences that fail with a domain error are skipped; any other error
    /// stops the batch.
    pub fn substitute_all(
        &mut self,
        fonts: &ResolvedFont,
        replacement: &Replacement,
        style: &SubstituteStyle,
    ) -> Result<SubstitutionSummary> {
        let mut summary = SubstitutionSummary::default();
        for occurrence in &self.occurrences {
            match substitute(occurrence, &mut self.canvas, fonts, replacement, style) {
                Ok(()) => summary.substituted += 1,
                Err(err) if err.is_domain() => {
                    warn!(
                        id = occurrence.occurrence_id,
                        text = %occurrence.text,
                        error = %err,
                        "skipping occurrence"
                    );
                    summary.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }
        debug!(
            substituted = summary.substituted,
            skipped = summary.skipped,
            "substitution finished"
        );
        Ok(summary)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image()
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|err| {
                Error::resource_with(format!("failed to write image: {}", path.display()), err)
            })
    }

    /// Open the current image in the platform image viewer.
    pub fn show(&self) -> Result<()> {
        let tmp = tempfile::Builder::new()
            .prefix("ocr-substitute-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| Error::resource_with("failed to create temp file for preview", err))?;
        // The viewer reads the file after we return.
        let (_, path) = tmp
            .keep()
            .map_err(|err| Error::resource_with("failed to keep preview file", err))?;
        self.save(&path)?;
        let status = viewer_command(&path).status().map_err(|err| {
            Error::resource_with(format!("failed to open viewer for {}", path.display()), err)
        })?;
        if !status.success() {
            return Err(Error::resource(format!(
                "image viewer exited with {status}"
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let rows = self
            .occurrences
            .iter()
            .map(|occurrence| OccurrenceJson {
                occurrence,
                rectangle: occurrence.rectangle(),
                font_size: occurrence.font_size().ok(),
            })
            .collect::<Vec<_>>();
        serde_json::to_string_pretty(&rows)
            .map_err(|err| Error::resource_with("failed to serialize occurrences", err))
    }
}

fn load_rgba(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|err| {
        Error::resource_with(format!("failed to read image: {}", path.display()), err)
    })?;
    if let Some(kind) = infer::get(&bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(Error::resource(format!(
                "not an image: {} ({})",
                path.display(),
                kind.mime_type()
            )));
        }
    }
    let image = image::load_from_memory(&bytes).map_err(|err| {
        Error::resource_with(format!("failed to decode image: {}", path.display()), err)
    })?;
    Ok(image.to_rgba8())
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}
