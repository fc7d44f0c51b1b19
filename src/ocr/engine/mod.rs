mod geom;
mod parse;
mod tesseract;

use image::RgbaImage;
use std::path::Path;

use crate::error::{Error, Result};

pub use geom::overlapping_pairs;
pub(crate) use geom::clamp_rect;
pub use parse::{DEFAULT_NOISE, ParseOptions, parse_report};
pub use tesseract::{DEFAULT_PSM, Tesseract, list_tesseract_languages};

/// Text detection service producing a tabular word report for an image.
pub trait RecognitionBackend {
    fn report(&self, image: &RgbaImage) -> Result<String>;
}

/// Backend that ignores the image and returns a fixed report.
#[derive(Debug, Clone)]
pub struct StaticReport(pub String);

impl StaticReport {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::resource_with(format!("failed to read report: {}", path.display()), err)
        })?;
        Ok(Self(content))
    }
}

impl RecognitionBackend for StaticReport {
    fn report(&self, _image: &RgbaImage) -> Result<String> {
        Ok(self.0.clone())
    }
}
