mod engine;
mod font;
mod render;

pub use engine::{
    DEFAULT_NOISE, DEFAULT_PSM, ParseOptions, RecognitionBackend, StaticReport, Tesseract,
    list_tesseract_languages, overlapping_pairs, parse_report,
};
pub use font::{Font, FontBook, ResolvedFont};
pub use render::{Canvas, ImageCanvas, Replacement, SubstituteStyle, substitute};

use serde::Serialize;

use crate::error::{Error, Result};

/// Empirical widening applied to the average glyph width when sizing replacement text.
pub const FONT_EXPANSION: f64 = 1.3;

/// Pixel rectangle with exclusive right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Rect {
    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.right, self.bottom)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// One recognized text token, as reported by the recognition backend.
///
/// Records are created in bulk by [`parse_report`] and never mutated afterwards;
/// substitution edits the image, not the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextOccurrence {
    pub occurrence_id: usize,
    pub text: String,
    pub conf: i32,

    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,

    pub page_num: i32,
    pub block_num: i32,
    pub par_num: i32,
    pub line_num: i32,
    pub word_num: i32,
    pub level: i32,
}

impl TextOccurrence {
    pub fn rectangle(&self) -> Rect {
        Rect {
            left: self.left,
            top: self.top,
            right: self.left.saturating_add(self.width),
            bottom: self.top.saturating_add(self.height),
        }
    }

    pub fn anchor(&self) -> (u32, u32) {
        (self.left, self.top)
    }

    pub fn font_size(&self) -> Result<u32> {
        font_size_for(self.width, &self.text)
    }
}

/// `floor(1.3 * width / chars(text))`.
pub fn font_size_for(width: u32, text: &str) -> Result<u32> {
    let len = text.chars().count();
    if len == 0 {
        return Err(Error::domain("cannot size font for empty text"));
    }
    Ok((FONT_EXPANSION * width as f64 / len as f64).floor() as u32)
}

#[cfg(test)]
pub(crate) fn occurrence(
    id: usize,
    text: &str,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> TextOccurrence {
    TextOccurrence {
        occurrence_id: id,
        text: text.to_string(),
        conf: 90,
        left,
        top,
        width,
        height,
        page_num: 1,
        block_num: 1,
        par_num: 1,
        line_num: 1,
        word_num: 1,
        level: 5,
    }
}
