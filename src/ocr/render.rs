use image::{Rgba, RgbaImage};
use resvg::render;
use std::borrow::Cow;
use tiny_skia::{Pixmap, PremultipliedColorU8};
use usvg::{Options, Tree};

use super::engine::clamp_rect;
use super::{Font, Rect, ResolvedFont, TextOccurrence};
use crate::error::{Error, Result};

/// Drawing surface a substitution is applied to.
pub trait Canvas {
    /// Overwrite every pixel of `rect` (clipped to the canvas) with `color`.
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>);

    /// Draw `text` with its em box anchored at the top-left corner of `clip`.
    /// Nothing outside `clip` may change.
    fn draw_text(&mut self, clip: Rect, text: &str, font: &Font, color: Rgba<u8>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstituteStyle {
    pub text_color: Rgba<u8>,
    pub fill_color: Rgba<u8>,
}

impl Default for SubstituteStyle {
    fn default() -> Self {
        Self {
            text_color: Rgba([255, 0, 0, 255]),
            fill_color: Rgba([255, 255, 255, 255]),
        }
    }
}

/// What gets drawn in place of an occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Text(String),
    /// The occurrence id, for checking which box is which.
    OccurrenceId,
}

impl Replacement {
    pub fn text_for<'a>(&'a self, occurrence: &TextOccurrence) -> Cow<'a, str> {
        match self {
            Replacement::Text(text) => Cow::Borrowed(text.as_str()),
            Replacement::OccurrenceId => Cow::Owned(occurrence.occurrence_id.to_string()),
        }
    }
}

/// Erase `occurrence`'s rectangle and draw the replacement in it.
///
/// The font is sized from the occurrence, not from the replacement. A degenerate
/// occurrence fails with a domain error before the canvas is touched.
pub fn substitute<C: Canvas + ?Sized>(
    occurrence: &TextOccurrence,
    canvas: &mut C,
    fonts: &ResolvedFont,
    replacement: &Replacement,
    style: &SubstituteStyle,
) -> Result<()> {
    let font = fonts.at_size(occurrence.font_size()?)?;
    let text = replacement.text_for(occurrence);
    let rect = occurrence.rectangle();
    canvas.fill_rect(rect, style.fill_color);
    canvas.draw_text(rect, &text, &font, style.text_color)
}

/// RGBA image buffer used as the drawing surface.
pub struct ImageCanvas {
    image: RgbaImage,
}

impl ImageCanvas {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

impl Canvas for ImageCanvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        let (width, height) = self.image.dimensions();
        let Some(rect) = clamp_rect(rect, width, height) else {
            return;
        };
        for y in rect.top..rect.bottom {
            for x in rect.left..rect.right {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    fn draw_text(&mut self, clip: Rect, text: &str, font: &Font, color: Rgba<u8>) -> Result<()> {
        let (width, height) = self.image.dimensions();
        let Some(clip) = clamp_rect(clip, width, height) else {
            return Ok(());
        };
        if text.trim().is_empty() {
            return Ok(());
        }
        let pixmap = rasterize_text(clip, text, font, color)?;
        for (idx, src) in pixmap.pixels().iter().enumerate() {
            if src.alpha() == 0 {
                continue;
            }
            let x = clip.left + (idx as u32 % clip.width());
            let y = clip.top + (idx as u32 / clip.width());
            let dst = self.image.get_pixel_mut(x, y);
            blend_over(dst, *src);
        }
        Ok(())
    }
}

fn rasterize_text(clip: Rect, text: &str, font: &Font, color: Rgba<u8>) -> Result<Pixmap> {
    let svg = text_svg(clip.width(), clip.height(), text, font, color);
    let options = Options {
        fontdb: font.database(),
        ..Options::default()
    };
    let tree = Tree::from_str(&svg, &options)
        .map_err(|err| Error::resource_with("failed to build text overlay", err))?;
    let mut pixmap =
        Pixmap::new(clip.width(), clip.height()).ok_or_else(|| Error::domain("empty text clip"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);
    Ok(pixmap)
}

fn text_svg(width: u32, height: u32, text: &str, font: &Font, color: Rgba<u8>) -> String {
    let Rgba([r, g, b, a]) = color;
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><text x="0" y="{y}" font-size="{size}" font-family="{family}" fill="#{r:02x}{g:02x}{b:02x}" fill-opacity="{opacity}" xml:space="preserve">{text}</text></svg>"##,
        w = width,
        h = height,
        y = font.ascent_px(),
        size = font.size_px(),
        family = escape_xml(font.family()),
        opacity = a as f32 / 255.0,
        text = escape_xml(text),
    )
}

// Source-over of a premultiplied pixel onto a straight-alpha one. Blending
// here avoids converting the whole image to a premultiplied Pixmap and back,
// which would round every untouched semi-transparent pixel.
fn blend_over(dst: &mut Rgba<u8>, src: PremultipliedColorU8) {
    let sa = src.alpha() as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let src_rgb = [src.red(), src.green(), src.blue()];
    for channel in 0..3 {
        let s = src_rgb[channel] as f32 / 255.0;
        let d = dst[channel] as f32 / 255.0;
        let value = (s + d * da * (1.0 - sa)) / out_a;
        dst[channel] = (value * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
