use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use ttf_parser::Face;
use ttf_parser::name_id;
use usvg::fontdb;

use crate::error::{Error, Result};

/// Database of fonts available for rendering replacement text.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
    file_family: Option<String>,
}

impl FontBook {
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self {
            db: Arc::new(db),
            file_family: None,
        }
    }

    /// System fonts plus one explicit font file.
    pub fn with_font_file(path: &Path) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let before = db.len();
        db.load_font_file(path).map_err(|err| {
            Error::resource_with(format!("failed to read font: {}", path.display()), err)
        })?;
        if db.len() == before {
            return Err(Error::resource(format!(
                "no usable font faces in {}",
                path.display()
            )));
        }
        let file_family = db
            .faces()
            .last()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone());
        Ok(Self {
            db: Arc::new(db),
            file_family,
        })
    }

    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
            file_family: None,
        }
    }

    /// Family of the face loaded by [`FontBook::with_font_file`].
    pub fn file_family(&self) -> Option<&str> {
        self.file_family.as_deref()
    }

    /// Resolve `family`, then each of `fallback` in order.
    pub fn resolve(&self, family: &str, fallback: &[String]) -> Result<ResolvedFont> {
        let mut tried = Vec::new();
        for candidate in std::iter::once(family).chain(fallback.iter().map(String::as_str)) {
            let candidate = candidate.trim();
            if candidate.is_empty() {
                continue;
            }
            if let Some(resolved) = self.lookup(candidate) {
                debug!(requested = family, resolved = %resolved.family, "resolved font");
                return Ok(resolved);
            }
            tried.push(candidate.to_string());
        }
        Err(Error::resource(format!(
            "font not found: {}",
            tried.join(", ")
        )))
    }

    fn lookup(&self, family: &str) -> Option<ResolvedFont> {
        let is_sans = family.eq_ignore_ascii_case("sans-serif");
        let families = if is_sans {
            vec![fontdb::Family::SansSerif]
        } else {
            vec![fontdb::Family::Name(family)]
        };
        let query = fontdb::Query {
            families: &families,
            ..Default::default()
        };
        let id = self.db.query(&query)?;
        let (name, ascent_ratio) = self
            .db
            .with_face_data(id, |data, index| {
                let face = Face::parse(data, index).ok()?;
                let units = face.units_per_em().max(1) as f32;
                Some((extract_family_name(&face), face.ascender() as f32 / units))
            })
            .flatten()?;
        Some(ResolvedFont {
            family: name.unwrap_or_else(|| family.to_string()),
            ascent_ratio,
            db: Arc::clone(&self.db),
        })
    }
}

/// A located font family, not yet bound to a size.
#[derive(Clone)]
pub struct ResolvedFont {
    family: String,
    ascent_ratio: f32,
    db: Arc<fontdb::Database>,
}

impl ResolvedFont {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn at_size(&self, size_px: u32) -> Result<Font> {
        if size_px == 0 {
            return Err(Error::domain(format!(
                "font size 0 for family {}",
                self.family
            )));
        }
        Ok(Font {
            family: self.family.clone(),
            size_px,
            ascent_px: self.ascent_ratio * size_px as f32,
            db: Arc::clone(&self.db),
        })
    }

    #[cfg(test)]
    pub(crate) fn for_tests(family: &str, ascent_ratio: f32) -> Self {
        Self {
            family: family.to_string(),
            ascent_ratio,
            db: FontBook::empty().db,
        }
    }
}

/// Font handle bound to a pixel size.
#[derive(Clone)]
pub struct Font {
    family: String,
    size_px: u32,
    ascent_px: f32,
    db: Arc<fontdb::Database>,
}

impl Font {
    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Distance from the top of the em box to the baseline.
    pub fn ascent_px(&self) -> f32 {
        self.ascent_px
    }

    pub(crate) fn database(&self) -> Arc<fontdb::Database> {
        Arc::clone(&self.db)
    }
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("family", &self.family)
            .field("ascent_ratio", &self.ascent_ratio)
            .finish()
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("family", &self.family)
            .field("size_px", &self.size_px)
            .field("ascent_px", &self.ascent_px)
            .finish()
    }
}

fn extract_family_name(face: &Face<'_>) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id == name_id::TYPOGRAPHIC_FAMILY {
            if let Some(value) = name.to_string() {
                return Some(value);
            }
        } else if name.name_id == name_id::FAMILY && fallback.is_none() {
            fallback = name.to_string();
        }
    }
    fallback
}
