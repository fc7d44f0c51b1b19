use anyhow::{Context, Result, anyhow};
use image::Rgba;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ocr::{DEFAULT_NOISE, DEFAULT_PSM, ParseOptions, SubstituteStyle};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub ocr_languages: String,
    pub ocr_psm: u32,
    pub noise: Vec<String>,
    pub font_family: String,
    pub fallback_fonts: Vec<String>,
    pub font_path: Option<String>,
    pub text_color: String,
    pub fill_color: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ocr_languages: "eng".to_string(),
            ocr_psm: DEFAULT_PSM,
            noise: DEFAULT_NOISE.iter().map(|value| value.to_string()).collect(),
            font_family: "Arial".to_string(),
            fallback_fonts: vec![
                "DejaVu Sans".to_string(),
                "Liberation Sans".to_string(),
                "sans-serif".to_string(),
            ],
            font_path: None,
            text_color: "#ff0000".to_string(),
            fill_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    ocr: Option<OcrSettings>,
    render: Option<RenderSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    languages: Option<String>,
    psm: Option<u32>,
    noise: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderSettings {
    font_family: Option<String>,
    fallback_fonts: Option<Vec<String>>,
    font_path: Option<String>,
    text_color: Option<String>,
    fill_color: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(ocr) = incoming.ocr {
            if let Some(languages) = ocr.languages {
                if !languages.trim().is_empty() {
                    self.ocr_languages = languages;
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
            if let Some(noise) = ocr.noise {
                self.noise = noise;
            }
        }
        if let Some(render) = incoming.render {
            if let Some(family) = render.font_family {
                if !family.trim().is_empty() {
                    self.font_family = family;
                }
            }
            if let Some(fallback) = render.fallback_fonts {
                self.fallback_fonts = fallback;
            }
            if let Some(path) = render.font_path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(color) = render.text_color {
                if !color.trim().is_empty() {
                    self.text_color = color;
                }
            }
            if let Some(color) = render.fill_color {
                if !color.trim().is_empty() {
                    self.fill_color = color;
                }
            }
        }
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            noise: self.noise.clone(),
        }
    }

    pub fn style(&self) -> Result<SubstituteStyle> {
        Ok(SubstituteStyle {
            text_color: parse_hex_color(&self.text_color)
                .with_context(|| "invalid [render] text_color")?,
            fill_color: parse_hex_color(&self.fill_color)
                .with_context(|| "invalid [render] fill_color")?,
        })
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| anyhow!("color must start with '#': {}", value))?;
    if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(anyhow!("invalid hex color: {}", value));
    }
    let channel = |idx: usize| u8::from_str_radix(&hex[idx * 2..idx * 2 + 2], 16);
    match hex.len() {
        3 => {
            let mut out = [255u8; 4];
            for (idx, ch) in hex.chars().enumerate() {
                let nibble = ch.to_digit(16).unwrap_or_default() as u8;
                out[idx] = nibble * 17;
            }
            Ok(Rgba(out))
        }
        6 => Ok(Rgba([channel(0)?, channel(1)?, channel(2)?, 255])),
        8 => Ok(Rgba([channel(0)?, channel(1)?, channel(2)?, channel(3)?])),
        _ => Err(anyhow!("invalid hex color length: {}", value)),
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-substitute"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn embedded_template_matches_defaults() {
        let parsed: SettingsFile = toml::from_str(DEFAULT_SETTINGS_TOML).expect("template");
        let mut settings = Settings::default();
        settings.merge(parsed);
        let defaults = Settings::default();
        assert_eq!(settings.ocr_languages, defaults.ocr_languages);
        assert_eq!(settings.ocr_psm, defaults.ocr_psm);
        assert_eq!(settings.noise, defaults.noise);
        assert_eq!(settings.font_family, defaults.font_family);
        assert_eq!(settings.fallback_fonts, defaults.fallback_fonts);
        assert_eq!(settings.text_color, defaults.text_color);
        assert_eq!(settings.fill_color, defaults.fill_color);
    }

    #[test]
    fn load_seeds_home_and_applies_extra_file() {
        with_temp_home(|home| {
            let extra = home.join("extra.toml");
            fs::write(
                &extra,
                "[ocr]\nlanguages = \"pol\"\nnoise = [\"|\", \"~\"]\n\n[render]\nfont_family = \"  \"\ntext_color = \"#00ff00\"\n",
            )
            .expect("write extra");

            let settings = load_settings(Some(&extra)).expect("load");
            assert!(home.join(".ocr-substitute").join("settings.toml").exists());
            assert_eq!(settings.ocr_languages, "pol");
            assert_eq!(settings.noise, vec!["|".to_string(), "~".to_string()]);
            assert_eq!(settings.font_family, "Arial");
            assert_eq!(settings.style().unwrap().text_color, Rgba([0, 255, 0, 255]));
            assert_eq!(settings.parse_options().noise.len(), 2);
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let err = load_settings(Some(&home.join("nope.toml"))).unwrap_err();
            assert!(err.to_string().contains("settings file not found"));
        });
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#ff0000").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_hex_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#00000080").unwrap(), Rgba([0, 0, 0, 128]));
        assert!(parse_hex_color("red").is_err());
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn invalid_style_color_names_key() {
        let settings = Settings {
            fill_color: "white".to_string(),
            ..Settings::default()
        };
        let err = settings.style().unwrap_err();
        assert!(err.to_string().contains("fill_color"));
    }
}
