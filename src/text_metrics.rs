use crate::config::LayoutConfig;
use crate::error::{Error, Result};
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Mutex;
use ttf_parser::Face;

/// Width of rendered text in pixels.
pub trait TextMeasure: Sync {
    fn measure(&self, text: &str, font_size: f32, font_family: &str) -> Result<f32>;
}

/// The measurer a layout configuration asks for.
pub fn measurer_for(config: &LayoutConfig) -> Box<dyn TextMeasure> {
    if config.fast_text_metrics {
        Box::new(HeuristicMeasurer)
    } else {
        Box::new(FontMeasurer::new(config.strict_text_metrics))
    }
}

/// Per-character width table, no fonts involved. Widths are relative to the
/// font size and calibrated on a common sans-serif face.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl TextMeasure for HeuristicMeasurer {
    fn measure(&self, text: &str, font_size: f32, _font_family: &str) -> Result<f32> {
        Ok(heuristic_width(text, font_size))
    }
}

pub fn heuristic_width(text: &str, font_size: f32) -> f32 {
    if font_size <= 0.0 {
        return 0.0;
    }
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(|ch| char_width_factor(ch) * font_size)
        .sum()
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '\'' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.25,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '0'..='9' => 0.556,
        'A'..='Z' => 0.68,
        'a'..='z' => 0.56,
        '_' | '-' => 0.4,
        _ if ch.is_ascii() => 0.56,
        _ => 0.9,
    }
}

static FONT_CACHE: Lazy<Mutex<FontCache>> = Lazy::new(|| Mutex::new(FontCache::new()));

/// Measures with system fonts found through `fontdb`. When no face matches
/// the family the heuristic table is used instead, unless `strict` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct FontMeasurer {
    pub strict: bool,
}

impl FontMeasurer {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }
}

impl TextMeasure for FontMeasurer {
    fn measure(&self, text: &str, font_size: f32, font_family: &str) -> Result<f32> {
        if text.is_empty() || font_size <= 0.0 {
            return Ok(0.0);
        }
        let measured = FONT_CACHE
            .lock()
            .map_err(|_| Error::Measurement {
                text: text.to_string(),
                reason: "font cache poisoned".to_string(),
            })?
            .measure(text, font_size, font_family);
        match measured {
            Some(width) => Ok(width),
            None if self.strict => Err(Error::Measurement {
                text: text.to_string(),
                reason: format!("no usable font for `{font_family}`"),
            }),
            None => {
                debug!("no font for `{font_family}`, using heuristic width for `{text}`");
                Ok(heuristic_width(text, font_size))
            }
        }
    }
}

struct FontCache {
    db: Database,
    loaded_system_fonts: bool,
    faces: HashMap<String, Option<FontFace>>,
}

impl FontCache {
    fn new() -> Self {
        Self {
            db: Database::new(),
            loaded_system_fonts: false,
            faces: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = normalize_family_key(font_family);
        if !self.faces.contains_key(&key) {
            let face = self.load_face(font_family);
            if face.is_none() {
                warn!("no system font matches `{font_family}`");
            }
            self.faces.insert(key.clone(), face);
        }
        self.faces.get(&key)?.as_ref()?.measure_width(text, font_size)
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let names: Vec<String> = font_family
            .split(',')
            .map(|part| part.trim().trim_matches('"').trim_matches('\'').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let mut families: Vec<Family<'_>> = names
            .iter()
            .map(|name| match name.to_ascii_lowercase().as_str() {
                "serif" => Family::Serif,
                "sans-serif" | "sans" | "system-ui" | "-apple-system" => Family::SansSerif,
                "monospace" => Family::Monospace,
                _ => Family::Name(name.as_str()),
            })
            .collect();
        if families.is_empty() {
            families.push(Family::SansSerif);
        }

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
            debug!("loaded {} system font faces", self.db.len());
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        self.db
            .with_face_data(id, |data, index| FontFace::parse(data.to_vec(), index))
            .flatten()
    }
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: f32,
    ascii_advances: [u16; 128],
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        let units_per_em = face.units_per_em().max(1) as f32;
        Some(Self {
            data,
            index,
            units_per_em,
            ascii_advances,
        })
    }

    fn measure_width(&self, text: &str, font_size: f32) -> Option<f32> {
        let scale = font_size / self.units_per_em;
        let fallback = font_size * 0.56;

        if text.is_ascii() {
            let width = text
                .bytes()
                .filter(|byte| *byte != b'\n')
                .map(|byte| match self.ascii_advances[byte as usize] {
                    0 => fallback,
                    advance => advance as f32 * scale,
                })
                .sum::<f32>();
            return Some(width);
        }

        let face = Face::parse(&self.data, self.index).ok()?;
        let width = text
            .chars()
            .filter(|ch| *ch != '\n')
            .map(|ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map(|advance| advance as f32 * scale)
                    .unwrap_or(fallback)
            })
            .sum::<f32>();
        Some(width)
    }
}

fn normalize_family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "sans-serif".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}
