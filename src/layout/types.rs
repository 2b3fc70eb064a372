use crate::image_map::ImageMap;
use crate::panel::{FeatureId, TrackId};
use crate::viewport::Orientation;

use super::glyph::GlyphResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RulerTick {
    pub x: f64,
    pub value: f64,
    pub major: bool,
    pub top: f64,
    pub bottom: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RulerLayout {
    pub width: f64,
    pub height: f64,
    pub line_y: f64,
    /// Baseline of the major tick numbers.
    pub label_y: f64,
    pub minor_distance: f64,
    pub major_distance: f64,
    pub ticks: Vec<RulerTick>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub text: String,
    pub x: f64,
    /// Baseline, in panel pixels.
    pub y: f64,
    pub width: f64,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    pub id: FeatureId,
    pub row: u32,
    /// Top of the feature's row in panel pixels. Glyph `y` values are
    /// relative to it.
    pub top: f64,
    pub colour: String,
    pub glyphs: Vec<GlyphResult>,
    pub label: Option<LabelLayout>,
    pub link: Option<String>,
}

impl FeatureLayout {
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.glyphs.iter().fold(None, |acc, glyph| match acc {
            None => Some((glyph.left, glyph.right)),
            Some((left, right)) => Some((left.min(glyph.left), right.max(glyph.right))),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackLayout {
    pub id: TrackId,
    pub name: String,
    pub top: f64,
    pub height: f64,
    pub rows_used: u32,
    pub title_y: f64,
    pub features: Vec<FeatureLayout>,
}

/// A fully placed panel. Coordinates are in the horizontal frame; for a
/// vertical panel the renderer rotates the whole canvas while the image map
/// is already stored in the rotated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub orientation: Orientation,
    pub clickable: bool,
    pub feature_height: f64,
    pub ruler: RulerLayout,
    pub tracks: Vec<TrackLayout>,
    pub image_map: ImageMap,
}

impl Layout {
    /// Size of the encoded image, after rotation.
    pub fn output_size(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Horizontal => (self.width, self.height),
            Orientation::Vertical => (self.height, self.width),
        }
    }

    pub fn feature(&self, id: FeatureId) -> Option<&FeatureLayout> {
        self.tracks
            .iter()
            .flat_map(|track| track.features.iter())
            .find(|feature| feature.id == id)
    }
}
