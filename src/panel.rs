use crate::clip::{Clip, PixelRange, clip_segments};
use crate::config::OutputFormat;
use crate::error::{Error, Result};
use crate::ir::{ColourSpec, FeatureDescriptor, GlyphSpec, Segment, Strand, TrackConfig};
use crate::layout::packing::OccupancyGrid;
use crate::viewport::{Orientation, Viewport};
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId(pub usize);

#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub length: f64,
    pub width: f64,
    pub display_range: Option<(f64, f64)>,
    pub orientation: Orientation,
    pub clickable: bool,
    pub format: OutputFormat,
}

impl PanelConfig {
    pub fn new(length: f64) -> Self {
        Self {
            length,
            ..Default::default()
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            length: 1.0,
            width: 800.0,
            display_range: None,
            orientation: Orientation::Horizontal,
            clickable: false,
            format: OutputFormat::Svg,
        }
    }
}

/// One drawable part of a feature. Plain features have a single part; a
/// composite feature has one part per subfeature.
#[derive(Debug, Clone)]
pub struct FeaturePart {
    pub kind: String,
    pub segments: Vec<Segment>,
    pub start: f64,
    pub stop: f64,
    pub strand: Strand,
    pub clip: Clip,
}

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: FeatureId,
    pub track: TrackId,
    pub kind: String,
    pub label: Option<String>,
    pub link: Option<String>,
    pub glyph: GlyphSpec,
    pub colour: String,
    pub start: f64,
    pub stop: f64,
    pub strand: Strand,
    pub parts: Vec<FeaturePart>,
    /// Feature-level union of the parts' clips.
    pub clip: Clip,
    /// 1-based display row, set by the packing pass.
    pub row: Option<u32>,
}

impl Feature {
    pub fn pixel_ranges(&self) -> Vec<PixelRange> {
        self.clip.sorted_ranges()
    }

    pub fn is_visible(&self) -> bool {
        !self.clip.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub glyph: GlyphSpec,
    pub colour: ColourSpec,
    pub show_label: bool,
    pub features: Vec<FeatureId>,
    pub grid: OccupancyGrid,
}

impl Track {
    pub fn rows_used(&self) -> u32 {
        self.grid.rows_used()
    }
}

/// Owns the viewport and every track and feature of a diagram.
#[derive(Debug, Clone)]
pub struct Panel {
    viewport: Viewport,
    format: OutputFormat,
    tracks: Vec<Track>,
    features: Vec<Feature>,
}

impl Panel {
    pub fn new(config: PanelConfig) -> Result<Self> {
        if !config.format.is_supported() {
            return Err(Error::config(format!(
                "output format `{}` is not supported by this build",
                config.format.name()
            )));
        }
        let viewport = Viewport::new(
            config.length,
            config.width,
            config.display_range,
            config.orientation,
            config.clickable,
        )?;
        debug!(
            "panel: length={} window={}..{} width={} rescale={:.4}",
            viewport.domain_length(),
            viewport.display_start(),
            viewport.display_stop(),
            viewport.pixel_width(),
            viewport.rescale_factor()
        );
        Ok(Self {
            viewport,
            format: config.format,
            tracks: Vec::new(),
            features: Vec::new(),
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn add_track(&mut self, config: TrackConfig) -> TrackId {
        let id = TrackId(self.tracks.len());
        self.tracks.push(Track {
            id,
            name: config.name,
            glyph: config.glyph,
            colour: config.colour,
            show_label: config.show_label,
            features: Vec::new(),
            grid: OccupancyGrid::default(),
        });
        id
    }

    /// Adds a feature to a track. Features lying completely outside the
    /// display window are dropped and `Ok(None)` is returned; partly visible
    /// ones are kept whole and clipped.
    pub fn add_feature(
        &mut self,
        track: TrackId,
        desc: FeatureDescriptor,
    ) -> Result<Option<FeatureId>> {
        let Some(track_ref) = self.tracks.get(track.0) else {
            return Err(Error::config(format!("unknown track id {}", track.0)));
        };
        let Some((start, stop)) = desc.extent() else {
            return Err(Error::config(format!(
                "feature `{}` has no segments",
                desc.label.as_deref().unwrap_or(&desc.kind)
            )));
        };
        if desc.all_segments().any(|seg| !seg.from.is_finite() || !seg.to.is_finite()) {
            return Err(Error::config("feature coordinates must be finite"));
        }
        if !self.viewport.overlaps_window(start, stop) {
            return Ok(None);
        }

        let glyph = desc.glyph.clone().unwrap_or_else(|| track_ref.glyph.clone());
        let colour = desc.colour.as_ref().unwrap_or(&track_ref.colour).resolve(&desc);

        let mut parts = Vec::new();
        if desc.subfeatures.is_empty() {
            parts.push(self.make_part(&desc.kind, &desc.segments));
        } else {
            for sub in &desc.subfeatures {
                if sub.segments.is_empty() {
                    continue;
                }
                parts.push(self.make_part(&sub.kind, &sub.segments));
            }
        }
        let mut clip = Clip::default();
        for part in &parts {
            clip.merge(&part.clip);
        }
        let strand = parts.first().map(|part| part.strand).unwrap_or_default();

        let id = FeatureId(self.features.len());
        self.features.push(Feature {
            id,
            track,
            kind: desc.kind,
            label: desc.label,
            link: desc.link.filter(|link| !link.is_empty()),
            glyph,
            colour,
            start,
            stop,
            strand,
            parts,
            clip,
            row: None,
        });
        self.tracks[track.0].features.push(id);
        Ok(Some(id))
    }

    fn make_part(&self, kind: &str, segments: &[Segment]) -> FeaturePart {
        let mut segments = segments.to_vec();
        segments.sort_by(|a, b| a.from.total_cmp(&b.from));
        let start = segments.iter().map(|s| s.from).fold(f64::INFINITY, f64::min);
        let stop = segments.iter().map(|s| s.to).fold(f64::NEG_INFINITY, f64::max);
        let strand = segments.first().map(|s| s.strand).unwrap_or_default();
        let clip = clip_segments(&segments, &self.viewport);
        FeaturePart {
            kind: kind.to_string(),
            segments,
            start,
            stop,
            strand,
            clip,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.0]
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn feature(&self, id: FeatureId) -> &Feature {
        &self.features[id.0]
    }

    pub(crate) fn parts_mut(&mut self) -> (&Viewport, &mut Vec<Track>, &mut Vec<Feature>) {
        (&self.viewport, &mut self.tracks, &mut self.features)
    }
}
