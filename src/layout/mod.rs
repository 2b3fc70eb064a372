pub mod glyph;
pub mod packing;
pub mod ruler;
mod text;
pub(crate) mod types;
pub use types::*;

use glyph::{GlyphInput, GlyphMetrics, glyph_geometry};
use packing::{PackRequest, pack_track};
use ruler::compute_ruler;
use text::measure_label;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::image_map::ImageMap;
use crate::panel::{FeatureId, Panel};
use crate::text_metrics::TextMeasure;
use crate::theme::Theme;
use crate::viewport::{Orientation, Rect};
use log::{debug, info};
use rayon::prelude::*;

/// Lays out a whole panel: labels are measured, every track is packed, glyph
/// geometry is computed and everything is stacked under the ruler.
///
/// Packing state lives in the tracks, so calling this again re-packs from
/// scratch and gives the same result.
pub fn compute_layout(
    panel: &mut Panel,
    theme: &Theme,
    config: &LayoutConfig,
    measurer: &dyn TextMeasure,
) -> Result<Layout> {
    let label_widths = measure_labels(panel, theme, measurer)?;
    pack_rows(panel, &label_widths);

    let viewport = panel.viewport();
    let rescale = viewport.rescale_factor();
    let width = viewport.pixel_width();
    let metrics = GlyphMetrics::from_config(config);
    let ruler = compute_ruler(viewport, &config.ruler);
    let mut image_map = ImageMap::new();

    let mut offset = ruler.height;
    let mut tracks = Vec::with_capacity(panel.tracks().len());
    for track in panel.tracks() {
        let rows_used = track.rows_used();
        let height = config.track_extent(rows_used) as f64;
        let mut features = Vec::with_capacity(track.features.len());

        for &id in &track.features {
            let feature = panel.feature(id);
            let Some(row) = feature.row else {
                continue;
            };
            let top = offset + config.row_top(row) as f64;
            let name = feature.label.as_deref().unwrap_or(&feature.kind);

            let mut glyphs = Vec::new();
            for part in &feature.parts {
                let Some(input) = GlyphInput::from_part(part, rescale, width) else {
                    continue;
                };
                let requested = feature.glyph.resolve(&part.kind);
                let result = glyph_geometry(requested, &input, &metrics, name)?;
                if result.variant != requested {
                    debug!("`{name}`: drawing {} instead of {requested}", result.variant);
                }
                glyphs.push(result);
            }

            let mut layout = FeatureLayout {
                id,
                row,
                top,
                colour: feature.colour.clone(),
                glyphs,
                label: None,
                link: feature.link.clone(),
            };
            let Some((left, right)) = layout.extent() else {
                features.push(layout);
                continue;
            };

            if let (Some(text), Some(label_width)) =
                (label_text(feature.label.as_deref()), label_widths[id.0])
            {
                layout.label = Some(LabelLayout {
                    text: text.to_string(),
                    x: left,
                    y: top + config.row_pitch() as f64 + theme.label_font_size as f64,
                    width: label_width,
                    font_size: theme.label_font_size as f64,
                });
            }
            if viewport.clickable() {
                image_map.record(
                    Rect::new(left, top, right, top + metrics.feature_height),
                    feature.link.clone(),
                );
            }
            features.push(layout);
        }

        tracks.push(TrackLayout {
            id: track.id,
            name: track.name.clone(),
            top: offset,
            height,
            rows_used,
            title_y: offset + theme.title_font_size as f64 + 4.0,
            features,
        });
        offset += height;
    }

    let orientation = viewport.orientation();
    if orientation == Orientation::Vertical {
        image_map.flip_orientation(width);
    }
    info!(
        "laid out {} tracks, {} features, canvas {}x{}",
        tracks.len(),
        panel.features().len(),
        width,
        offset
    );

    Ok(Layout {
        width,
        height: offset,
        orientation,
        clickable: viewport.clickable(),
        feature_height: metrics.feature_height,
        ruler,
        tracks,
        image_map,
    })
}

/// Label widths indexed by feature id. Every feature on a track that shows
/// labels gets an entry, zero wide when it has no text, so that it still
/// reserves the row below. Runs before packing, sequentially.
fn measure_labels(
    panel: &Panel,
    theme: &Theme,
    measurer: &dyn TextMeasure,
) -> Result<Vec<Option<f64>>> {
    panel
        .features()
        .iter()
        .map(|feature| {
            if !panel.track(feature.track).show_label {
                return Ok(None);
            }
            match label_text(feature.label.as_deref()) {
                Some(label) => measure_label(label, theme, measurer).map(Some),
                None => Ok(Some(0.0)),
            }
        })
        .collect()
}

fn label_text(label: Option<&str>) -> Option<&str> {
    label.filter(|text| !text.trim().is_empty())
}

/// Packs every track in parallel; each track owns its grid.
fn pack_rows(panel: &mut Panel, label_widths: &[Option<f64>]) {
    let rescale = panel.viewport().rescale_factor();
    let (_, tracks, features) = panel.parts_mut();

    let requests: Vec<Vec<PackRequest>> = tracks
        .iter()
        .map(|track| {
            track
                .features
                .iter()
                .map(|&id| {
                    let feature = &features[id.0];
                    PackRequest {
                        feature: id,
                        start: feature.start,
                        stop: feature.stop,
                        label_width: label_widths[id.0],
                    }
                })
                .collect()
        })
        .collect();

    let assignments: Vec<Vec<(FeatureId, u32)>> = tracks
        .par_iter_mut()
        .zip(requests.par_iter())
        .map(|(track, requests)| {
            let rows = pack_track(&mut track.grid, requests, rescale);
            debug!(
                "track `{}`: {} features on {} rows",
                track.name,
                rows.len(),
                track.grid.rows_used()
            );
            rows
        })
        .collect();

    for (id, row) in assignments.into_iter().flatten() {
        features[id.0].row = Some(row);
    }
}
