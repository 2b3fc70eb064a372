use crate::clip::PixelRange;
use crate::config::{ChopDowngrade, LayoutConfig};
use crate::error::{Error, Result};
use crate::ir::{GlyphVariant, Strand};
use crate::panel::FeaturePart;

/// Where a primitive takes its colour from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Feature,
    Neutral,
}

/// Backend-agnostic drawing instruction. `x` is in panel pixels, `y` is
/// measured from the top of the feature's row.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        filled: bool,
        paint: Paint,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        line_width: f64,
        paint: Paint,
    },
    Triangle {
        points: [(f64, f64); 3],
        filled: bool,
        paint: Paint,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        paint: Paint,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphResult {
    /// Variant actually drawn, after any downgrade.
    pub variant: GlyphVariant,
    pub primitives: Vec<Primitive>,
    pub left: f64,
    pub right: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub feature_height: f64,
    pub arrow_length: f64,
    pub chop_downgrade: ChopDowngrade,
}

impl GlyphMetrics {
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            feature_height: config.feature_height as f64,
            arrow_length: config.arrow_length as f64,
            chop_downgrade: config.chop_downgrade,
        }
    }
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}

/// Everything glyph geometry looks at for one drawable part.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphInput {
    /// Visible ranges sorted by left edge. Never empty.
    pub ranges: Vec<PixelRange>,
    pub strand: Strand,
    pub chopped_at_start: bool,
    pub chopped_at_stop: bool,
    pub hidden_before: bool,
    pub hidden_after: bool,
    pub start: f64,
    pub stop: f64,
    pub rescale_factor: f64,
    pub panel_width: f64,
}

impl GlyphInput {
    /// Returns `None` for parts with nothing left on screen.
    pub fn from_part(part: &FeaturePart, rescale_factor: f64, panel_width: f64) -> Option<Self> {
        if part.clip.is_empty() {
            return None;
        }
        Some(Self {
            ranges: part.clip.sorted_ranges(),
            strand: part.strand,
            chopped_at_start: part.clip.chopped_at_start,
            chopped_at_stop: part.clip.chopped_at_stop,
            hidden_before: part.clip.hidden_before,
            hidden_after: part.clip.hidden_after,
            start: part.start,
            stop: part.stop,
            rescale_factor,
            panel_width,
        })
    }

    fn left(&self) -> f64 {
        self.ranges.first().map(|r| r.left).unwrap_or(0.0)
    }

    fn right(&self) -> f64 {
        self.ranges.last().map(|r| r.right).unwrap_or(0.0)
    }
}

/// Directed glyphs fall back to their plain form when the feature is under
/// two pixels wide or when the arrow end is cut off by the window.
pub fn effective_variant(
    variant: GlyphVariant,
    input: &GlyphInput,
    metrics: &GlyphMetrics,
) -> GlyphVariant {
    let Some(plain) = variant.undirected() else {
        return variant;
    };
    let too_small = (input.stop - input.start) / input.rescale_factor < 2.0;
    let arrow_chopped = match metrics.chop_downgrade {
        ChopDowngrade::StrandAware => match input.strand {
            Strand::Forward => input.chopped_at_stop,
            Strand::Reverse => input.chopped_at_start,
        },
        ChopDowngrade::AnyChop => input.chopped_at_start || input.chopped_at_stop,
    };
    if too_small || arrow_chopped {
        plain
    } else {
        variant
    }
}

pub fn glyph_geometry(
    variant: GlyphVariant,
    input: &GlyphInput,
    metrics: &GlyphMetrics,
    label: &str,
) -> Result<GlyphResult> {
    if variant.needs_single_position() && input.start != input.stop {
        return Err(Error::Geometry {
            variant,
            label: label.to_string(),
            start: input.start,
            stop: input.stop,
        });
    }

    let variant = effective_variant(variant, input, metrics);
    let h = metrics.feature_height;
    let a = metrics.arrow_length;
    let left = input.left();
    let right = input.right();
    let mut prims = Vec::new();

    let (left, right) = match variant {
        GlyphVariant::Box => {
            prims.push(rect(left, right, h, false));
            (left, right)
        }
        GlyphVariant::Generic => {
            prims.push(rect(left, right, h, true));
            (left, right)
        }
        GlyphVariant::DirectedBox => {
            match input.strand {
                Strand::Forward => {
                    let tip = (right - a).max(left);
                    prims.push(Primitive::Polyline {
                        points: vec![(tip, 0.0), (left, 0.0), (left, h), (tip, h)],
                        line_width: 1.0,
                        paint: Paint::Feature,
                    });
                    prims.push(open_arrow(tip, a, h, 1.0));
                }
                Strand::Reverse => {
                    let tip = (left + a).min(right);
                    prims.push(Primitive::Polyline {
                        points: vec![(tip, 0.0), (right, 0.0), (right, h), (tip, h)],
                        line_width: 1.0,
                        paint: Paint::Feature,
                    });
                    prims.push(open_arrow(tip, -a, h, 1.0));
                }
            }
            (left, right)
        }
        GlyphVariant::DirectedGeneric => {
            match input.strand {
                Strand::Forward => {
                    let tip = (right - a).max(left);
                    prims.push(rect(left, tip, h, true));
                    prims.push(filled_arrow(tip, a, h));
                }
                Strand::Reverse => {
                    let tip = (left + a).min(right);
                    prims.push(rect(tip, right, h, true));
                    prims.push(filled_arrow(tip, -a, h));
                }
            }
            (left, right)
        }
        GlyphVariant::Line => {
            prims.push(hline(left, right, h / 2.0, 1.0, Paint::Feature));
            (left, right)
        }
        GlyphVariant::LineWithHandles => {
            prims.push(hline(left, right, h / 2.0, 1.0, Paint::Feature));
            let mut handle_right = open_arrow(left, a, h, 1.0);
            let mut handle_left = open_arrow(right, -a, h, 1.0);
            set_paint(&mut handle_right, Paint::Neutral);
            set_paint(&mut handle_left, Paint::Neutral);
            prims.push(handle_right);
            prims.push(handle_left);
            (left, right)
        }
        GlyphVariant::Triangle => {
            let x = left;
            prims.push(Primitive::Triangle {
                points: [(x, 0.0), (x + a, h), (x - a, h)],
                filled: true,
                paint: Paint::Feature,
            });
            (x - a, x + a)
        }
        GlyphVariant::Dot => {
            let r = h / 2.0;
            prims.push(Primitive::Circle {
                cx: left,
                cy: r,
                r,
                paint: Paint::Feature,
            });
            (left - r, left + r)
        }
        GlyphVariant::Spliced => {
            spliced(input, &input.ranges, h, &mut prims);
            (left, right)
        }
        GlyphVariant::DirectedSpliced => {
            let mut ranges = input.ranges.clone();
            let arrow_range = match input.strand {
                Strand::Forward => ranges.pop(),
                Strand::Reverse => {
                    if ranges.is_empty() {
                        None
                    } else {
                        Some(ranges.remove(0))
                    }
                }
            };
            spliced(input, &ranges, h, &mut prims);
            if let Some(range) = arrow_range {
                match input.strand {
                    Strand::Forward => {
                        let tip = (range.right - a).max(range.left);
                        prims.push(rect(range.left, tip, h, true));
                        prims.push(filled_arrow(tip, a, h));
                    }
                    Strand::Reverse => {
                        let tip = (range.left + a).min(range.right);
                        prims.push(rect(tip, range.right, h, true));
                        prims.push(filled_arrow(tip, -a, h));
                    }
                }
            }
            prims.extend(connectors(&input.ranges, h));
            (left, right)
        }
    };

    if variant == GlyphVariant::Spliced {
        prims.extend(connectors(&input.ranges, h));
    }

    Ok(GlyphResult {
        variant,
        primitives: prims,
        left,
        right,
    })
}

fn rect(left: f64, right: f64, h: f64, filled: bool) -> Primitive {
    Primitive::Rect {
        x: left,
        y: 0.0,
        width: (right - left).max(0.0),
        height: h,
        filled,
        paint: Paint::Feature,
    }
}

fn hline(from: f64, to: f64, y: f64, line_width: f64, paint: Paint) -> Primitive {
    Primitive::Polyline {
        points: vec![(from, y), (to, y)],
        line_width,
        paint,
    }
}

/// Arrowhead with its base on `x`; a negative `size` points left.
fn filled_arrow(x: f64, size: f64, h: f64) -> Primitive {
    Primitive::Triangle {
        points: [(x, 0.0), (x + size, h / 2.0), (x, h)],
        filled: true,
        paint: Paint::Feature,
    }
}

fn open_arrow(x: f64, size: f64, h: f64, line_width: f64) -> Primitive {
    Primitive::Polyline {
        points: vec![(x, 0.0), (x + size, h / 2.0), (x, h)],
        line_width,
        paint: Paint::Feature,
    }
}

fn set_paint(prim: &mut Primitive, new: Paint) {
    match prim {
        Primitive::Rect { paint, .. }
        | Primitive::Polyline { paint, .. }
        | Primitive::Triangle { paint, .. }
        | Primitive::Circle { paint, .. } => *paint = new,
    }
}

/// Blocks for every range plus lines to the panel edge for parts hidden
/// outside the window.
fn spliced(input: &GlyphInput, blocks: &[PixelRange], h: f64, prims: &mut Vec<Primitive>) {
    for range in blocks {
        prims.push(rect(range.left, range.right, h, true));
    }
    if input.hidden_after {
        prims.push(hline(input.right(), input.panel_width, h / 2.0, 1.0, Paint::Feature));
    }
    if input.hidden_before {
        prims.push(hline(0.0, input.left(), h / 2.0, 1.0, Paint::Feature));
    }
}

/// Chevrons joining each range's right edge to the next range's left edge.
fn connectors(ranges: &[PixelRange], h: f64) -> Vec<Primitive> {
    let mut gap_starts: Vec<f64> = ranges.iter().map(|r| r.right).collect();
    let mut gap_stops: Vec<f64> = ranges.iter().map(|r| r.left).collect();
    gap_starts.sort_by(f64::total_cmp);
    gap_stops.sort_by(f64::total_cmp);
    gap_starts.pop();
    if !gap_stops.is_empty() {
        gap_stops.remove(0);
    }

    gap_starts
        .into_iter()
        .zip(gap_stops)
        .map(|(from, to)| {
            let middle = from + (to - from) / 2.0;
            Primitive::Polyline {
                points: vec![(from, h * 0.2), (middle, h * 0.7), (to, h * 0.2)],
                line_width: 0.5,
                paint: Paint::Feature,
            }
        })
        .collect()
}
