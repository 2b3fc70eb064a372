use crate::ir::Segment;
use crate::viewport::Viewport;

/// A segment's visible extent on the pixel axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRange {
    pub left: f64,
    pub right: f64,
}

impl PixelRange {
    pub fn new(left: f64, right: f64) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Result of clipping a run of segments against the display window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clip {
    /// One entry per segment that survived, in segment order (ascending start).
    pub ranges: Vec<PixelRange>,
    pub chopped_at_start: bool,
    pub chopped_at_stop: bool,
    pub hidden_before: bool,
    pub hidden_after: bool,
}

impl Clip {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges ordered by left edge. Clipping keeps segment order, which is not
    /// guaranteed to be pixel order, so consumers go through this.
    pub fn sorted_ranges(&self) -> Vec<PixelRange> {
        let mut ranges = self.ranges.clone();
        ranges.sort_by(|a, b| a.left.total_cmp(&b.left));
        ranges
    }

    pub fn extent(&self) -> Option<(f64, f64)> {
        self.ranges.iter().fold(None, |acc, range| match acc {
            None => Some((range.left, range.right)),
            Some((left, right)) => Some((left.min(range.left), right.max(range.right))),
        })
    }

    /// Folds another clip into this one (used to build feature-level views of
    /// multi-part features).
    pub fn merge(&mut self, other: &Clip) {
        self.ranges.extend_from_slice(&other.ranges);
        self.chopped_at_start |= other.chopped_at_start;
        self.chopped_at_stop |= other.chopped_at_stop;
        self.hidden_before |= other.hidden_before;
        self.hidden_after |= other.hidden_after;
    }
}

pub fn clip_segments(segments: &[Segment], viewport: &Viewport) -> Clip {
    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by(|a, b| a.from.total_cmp(&b.from));

    let start = viewport.display_start();
    let stop = viewport.display_stop();
    let width = viewport.pixel_width();
    let mut clip = Clip::default();

    for seg in ordered {
        let range = if seg.to < start {
            clip.hidden_before = true;
            continue;
        } else if seg.from > stop {
            clip.hidden_after = true;
            continue;
        } else if seg.from < start && seg.to > stop {
            clip.chopped_at_start = true;
            clip.chopped_at_stop = true;
            PixelRange::new(0.0, width)
        } else if seg.from < start {
            clip.chopped_at_start = true;
            PixelRange::new(0.0, viewport.genomic_to_pixel(seg.to))
        } else if seg.to > stop {
            clip.chopped_at_stop = true;
            PixelRange::new(viewport.genomic_to_pixel(seg.from), width)
        } else {
            PixelRange::new(
                viewport.genomic_to_pixel(seg.from),
                viewport.genomic_to_pixel(seg.to),
            )
        };
        clip.ranges.push(range);
    }

    clip
}
