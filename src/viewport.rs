use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Axis-aligned rectangle in panel pixels, stored as edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Maps domain coordinates onto the pixel axis of the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    domain_length: f64,
    display_start: f64,
    display_stop: f64,
    pixel_width: f64,
    rescale_factor: f64,
    orientation: Orientation,
    clickable: bool,
}

impl Viewport {
    /// Builds a viewport. The display window defaults to the whole domain and
    /// is clamped to `[0, domain_length]`.
    pub fn new(
        domain_length: f64,
        pixel_width: f64,
        display_range: Option<(f64, f64)>,
        orientation: Orientation,
        clickable: bool,
    ) -> Result<Self> {
        if !domain_length.is_finite() || domain_length <= 0.0 {
            return Err(Error::config(format!(
                "domain length must be positive, got {domain_length}"
            )));
        }
        if !pixel_width.is_finite() || pixel_width <= 0.0 {
            return Err(Error::config(format!(
                "pixel width must be positive, got {pixel_width}"
            )));
        }
        let (start, stop) = display_range.unwrap_or((0.0, domain_length));
        if !start.is_finite() || !stop.is_finite() {
            return Err(Error::config("display window must be finite"));
        }
        let display_start = start.max(0.0);
        let display_stop = stop.min(domain_length);
        if display_start >= display_stop {
            return Err(Error::config(format!(
                "display start ({display_start}) must be smaller than display stop ({display_stop})"
            )));
        }
        Ok(Self {
            domain_length,
            display_start,
            display_stop,
            pixel_width,
            rescale_factor: (display_stop - display_start) / pixel_width,
            orientation,
            clickable,
        })
    }

    pub fn domain_length(&self) -> f64 {
        self.domain_length
    }

    pub fn display_start(&self) -> f64 {
        self.display_start
    }

    pub fn display_stop(&self) -> f64 {
        self.display_stop
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    /// Domain units per pixel.
    pub fn rescale_factor(&self) -> f64 {
        self.rescale_factor
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn clickable(&self) -> bool {
        self.clickable
    }

    pub fn genomic_to_pixel(&self, coord: f64) -> f64 {
        (coord - self.display_start) / self.rescale_factor
    }

    /// True when `[start, stop]` touches the display window at all.
    pub fn overlaps_window(&self, start: f64, stop: f64) -> bool {
        !(stop < self.display_start || start > self.display_stop)
    }
}

/// Moves a rectangle from the horizontal canvas onto the canvas rotated by a
/// quarter turn: point `(x, y)` lands on `(y, width - x)`.
pub fn flip_for_orientation(rect: Rect, width: f64) -> Rect {
    Rect {
        left: rect.top,
        top: width - rect.right,
        right: rect.bottom,
        bottom: width - rect.left,
    }
}

/// Inverse of [`flip_for_orientation`] for the same `width`.
pub fn unflip_for_orientation(rect: Rect, width: f64) -> Rect {
    Rect {
        left: width - rect.bottom,
        top: rect.left,
        right: width - rect.top,
        bottom: rect.right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn maps_window_edges_to_canvas_edges() {
        for (len, width, range) in [
            (1000.0, 500.0, None),
            (653.0, 800.0, Some((10.0, 400.0))),
            (1e8, 1200.0, Some((2.5e7, 2.5e7 + 3.0))),
        ] {
            let vp = Viewport::new(len, width, range, Orientation::Horizontal, false).unwrap();
            assert!(close(vp.genomic_to_pixel(vp.display_start()), 0.0));
            assert!(close(vp.genomic_to_pixel(vp.display_stop()), width));
        }
    }

    #[test]
    fn rescale_factor_from_window() {
        let vp = Viewport::new(1000.0, 500.0, Some((0.0, 1000.0)), Orientation::Horizontal, false)
            .unwrap();
        assert!(close(vp.rescale_factor(), 2.0));
        assert!(close(vp.genomic_to_pixel(100.0), 50.0));
        assert!(close(vp.genomic_to_pixel(200.0), 100.0));
    }

    #[test]
    fn clamps_window_to_domain() {
        let vp = Viewport::new(500.0, 100.0, Some((-50.0, 900.0)), Orientation::Horizontal, false)
            .unwrap();
        assert_eq!(vp.display_start(), 0.0);
        assert_eq!(vp.display_stop(), 500.0);
    }

    #[test]
    fn rejects_empty_window_and_bad_width() {
        let err = Viewport::new(500.0, 100.0, Some((300.0, 300.0)), Orientation::Horizontal, false);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = Viewport::new(500.0, 100.0, Some((600.0, 700.0)), Orientation::Horizontal, false);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = Viewport::new(500.0, 0.0, None, Orientation::Horizontal, false);
        assert!(matches!(err, Err(Error::Config(_))));
        let err = Viewport::new(500.0, -3.0, None, Orientation::Horizontal, false);
        assert!(matches!(err, Err(Error::Config(_))));
    }

    #[test]
    fn flip_matches_quarter_turn() {
        let rect = Rect::new(10.0, 40.0, 30.0, 50.0);
        let flipped = flip_for_orientation(rect, 200.0);
        assert_eq!(flipped, Rect::new(40.0, 170.0, 50.0, 190.0));
        assert_eq!(flipped.width(), rect.height());
        assert_eq!(flipped.height(), rect.width());
    }

    #[test]
    fn unflip_restores_rect() {
        let rect = Rect::new(10.0, 40.0, 30.0, 50.0);
        for width in [50.0, 200.0, 800.0] {
            assert_eq!(unflip_for_orientation(flip_for_orientation(rect, width), width), rect);
        }
    }

    #[test]
    fn double_flip_is_half_turn_and_four_flips_restore() {
        let rect = Rect::new(10.0, 40.0, 30.0, 50.0);
        let w = 200.0;
        let twice = flip_for_orientation(flip_for_orientation(rect, w), w);
        assert_eq!(twice, Rect::new(w - 30.0, w - 50.0, w - 10.0, w - 40.0));
        let four = flip_for_orientation(flip_for_orientation(twice, w), w);
        assert_eq!(four, rect);
    }
}
