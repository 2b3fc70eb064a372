use crate::config::RulerConfig;
use crate::viewport::Viewport;

use super::types::{RulerLayout, RulerTick};

/// Minor and major tick distances in domain units. The minor distance is the
/// smallest power of `min_pixels_per_tick` that keeps minor ticks at least
/// that many pixels apart.
pub fn tick_distances(rescale_factor: f64, min_pixels_per_tick: f64) -> (f64, f64) {
    let scaling = ((min_pixels_per_tick * rescale_factor).ln() / min_pixels_per_tick.ln())
        .ceil()
        .max(0.0) as i32;
    let minor = min_pixels_per_tick.powi(scaling);
    (minor, minor * 10.0)
}

pub fn compute_ruler(viewport: &Viewport, config: &RulerConfig) -> RulerLayout {
    let rescale = viewport.rescale_factor();
    let (minor, major) = tick_distances(rescale, config.min_pixels_per_tick);
    let th = config.tick_height as f64;
    let start = viewport.display_start();
    let stop = viewport.display_stop();

    let mut ticks = Vec::new();
    let mut index = (start / minor).ceil() as i64;
    loop {
        let value = index as f64 * minor;
        if value > stop {
            break;
        }
        let is_major = index.rem_euclid(10) == 0;
        let x = ((value - start) / rescale).floor();
        ticks.push(RulerTick {
            x,
            value,
            major: is_major,
            top: th,
            bottom: if is_major { 4.0 * th } else { 2.0 * th },
            label: is_major.then(|| commify(value)),
        });
        index += 1;
    }

    RulerLayout {
        width: viewport.pixel_width(),
        height: config.height() as f64,
        line_y: 2.0 * th,
        label_y: 4.0 * th + config.tick_text_height as f64,
        minor_distance: minor,
        major_distance: major,
        ticks,
    }
}

/// Formats a coordinate with comma-grouped thousands.
pub fn commify(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
