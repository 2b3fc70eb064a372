use crate::error::Result;
use crate::text_metrics::TextMeasure;
use crate::theme::Theme;

/// Pixel width of a feature label in the theme's label font.
pub(super) fn measure_label(text: &str, theme: &Theme, measurer: &dyn TextMeasure) -> Result<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let width = measurer.measure(trimmed, theme.label_font_size, &theme.font_family)?;
    Ok(width.max(0.0) as f64)
}
