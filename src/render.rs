use crate::config::OutputFormat;
use crate::layout::glyph::{Paint, Primitive};
use crate::layout::{FeatureLayout, Layout, RulerLayout, TrackLayout};
use crate::theme::Theme;
use crate::viewport::Orientation;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

pub fn render_svg(layout: &Layout, theme: &Theme) -> String {
    let mut svg = String::new();
    let (out_w, out_h) = layout.output_size();
    let out_w = fmt_num(out_w.ceil());
    let out_h = fmt_num(out_h.ceil());

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{out_w}\" height=\"{out_h}\" viewBox=\"0 0 {out_w} {out_h}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    if layout.orientation == Orientation::Vertical {
        // (x, y) -> (y, width - x)
        svg.push_str(&format!(
            "<g transform=\"translate(0 {}) rotate(-90)\">",
            fmt_num(layout.width)
        ));
    } else {
        svg.push_str("<g>");
    }

    ruler_svg(&mut svg, &layout.ruler, layout.height, theme);
    for track in &layout.tracks {
        track_svg(&mut svg, track, layout.width, theme);
    }

    svg.push_str("</g></svg>");
    svg
}

fn ruler_svg(svg: &mut String, ruler: &RulerLayout, panel_height: f64, theme: &Theme) {
    svg.push_str(&format!(
        "<line x1=\"0\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"1\"/>",
        fmt_num(ruler.width),
        theme.text_color,
        y = fmt_num(ruler.line_y),
    ));
    for tick in &ruler.ticks {
        let x = fmt_num(tick.x);
        svg.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"1\"/>",
            fmt_num(tick.top),
            fmt_num(tick.bottom),
            theme.text_color
        ));
        let grid_width = if tick.major { "1" } else { "0.5" };
        svg.push_str(&format!(
            "<line x1=\"{x}\" y1=\"{}\" x2=\"{x}\" y2=\"{}\" stroke=\"{}\" stroke-width=\"{grid_width}\"/>",
            fmt_num(ruler.height),
            fmt_num(panel_height),
            theme.grid_color
        ));
        if let Some(label) = &tick.label {
            svg.push_str(&format!(
                "<text x=\"{x}\" y=\"{}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                fmt_num(ruler.label_y),
                escape_xml(&theme.font_family),
                theme.tick_font_size,
                theme.text_color,
                escape_xml(label)
            ));
        }
    }
}

fn track_svg(svg: &mut String, track: &TrackLayout, width: f64, theme: &Theme) {
    svg.push_str(&format!(
        "<line x1=\"0\" y1=\"{y}\" x2=\"{}\" y2=\"{y}\" stroke=\"{}\" stroke-width=\"1\"/>",
        fmt_num(width),
        theme.separator_color,
        y = fmt_num(track.top),
    ));
    if !track.name.is_empty() {
        svg.push_str(&format!(
            "<text x=\"2\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            fmt_num(track.title_y),
            escape_xml(&theme.font_family),
            theme.title_font_size,
            theme.text_color,
            escape_xml(&track.name)
        ));
    }
    for feature in &track.features {
        feature_svg(svg, feature, theme);
    }
}

fn feature_svg(svg: &mut String, feature: &FeatureLayout, theme: &Theme) {
    if feature.glyphs.is_empty() {
        return;
    }
    svg.push_str(&format!("<g transform=\"translate(0 {})\">", fmt_num(feature.top)));
    for glyph in &feature.glyphs {
        for prim in &glyph.primitives {
            primitive_svg(svg, prim, &feature.colour, theme);
        }
    }
    svg.push_str("</g>");

    if let Some(label) = &feature.label {
        svg.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            fmt_num(label.x),
            fmt_num(label.y),
            escape_xml(&theme.font_family),
            fmt_num(label.font_size),
            theme.text_color,
            escape_xml(&label.text)
        ));
    }
}

fn primitive_svg(svg: &mut String, prim: &Primitive, colour: &str, theme: &Theme) {
    let colour_of = |paint: &Paint| match paint {
        Paint::Feature => escape_xml(colour),
        Paint::Neutral => theme.neutral_color.clone(),
    };
    match prim {
        Primitive::Rect {
            x,
            y,
            width,
            height,
            filled,
            paint,
        } => {
            let c = colour_of(paint);
            let style = if *filled {
                format!("fill=\"{c}\" stroke=\"none\"")
            } else {
                format!("fill=\"none\" stroke=\"{c}\" stroke-width=\"1\"")
            };
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {style}/>",
                fmt_num(*x),
                fmt_num(*y),
                fmt_num(*width),
                fmt_num(*height)
            ));
        }
        Primitive::Polyline {
            points,
            line_width,
            paint,
        } => {
            svg.push_str(&format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                points_attr(points),
                colour_of(paint),
                fmt_num(*line_width)
            ));
        }
        Primitive::Triangle {
            points,
            filled,
            paint,
        } => {
            let c = colour_of(paint);
            let fill = if *filled { c.as_str() } else { "none" };
            svg.push_str(&format!(
                "<polygon points=\"{}\" fill=\"{fill}\" stroke=\"{c}\" stroke-width=\"1\"/>",
                points_attr(points)
            ));
        }
        Primitive::Circle { cx, cy, r, paint } => {
            svg.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
                fmt_num(*cx),
                fmt_num(*cy),
                fmt_num(*r),
                colour_of(paint)
            ));
        }
    }
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_num(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Encodes a layout in the requested format.
pub fn encode(layout: &Layout, theme: &Theme, format: OutputFormat) -> Result<Vec<u8>> {
    let svg = render_svg(layout, theme);
    match format {
        OutputFormat::Svg => Ok(svg.into_bytes()),
        OutputFormat::Raster => rasterize(&svg, theme),
        OutputFormat::Pdf | OutputFormat::Ps => {
            anyhow::bail!("{} output is not supported", format.name())
        }
    }
}

#[cfg(feature = "png")]
fn rasterize(svg: &str, theme: &Theme) -> Result<Vec<u8>> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|family| family.trim().trim_matches('"').to_string())
        .unwrap_or_else(|| "sans-serif".to_string());
    opt.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &opt).context("failed to parse generated SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.encode_png().context("failed to encode PNG")
}

#[cfg(not(feature = "png"))]
fn rasterize(_svg: &str, _theme: &Theme) -> Result<Vec<u8>> {
    anyhow::bail!("png output needs the `png` feature")
}

/// Image bytes plus the image-map document, ready to be written.
#[derive(Debug, Clone)]
pub struct RenderedPanel {
    pub image: Vec<u8>,
    pub html: Option<(PathBuf, String)>,
}

/// Encodes everything first so that a failure leaves no partial output
/// behind. Clickable panels also produce `<stem>.html` next to the image.
pub fn prepare_output(
    layout: &Layout,
    theme: &Theme,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<RenderedPanel> {
    if format != OutputFormat::Svg && output.is_none() {
        anyhow::bail!("Output path required for {} output", format.name());
    }
    let html = if layout.clickable {
        let output = output
            .ok_or_else(|| anyhow::anyhow!("Output path required for clickable panels"))?;
        let image_src = output
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        Some((
            output.with_extension("html"),
            layout.image_map.to_html(image_src),
        ))
    } else {
        None
    };
    let image = encode(layout, theme, format)?;
    Ok(RenderedPanel { image, html })
}

/// Writes the image (to stdout when `output` is `None`) and the image map.
/// Files are staged next to their targets and only renamed into place once
/// every one of them was written, so a failed write leaves nothing behind.
pub fn write_output(rendered: &RenderedPanel, output: Option<&Path>) -> Result<()> {
    let mut files: Vec<(&Path, &[u8])> = Vec::new();
    if let Some(path) = output {
        files.push((path, &rendered.image));
    }
    if let Some((path, html)) = &rendered.html {
        files.push((path.as_path(), html.as_bytes()));
    }

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());
    for (path, bytes) in files {
        let part = staging_path(path);
        if let Err(err) = std::fs::write(&part, bytes) {
            let _ = std::fs::remove_file(&part);
            discard(&staged);
            return Err(err).with_context(|| format!("failed to write {}", path.display()));
        }
        staged.push((part, path));
    }
    for (idx, (part, path)) in staged.iter().enumerate() {
        if let Err(err) = std::fs::rename(part, path) {
            discard(&staged[idx..]);
            return Err(err).with_context(|| format!("failed to write {}", path.display()));
        }
        info!("wrote {}", path.display());
    }

    if output.is_none() {
        print!("{}", String::from_utf8_lossy(&rendered.image));
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (part, _) in staged {
        let _ = std::fs::remove_file(part);
    }
}

pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
