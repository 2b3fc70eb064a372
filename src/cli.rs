use crate::config::{Config, OutputFormat, load_config};
use crate::ir::{ColourSpec, DEFAULT_TRACK_COLOUR};
use crate::layout::compute_layout;
use crate::parser::{PanelDescription, parse_gff, parse_panel_description};
use crate::render::{prepare_output, write_output};
use crate::text_metrics::measurer_for;
use crate::viewport::Orientation;
use anyhow::Result;
use clap::Parser;
use log::info;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "lmr", version, about = "Linear feature map renderer")]
pub struct Args {
    /// Panel description (.json/.json5) or GFF3 file (.gff/.gff3), '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. SVG goes to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Config JSON file (theme and layout constants)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Panel width in pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Sequence length, for GFF input
    #[arg(short = 'l', long = "length")]
    pub length: Option<f64>,

    /// First coordinate to show
    #[arg(long = "start")]
    pub start: Option<f64>,

    /// Last coordinate to show
    #[arg(long = "stop")]
    pub stop: Option<f64>,

    /// Draw the panel rotated by a quarter turn
    #[arg(long = "vertical")]
    pub vertical: bool,

    /// Also write an HTML image map next to the output
    #[arg(long = "clickable")]
    pub clickable: bool,
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(format) = args.output_format {
        config.render.format = format;
    }

    let (input, is_gff) = read_input(args.input.as_deref())?;
    let mut description = if is_gff {
        parse_gff(&input, args.length)?
    } else {
        let description = parse_panel_description(&input)?;
        if args.output_format.is_none() && description.config.format != OutputFormat::Svg {
            config.render.format = description.config.format;
        }
        description
    };
    apply_overrides(&mut description, &args, &config);

    let output = args.output.as_deref();
    render_description(description, &config, output)
}

/// Applies command-line switches on top of what the input file says.
fn apply_overrides(description: &mut PanelDescription, args: &Args, config: &Config) {
    let panel = &mut description.config;
    // A description that does not set its own width takes the configured one.
    if args.width.is_some() || description.width.is_none() {
        panel.width = config.render.width as f64;
    }
    if args.start.is_some() || args.stop.is_some() {
        let (start, stop) = panel.display_range.unwrap_or((0.0, panel.length));
        panel.display_range = Some((args.start.unwrap_or(start), args.stop.unwrap_or(stop)));
    }
    if args.vertical {
        panel.orientation = Orientation::Vertical;
    }
    if args.clickable {
        panel.clickable = true;
    }
    panel.format = config.render.format;
    for track in &mut description.tracks {
        if track.config.colour.fixed() == Some(DEFAULT_TRACK_COLOUR) {
            track.config.colour = ColourSpec::Fixed(config.theme.track_color.clone());
        }
    }
}

fn render_description(description: PanelDescription, config: &Config, output: Option<&Path>) -> Result<()> {
    let format = description.config.format;
    let mut panel = description.build()?;
    let measurer = measurer_for(&config.layout);
    let layout = compute_layout(&mut panel, &config.theme, &config.layout, measurer.as_ref())?;
    let rendered = prepare_output(&layout, &config.theme, format, output)?;
    write_output(&rendered, output)?;
    info!("rendered {} tracks as {}", layout.tracks.len(), format.name());
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        let content = std::fs::read_to_string(path)?;
        let is_gff = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "gff" | "gff3"))
            .unwrap_or(false);
        return Ok((content, is_gff));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    let is_gff = buf.trim_start().starts_with("##gff-version");
    Ok((buf, is_gff))
}
