use crate::error::{Error, Result};
use crate::theme::Theme;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Encodings a panel can be drawn to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[cfg_attr(feature = "cli", value(name = "png", alias = "raster"))]
    #[serde(rename = "png", alias = "raster")]
    Raster,
    #[default]
    Svg,
    Pdf,
    Ps,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Raster => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Ps => "ps",
        }
    }

    pub fn extension(self) -> &'static str {
        self.name()
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" | "raster" => Ok(Self::Raster),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "ps" => Ok(Self::Ps),
            other => Err(Error::config(format!("unknown output format `{other}`"))),
        }
    }

    /// Whether this build can encode the format. Only SVG and, with the
    /// `png` feature, raster output have encoders.
    pub fn is_supported(self) -> bool {
        match self {
            Self::Svg => true,
            Self::Raster => cfg!(feature = "png"),
            Self::Pdf | Self::Ps => false,
        }
    }
}

/// Which chopped end suppresses the arrowhead of a directed glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChopDowngrade {
    /// Only a chop on the end the arrow points to.
    #[default]
    StrandAware,
    /// A chop on either end.
    AnyChop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulerConfig {
    pub min_pixels_per_tick: f64,
    pub tick_height: f32,
    pub tick_text_height: f32,
}

impl RulerConfig {
    pub fn height(&self) -> f32 {
        5.0 * self.tick_height + self.tick_text_height
    }
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            min_pixels_per_tick: 5.0,
            tick_height: 5.0,
            tick_text_height: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub feature_height: f32,
    pub arrow_length: f32,
    /// Space between two stacked rows.
    pub vertical_gap: f32,
    pub track_header_height: f32,
    /// Extra space below the last row of every track.
    pub track_padding: f32,
    pub chop_downgrade: ChopDowngrade,
    /// Use the per-character width table instead of loading fonts.
    pub fast_text_metrics: bool,
    /// Fail the draw when a label cannot be measured with real font metrics.
    pub strict_text_metrics: bool,
    pub ruler: RulerConfig,
}

impl LayoutConfig {
    /// Height of one row band: a feature plus the gap below it.
    pub fn row_pitch(&self) -> f32 {
        self.feature_height + self.vertical_gap
    }

    pub fn track_extent(&self, rows_used: u32) -> f32 {
        self.track_header_height + rows_used as f32 * self.row_pitch() + self.track_padding
    }

    /// Top of a 1-based row, relative to the top of its track.
    pub fn row_top(&self, row: u32) -> f32 {
        self.track_header_height + row.saturating_sub(1) as f32 * self.row_pitch()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            feature_height: 10.0,
            arrow_length: 5.0,
            vertical_gap: 10.0,
            track_header_height: 24.0,
            track_padding: 10.0,
            chop_downgrade: ChopDowngrade::StrandAware,
            fast_text_metrics: false,
            strict_text_metrics: false,
            ruler: RulerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub format: OutputFormat,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            format: OutputFormat::Svg,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::classic();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        Self {
            theme,
            layout: LayoutConfig::default(),
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    title_font_size: Option<f32>,
    label_font_size: Option<f32>,
    tick_font_size: Option<f32>,
    text_color: Option<String>,
    separator_color: Option<String>,
    grid_color: Option<String>,
    neutral_color: Option<String>,
    track_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulerConfigFile {
    min_pixels_per_tick: Option<f64>,
    tick_height: Option<f32>,
    tick_text_height: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    feature_height: Option<f32>,
    arrow_length: Option<f32>,
    vertical_gap: Option<f32>,
    track_header_height: Option<f32>,
    track_padding: Option<f32>,
    chop_downgrade: Option<ChopDowngrade>,
    fast_text_metrics: Option<bool>,
    strict_text_metrics: Option<bool>,
    ruler: Option<RulerConfigFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
    width: Option<f32>,
    output_format: Option<String>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        match Theme::by_name(theme_name) {
            Some(theme) => config.theme = theme,
            None => warn!("unknown theme `{theme_name}`, keeping the classic theme"),
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.title_font_size {
            config.theme.title_font_size = v;
        }
        if let Some(v) = vars.label_font_size {
            config.theme.label_font_size = v;
        }
        if let Some(v) = vars.tick_font_size {
            config.theme.tick_font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.separator_color {
            config.theme.separator_color = v;
        }
        if let Some(v) = vars.grid_color {
            config.theme.grid_color = v;
        }
        if let Some(v) = vars.neutral_color {
            config.theme.neutral_color = v;
        }
        if let Some(v) = vars.track_color {
            config.theme.track_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.feature_height {
            config.layout.feature_height = v;
        }
        if let Some(v) = layout.arrow_length {
            config.layout.arrow_length = v;
        }
        if let Some(v) = layout.vertical_gap {
            config.layout.vertical_gap = v;
        }
        if let Some(v) = layout.track_header_height {
            config.layout.track_header_height = v;
        }
        if let Some(v) = layout.track_padding {
            config.layout.track_padding = v;
        }
        if let Some(v) = layout.chop_downgrade {
            config.layout.chop_downgrade = v;
        }
        if let Some(v) = layout.fast_text_metrics {
            config.layout.fast_text_metrics = v;
        }
        if let Some(v) = layout.strict_text_metrics {
            config.layout.strict_text_metrics = v;
        }
        if let Some(ruler) = layout.ruler {
            if let Some(v) = ruler.min_pixels_per_tick {
                config.layout.ruler.min_pixels_per_tick = v;
            }
            if let Some(v) = ruler.tick_height {
                config.layout.ruler.tick_height = v;
            }
            if let Some(v) = ruler.tick_text_height {
                config.layout.ruler.tick_text_height = v;
            }
        }
    }

    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.output_format.as_deref() {
        config.render.format = OutputFormat::from_name(v)?;
    }
    if config.layout.ruler.min_pixels_per_tick <= 1.0 {
        anyhow::bail!("minPixelsPerTick must be greater than 1");
    }

    config.render.background = config.theme.background.clone();

    Ok(config)
}
