#[cfg(feature = "cli")]
pub mod cli;
pub mod clip;
pub mod config;
pub mod error;
pub mod image_map;
pub mod ir;
pub mod layout;
pub mod panel;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod viewport;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, OutputFormat};
pub use error::{Error, Result};
pub use ir::{ColourSpec, FeatureDescriptor, GlyphSpec, GlyphVariant, Segment, Strand, TrackConfig};
pub use layout::{Layout, compute_layout};
pub use panel::{FeatureId, Panel, PanelConfig, TrackId};
pub use viewport::{Orientation, Viewport};

/// Lays out `panel` with `config` and encodes it in the panel's format.
pub fn render_panel(panel: &mut Panel, config: &Config) -> anyhow::Result<Vec<u8>> {
    let measurer = text_metrics::measurer_for(&config.layout);
    let layout = compute_layout(panel, &config.theme, &config.layout, measurer.as_ref())?;
    render::encode(&layout, &config.theme, panel.format())
}
