use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub title_font_size: f32,
    pub label_font_size: f32,
    pub tick_font_size: f32,
    pub text_color: String,
    /// Line drawn across the top of every track.
    pub separator_color: String,
    /// Vertical grid lines dropped from the ruler ticks.
    pub grid_color: String,
    /// Colour for glyph parts that do not take the feature colour (handles).
    pub neutral_color: String,
    pub track_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "Sans, sans-serif".to_string(),
            title_font_size: 12.0,
            label_font_size: 8.0,
            tick_font_size: 8.0,
            text_color: "#000000".to_string(),
            separator_color: "#BFBFBF".to_string(),
            grid_color: "#CCCCCC".to_string(),
            neutral_color: "#000000".to_string(),
            track_color: "#0000FF".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            title_font_size: 12.0,
            label_font_size: 9.0,
            tick_font_size: 9.0,
            text_color: "#1C2430".to_string(),
            separator_color: "#D7E0F0".to_string(),
            grid_color: "#EEF2F8".to_string(),
            neutral_color: "#7A8AA6".to_string(),
            track_color: "#3B6FD8".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "classic" | "default" => Some(Self::classic()),
            "modern" => Some(Self::modern()),
            _ => None,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}
