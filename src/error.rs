use crate::ir::GlyphVariant;
use thiserror::Error;

/// Everything that can abort a draw. None of these are recoverable inside the
/// engine: the caller fixes the input and draws again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("glyph `{variant}` needs a single-position feature, but `{label}` spans {start}..{stop}")]
    Geometry {
        variant: GlyphVariant,
        label: String,
        start: f64,
        stop: f64,
    },

    #[error("could not measure label `{text}`: {reason}")]
    Measurement { text: String, reason: String },
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
