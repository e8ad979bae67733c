//! Error types for the sprite compositor

use crate::types::TextureHandle;
use glam::UVec2;

pub type RenderResult<T> = Result<T, RenderError>;

/// Failure reported by an [`crate::ImageDecoder`]
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("source not found: {0}")]
    NotFound(String),

    #[error("i/o error while reading {source_id}: {error}")]
    Io {
        source_id: String,
        #[source]
        error: std::io::Error,
    },

    #[error("could not decode {source_id}: {reason}")]
    Malformed { source_id: String, reason: String },

    #[error("source {0} resolves outside the decoder root")]
    OutsideRoot(String),
}

/// Contract violations and load failures surfaced by the renderer
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("composite node has no children")]
    EmptyComposite,

    #[error("frame cursor {cursor} out of range for {len} children")]
    CursorOutOfRange { cursor: usize, len: usize },

    #[error("operation needs a composite node, found a leaf")]
    NotComposite,

    #[error("unknown texture handle {0:?}")]
    UnknownTexture(TextureHandle),

    #[error("frame size must be non-zero, got {0}")]
    InvalidFrameSize(UVec2),

    #[error("sheet of {sheet} is not a whole number of {frame} frames")]
    SheetNotDivisible { sheet: UVec2, frame: UVec2 },

    #[error("fps must be greater than zero")]
    InvalidFps,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
