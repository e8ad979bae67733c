//! Host capabilities consumed by the renderer
//!
//! The compositor never decodes, rasterizes or waits on its own. A host
//! injects these at construction time.

use crate::error::DecodeError;
use crate::types::Rect;

/// Raster target of the compositor
pub trait DrawSurface {
    /// Decoded image type this surface can blit from
    type Image;

    /// Clear a `width` x `height` area starting at the origin.
    fn clear(&mut self, width: u32, height: u32);

    /// Copy `src` of `image` into `dst`.
    fn blit(&mut self, image: &Self::Image, src: Rect, dst: Rect);
}

/// Result of a successful decode
#[derive(Debug, Clone)]
pub struct DecodedImage<I> {
    pub image: I,
    pub width: u32,
    pub height: u32,
}

/// Turns a source identifier into a decoded image
///
/// `decode` takes `&self` so a `Sync` decoder can serve several worker
/// threads at once (see [`crate::TextureTable::preload`]).
pub trait ImageDecoder {
    type Image;

    fn decode(&self, source_id: &str) -> Result<DecodedImage<Self::Image>, DecodeError>;
}

/// "Run again around the next display refresh"
pub trait FrameTimer {
    /// Block until the next tick. Returns `false` once the host is tearing
    /// down and no further ticks will come.
    fn next_tick(&mut self) -> bool;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> f64;
}

impl<F> Clock for F
where
    F: Fn() -> f64,
{
    fn now_ms(&self) -> f64 {
        self()
    }
}
