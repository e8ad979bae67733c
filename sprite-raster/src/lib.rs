//! Sprite Raster - reference host for the sprite compositor
//!
//! Headless stand-ins for the capabilities a host normally provides:
//! - `PixelCanvas`: premultiplied RGBA8 frame buffer with clipped blits
//! - `FileDecoder` / `MemoryDecoder`: PNG decoding via the `image` crate
//! - `SystemClock` / `SleepTimer`: monotonic clock and refresh-paced ticks

pub mod canvas;
pub mod decode;
pub mod pacing;
pub mod types;

pub use canvas::*;
pub use decode::*;
pub use pacing::*;
pub use types::*;
