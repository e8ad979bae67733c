//! Core type definitions for the sprite compositor
//!
//! Geometry, texture handles, leaf image references and the flat
//! configuration records consumed by the renderer.

use glam::{IVec2, UVec2};

/// Default target frame rate.
pub const DEFAULT_FPS: u32 = 24;

/// Index of a decoded texture inside a [`crate::TextureTable`].
///
/// Handles are never invalidated: the table is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub usize);

impl TextureHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub origin: IVec2,
    pub size: UVec2,
}

impl Rect {
    pub fn new(origin: IVec2, size: UVec2) -> Self {
        Self { origin, size }
    }

    pub fn from_xywh(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self {
            origin: IVec2::new(x, y),
            size: UVec2::new(w, h),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size.x == 0 || self.size.y == 0
    }

    /// Exclusive right/bottom corner
    pub fn max(&self) -> IVec2 {
        self.origin + self.size.as_ivec2()
    }
}

/// Leaf payload: blit `src` of `texture` at `dst_offset`, sized `dst_size`.
///
/// `dst_offset` is relative to the owning node's position plus every
/// ancestor position; it is never an absolute destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub texture: TextureHandle,
    pub dst_offset: IVec2,
    pub dst_size: UVec2,
    pub src_offset: IVec2,
    pub src_size: UVec2,
}

impl ImageRef {
    pub fn new(
        texture: TextureHandle,
        dst_offset: IVec2,
        dst_size: UVec2,
        src_offset: IVec2,
        src_size: UVec2,
    ) -> Self {
        Self {
            texture,
            dst_offset,
            dst_size,
            src_offset,
            src_size,
        }
    }

    /// Whole-cell image: drawn at the node origin, same size on both sides
    pub fn cell(texture: TextureHandle, src_offset: IVec2, size: UVec2) -> Self {
        Self::new(texture, IVec2::ZERO, size, src_offset, size)
    }

    pub fn src_rect(&self) -> Rect {
        Rect::new(self.src_offset, self.src_size)
    }
}

/// Animation policy of a composite node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimState {
    /// Show `children[cursor]`, then advance the cursor (wrapping).
    #[default]
    Cycle,
    /// Show `children[cursor]` without advancing.
    Hold,
    /// Show every child, every frame.
    FlattenAll,
}

/// Construction-time renderer options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl RendererConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: DEFAULT_FPS,
        }
    }
}

/// Monospace glyph atlas used for text runs
///
/// The atlas is a single row of 94 cells holding the printable ASCII range
/// starting at `!` (code 33).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub atlas: String,
    pub cell: UVec2,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            atlas: "11x16_Linux_Libertine_Mono_O.png".to_string(),
            cell: UVec2::new(11, 16),
        }
    }
}
