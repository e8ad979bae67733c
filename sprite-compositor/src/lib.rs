//! Sprite Compositor - 2D scene-graph renderer core
//!
//! Composes nested, positioned sprite nodes into blit commands for a host
//! draw surface at a throttled frame rate.
//!
//! Key pieces:
//! - Append-only texture table, deduplicated by source identifier
//! - Tagged leaf/composite scene nodes with CYCLE, HOLD and FLATTEN_ALL policies
//! - Explicit-stack traversal with additive coordinate accumulation
//! - Best-effort fps cap driven by a host timer and clock

pub mod error;
pub mod host;
pub mod render;
pub mod renderer;
pub mod scene;
pub mod schedule;
pub mod texture;
pub mod types;

#[cfg(test)]
mod testing;

pub use error::*;
pub use host::*;
pub use render::*;
pub use renderer::*;
pub use scene::*;
pub use schedule::*;
pub use texture::*;
pub use types::*;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
