//! Frame compositor
//!
//! Flattens the scene forest into an ordered list of blit commands for one
//! frame. Traversal uses an explicit stack, so nesting depth is bounded by
//! heap rather than call-stack size. CYCLE composites advance their cursor
//! as a side effect of being visited.

use crate::error::{RenderError, RenderResult};
use crate::scene::{NodeKind, SceneNode};
use crate::types::{AnimState, ImageRef, Rect, TextureHandle};
use glam::IVec2;

/// A single "copy `src` of `texture` into `dst`" command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub texture: TextureHandle,
    pub src: Rect,
    pub dst: Rect,
}

impl Blit {
    /// Blit command for a leaf reached at accumulated `offset`
    fn from_leaf(position: IVec2, offset: IVec2, image: &ImageRef) -> Self {
        Self {
            texture: image.texture,
            src: image.src_rect(),
            dst: Rect::new(position + offset + image.dst_offset, image.dst_size),
        }
    }
}

/// Compositor statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames composited successfully
    pub frames: u64,
    /// Blits emitted by the most recent frame
    pub last_blits: usize,
}

/// Explicit-stack scene traversal with a reusable command buffer
#[derive(Debug, Default)]
pub struct FrameCompositor {
    blits: Vec<Blit>,
    stats: FrameStats,
}

impl FrameCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Composite one frame of `roots`.
    ///
    /// Blits come out in append order, depth-first. A malformed composite
    /// aborts the whole frame before any CYCLE cursor moves.
    pub fn composite(&mut self, roots: &mut [SceneNode]) -> RenderResult<&[Blit]> {
        self.composite_with(roots, |_| true)
    }

    /// Like [`Self::composite`], additionally rejecting leaves whose texture
    /// `is_known` does not accept.
    pub fn composite_with<F>(&mut self, roots: &mut [SceneNode], is_known: F) -> RenderResult<&[Blit]>
    where
        F: Fn(TextureHandle) -> bool,
    {
        Self::validate(roots, is_known)?;
        self.blits.clear();

        // pushed in reverse so siblings pop in append order
        let mut stack: Vec<(&mut SceneNode, IVec2)> = Vec::with_capacity(roots.len());
        stack.extend(roots.iter_mut().rev().map(|node| (node, IVec2::ZERO)));

        while let Some((node, offset)) = stack.pop() {
            let SceneNode { position, kind, .. } = node;
            match kind {
                NodeKind::Leaf(image) => {
                    self.blits.push(Blit::from_leaf(*position, offset, image));
                }
                NodeKind::Composite {
                    state,
                    children,
                    cursor,
                } => {
                    if children.is_empty() {
                        return Err(RenderError::EmptyComposite);
                    }
                    let origin = offset + *position;

                    match *state {
                        AnimState::Cycle | AnimState::Hold => {
                            let len = children.len();
                            let current = *cursor;
                            if current >= len {
                                return Err(RenderError::CursorOutOfRange {
                                    cursor: current,
                                    len,
                                });
                            }
                            if *state == AnimState::Cycle {
                                *cursor = (current + 1) % len;
                            }
                            stack.push((&mut children[current], origin));
                        }
                        AnimState::FlattenAll => {
                            stack.extend(children.iter_mut().rev().map(|child| (child, origin)));
                        }
                    }
                }
            }
        }

        self.stats.frames += 1;
        self.stats.last_blits = self.blits.len();
        log::trace!(
            "frame {} composited: {} blits",
            self.stats.frames,
            self.blits.len()
        );
        Ok(&self.blits)
    }

    /// Check the nodes the next frame will visit without touching any state.
    ///
    /// Visits exactly what [`Self::composite`] would: the current child of
    /// CYCLE and HOLD composites, every child of FLATTEN_ALL ones.
    pub fn validate<F>(roots: &[SceneNode], is_known: F) -> RenderResult<()>
    where
        F: Fn(TextureHandle) -> bool,
    {
        let mut stack: Vec<&SceneNode> = roots.iter().collect();
        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Leaf(image) => {
                    if !is_known(image.texture) {
                        return Err(RenderError::UnknownTexture(image.texture));
                    }
                }
                NodeKind::Composite {
                    state,
                    children,
                    cursor,
                } => {
                    if children.is_empty() {
                        return Err(RenderError::EmptyComposite);
                    }
                    match state {
                        AnimState::Cycle | AnimState::Hold => {
                            let child = children.get(*cursor).ok_or(RenderError::CursorOutOfRange {
                                cursor: *cursor,
                                len: children.len(),
                            })?;
                            stack.push(child);
                        }
                        AnimState::FlattenAll => stack.extend(children.iter()),
                    }
                }
            }
        }
        Ok(())
    }

    /// Commands from the most recent successful frame
    pub fn blits(&self) -> &[Blit] {
        &self.blits
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::UVec2;

    fn leaf_at(texture: usize, x: i32, y: i32) -> SceneNode {
        SceneNode::leaf(
            IVec2::new(x, y),
            ImageRef::cell(TextureHandle(texture), IVec2::ZERO, UVec2::new(4, 4)),
        )
    }

    fn textures(blits: &[Blit]) -> Vec<usize> {
        blits.iter().map(|blit| blit.texture.index()).collect()
    }

    fn clip(state: AnimState, frames: usize) -> SceneNode {
        let children = (0..frames).map(|i| leaf_at(i, 0, 0)).collect();
        SceneNode::composite(IVec2::ZERO, UVec2::new(4, 4), state, children).unwrap()
    }

    #[test]
    fn test_coordinate_accumulation() {
        let image = ImageRef::new(
            TextureHandle(0),
            IVec2::new(3, 4),
            UVec2::new(8, 8),
            IVec2::new(16, 0),
            UVec2::new(8, 8),
        );
        let inner = SceneNode::composite(
            IVec2::new(20, 30),
            UVec2::new(8, 8),
            AnimState::Hold,
            vec![SceneNode::leaf(IVec2::ZERO, image)],
        )
        .unwrap();
        let outer = SceneNode::composite(
            IVec2::new(100, 200),
            UVec2::new(8, 8),
            AnimState::FlattenAll,
            vec![inner],
        )
        .unwrap();

        let mut roots = vec![outer];
        let mut compositor = FrameCompositor::new();
        let blits = compositor.composite(&mut roots).unwrap();

        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].dst, Rect::from_xywh(123, 234, 8, 8));
        assert_eq!(blits[0].src, Rect::from_xywh(16, 0, 8, 8));
    }

    #[test]
    fn test_cycle_visits_children_in_order() {
        let mut roots = vec![clip(AnimState::Cycle, 3), clip(AnimState::Hold, 3)];
        let mut compositor = FrameCompositor::new();

        let mut seen = Vec::new();
        for _ in 0..4 {
            let blits = compositor.composite(&mut roots).unwrap();
            seen.push(blits[0].texture.index());
        }

        assert_eq!(seen, vec![0, 1, 2, 0]);
        assert_eq!(roots[0].cursor(), Some(1));
        // the neighbouring HOLD clip is untouched
        assert_eq!(roots[1].cursor(), Some(0));
    }

    #[test]
    fn test_hold_is_stable() {
        let mut roots = vec![clip(AnimState::Hold, 5)];
        roots[0].set_cursor(2).unwrap();
        let mut compositor = FrameCompositor::new();

        for _ in 0..10 {
            let blits = compositor.composite(&mut roots).unwrap();
            assert_eq!(textures(blits), vec![2]);
        }
        assert_eq!(roots[0].cursor(), Some(2));
    }

    #[test]
    fn test_flatten_all_preserves_sibling_order() {
        let group = SceneNode::composite(
            IVec2::new(1, 1),
            UVec2::ONE,
            AnimState::FlattenAll,
            vec![leaf_at(1, 0, 0), clip(AnimState::Hold, 3), leaf_at(2, 0, 0)],
        )
        .unwrap();
        let mut roots = vec![leaf_at(7, 0, 0), group, leaf_at(9, 0, 0)];
        let mut compositor = FrameCompositor::new();

        let blits = compositor.composite(&mut roots).unwrap();
        assert_eq!(textures(blits), vec![7, 1, 0, 2, 9]);
        assert_eq!(compositor.stats().last_blits, 5);
    }

    #[test]
    fn test_empty_composite_is_fatal() {
        let broken = SceneNode {
            position: IVec2::ZERO,
            size: UVec2::ONE,
            kind: NodeKind::Composite {
                state: AnimState::FlattenAll,
                children: Vec::new(),
                cursor: 0,
            },
        };
        let mut roots = vec![clip(AnimState::Cycle, 3), broken];
        let mut compositor = FrameCompositor::new();

        assert!(matches!(
            compositor.composite(&mut roots),
            Err(RenderError::EmptyComposite)
        ));
        assert_eq!(compositor.stats().frames, 0);
        // the rejected frame must not step the clip visited before the bad node
        assert_eq!(roots[0].cursor(), Some(0));
    }

    #[test]
    fn test_unknown_texture_leaves_cursors_untouched() {
        let mut roots = vec![clip(AnimState::Cycle, 3), leaf_at(42, 0, 0)];
        let mut compositor = FrameCompositor::new();
        let known = |texture: TextureHandle| texture.index() < 3;

        assert!(matches!(
            compositor.composite_with(&mut roots, known),
            Err(RenderError::UnknownTexture(TextureHandle(42)))
        ));
        assert_eq!(roots[0].cursor(), Some(0));

        roots.pop();
        let blits = compositor.composite_with(&mut roots, known).unwrap();
        assert_eq!(textures(blits), vec![0]);
        assert_eq!(roots[0].cursor(), Some(1));
    }

    #[test]
    fn test_validate_skips_inactive_frames() {
        // a HOLD clip only ever draws its current child
        let group = SceneNode::composite(
            IVec2::ZERO,
            UVec2::ONE,
            AnimState::Hold,
            vec![leaf_at(0, 0, 0), leaf_at(99, 0, 0)],
        )
        .unwrap();
        let roots = vec![group];

        assert!(FrameCompositor::validate(&roots, |texture| texture.index() == 0).is_ok());
    }

    #[test]
    fn test_cursor_out_of_range_is_fatal() {
        let mut node = clip(AnimState::Hold, 2);
        if let NodeKind::Composite { cursor, .. } = &mut node.kind {
            *cursor = 5;
        }
        let mut roots = vec![node];

        let result = FrameCompositor::new().composite(&mut roots).map(|b| b.len());
        assert!(matches!(
            result,
            Err(RenderError::CursorOutOfRange { cursor: 5, len: 2 })
        ));
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut node = leaf_at(0, 1, 0);
        for _ in 0..10_000 {
            node = SceneNode::composite(IVec2::new(1, 0), UVec2::ONE, AnimState::Hold, vec![node])
                .unwrap();
        }
        let mut roots = vec![node];

        let blits = FrameCompositor::new()
            .composite(&mut roots)
            .map(|b| b.to_vec())
            .unwrap();
        assert_eq!(blits[0].dst.origin, IVec2::new(10_001, 0));

        // drop iteratively; the default drop glue would recurse 10k levels
        let mut pending = std::mem::take(&mut roots);
        while let Some(mut next) = pending.pop() {
            if let NodeKind::Composite { children, .. } = &mut next.kind {
                pending.append(children);
            }
        }
    }
}
