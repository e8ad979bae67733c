//! Scene graph: sprite nodes and the forest of roots
//!
//! A node is either a leaf that draws one image region or a composite that
//! recurses into its children under an [`AnimState`] policy. Nodes own their
//! children, so the graph is always a tree.

use crate::error::{RenderError, RenderResult};
use crate::types::{AnimState, ImageRef, TextureHandle};
use glam::{IVec2, UVec2};

/// First printable glyph in a text atlas (`!`)
pub const FIRST_GLYPH: u32 = 33;
/// Number of glyph cells in a text atlas
pub const GLYPH_COUNT: u32 = 94;
/// Tab width in glyph cells
pub const TAB_CELLS: i32 = 4;

/// Payload of a scene node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Leaf(ImageRef),
    Composite {
        state: AnimState,
        children: Vec<SceneNode>,
        cursor: usize,
    },
}

/// A positioned sprite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneNode {
    /// Position relative to the parent (or the surface, for roots)
    pub position: IVec2,
    pub size: UVec2,
    pub kind: NodeKind,
}

impl SceneNode {
    /// Leaf drawing `image`; the node takes the image's destination size.
    pub fn leaf(position: IVec2, image: ImageRef) -> Self {
        Self {
            position,
            size: image.dst_size,
            kind: NodeKind::Leaf(image),
        }
    }

    /// Composite over `children`, starting at frame 0
    pub fn composite(
        position: IVec2,
        size: UVec2,
        state: AnimState,
        children: Vec<SceneNode>,
    ) -> RenderResult<Self> {
        if children.is_empty() {
            return Err(RenderError::EmptyComposite);
        }
        Ok(Self {
            position,
            size,
            kind: NodeKind::Composite {
                state,
                children,
                cursor: 0,
            },
        })
    }

    /// Build an animated clip from a spritesheet laid out row-major.
    ///
    /// A sheet holding exactly one frame collapses to a plain leaf.
    pub fn from_sheet(
        texture: TextureHandle,
        sheet: UVec2,
        position: IVec2,
        frame: UVec2,
    ) -> RenderResult<Self> {
        if frame.x == 0 || frame.y == 0 {
            return Err(RenderError::InvalidFrameSize(frame));
        }
        if sheet.x % frame.x != 0 || sheet.y % frame.y != 0 || sheet.x == 0 || sheet.y == 0 {
            return Err(RenderError::SheetNotDivisible { sheet, frame });
        }

        let x_frames = sheet.x / frame.x;
        let y_frames = sheet.y / frame.y;
        if x_frames == 1 && y_frames == 1 {
            return Ok(Self::leaf(
                position,
                ImageRef::cell(texture, IVec2::ZERO, frame),
            ));
        }

        let children = (0..x_frames * y_frames)
            .map(|i| {
                let src = UVec2::new(i % x_frames, i / x_frames) * frame;
                Self::leaf(IVec2::ZERO, ImageRef::cell(texture, src.as_ivec2(), frame))
            })
            .collect();
        log::debug!(
            "sheet {} split into {}x{} frames of {}",
            texture.index(),
            x_frames,
            y_frames,
            frame
        );
        Self::composite(position, frame, AnimState::Cycle, children)
    }

    /// Lay out `text` as one glyph leaf per printable character.
    ///
    /// Tabs move the cursor four cells, newlines return to the left edge of
    /// the next line. Characters without a glyph still take up one cell.
    /// Cells are counted per `char`, so a character outside the Basic
    /// Multilingual Plane takes one cell rather than one per UTF-16 unit.
    /// Text with nothing drawable is rejected as an empty composite.
    pub fn from_text(
        atlas: TextureHandle,
        cell: UVec2,
        position: IVec2,
        text: &str,
    ) -> RenderResult<Self> {
        if cell.x == 0 || cell.y == 0 {
            return Err(RenderError::InvalidFrameSize(cell));
        }

        let advance = cell.as_ivec2();
        let mut cursor = IVec2::ZERO;
        let mut glyphs = Vec::new();

        for ch in text.chars() {
            match ch {
                '\t' => {
                    cursor.x += advance.x * TAB_CELLS;
                    continue;
                }
                '\n' => {
                    cursor.y += advance.y;
                    cursor.x = -advance.x;
                }
                _ => {
                    if let Some(glyph) = glyph_index(ch) {
                        let src = IVec2::new(glyph as i32 * advance.x, 0);
                        let image = ImageRef::new(atlas, cursor, cell, src, cell);
                        glyphs.push(Self::leaf(IVec2::ZERO, image));
                    }
                }
            }
            cursor.x += advance.x;
        }

        Self::composite(position, cell, AnimState::FlattenAll, glyphs)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match &self.kind {
            NodeKind::Leaf(image) => Some(image),
            NodeKind::Composite { .. } => None,
        }
    }

    pub fn children(&self) -> &[SceneNode] {
        match &self.kind {
            NodeKind::Leaf(_) => &[],
            NodeKind::Composite { children, .. } => children,
        }
    }

    pub fn children_mut(&mut self) -> &mut [SceneNode] {
        match &mut self.kind {
            NodeKind::Leaf(_) => &mut [],
            NodeKind::Composite { children, .. } => children,
        }
    }

    pub fn state(&self) -> Option<AnimState> {
        match self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Composite { state, .. } => Some(state),
        }
    }

    /// Change the animation policy of a composite.
    pub fn set_state(&mut self, new_state: AnimState) -> RenderResult<()> {
        match &mut self.kind {
            NodeKind::Leaf(_) => Err(RenderError::NotComposite),
            NodeKind::Composite { state, .. } => {
                *state = new_state;
                Ok(())
            }
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Composite { cursor, .. } => Some(cursor),
        }
    }

    /// Jump a composite to frame `frame`.
    pub fn set_cursor(&mut self, frame: usize) -> RenderResult<()> {
        match &mut self.kind {
            NodeKind::Leaf(_) => Err(RenderError::NotComposite),
            NodeKind::Composite {
                children, cursor, ..
            } => {
                if frame >= children.len() {
                    return Err(RenderError::CursorOutOfRange {
                        cursor: frame,
                        len: children.len(),
                    });
                }
                *cursor = frame;
                Ok(())
            }
        }
    }
}

/// Atlas cell of `ch`, if the glyph atlas has one
pub fn glyph_index(ch: char) -> Option<u32> {
    let code = u32::from(ch).checked_sub(FIRST_GLYPH)?;
    (code < GLYPH_COUNT).then_some(code)
}

/// Ordered roots owned by a renderer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneForest {
    roots: Vec<SceneNode>,
}

impl SceneForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root, returning its index.
    pub fn push(&mut self, node: SceneNode) -> usize {
        self.roots.push(node);
        self.roots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SceneNode> {
        self.roots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.roots.get_mut(index)
    }

    pub fn roots(&self) -> &[SceneNode] {
        &self.roots
    }

    pub fn roots_mut(&mut self) -> &mut [SceneNode] {
        &mut self.roots
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SceneNode> {
        self.roots.iter()
    }
}
