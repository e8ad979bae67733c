//! Renderer: owns the texture table, the scene forest and the compositor,
//! and drives the injected draw surface and decoder.

use crate::error::{RenderError, RenderResult};
use crate::host::{Clock, DrawSurface, FrameTimer, ImageDecoder};
use crate::render::{FrameCompositor, FrameStats};
use crate::schedule::{FrameScheduler, SchedulerStats};
use crate::scene::{SceneForest, SceneNode};
use crate::texture::TextureTable;
use crate::types::{RendererConfig, TextStyle, TextureHandle};
use glam::{IVec2, UVec2};

/// A sprite renderer bound to one draw surface and one decoder
pub struct Renderer<S, D>
where
    S: DrawSurface,
    D: ImageDecoder<Image = S::Image>,
{
    config: RendererConfig,
    text_style: TextStyle,
    surface: S,
    decoder: D,
    textures: TextureTable<S::Image>,
    forest: SceneForest,
    compositor: FrameCompositor,
}

impl<S, D> Renderer<S, D>
where
    S: DrawSurface,
    D: ImageDecoder<Image = S::Image>,
{
    pub fn new(config: RendererConfig, surface: S, decoder: D) -> RenderResult<Self> {
        if config.fps == 0 {
            return Err(RenderError::InvalidFps);
        }
        log::debug!(
            "renderer created: {}x{} at {} fps",
            config.width,
            config.height,
            config.fps
        );
        Ok(Self {
            config,
            text_style: TextStyle::default(),
            surface,
            decoder,
            textures: TextureTable::new(),
            forest: SceneForest::new(),
            compositor: FrameCompositor::new(),
        })
    }

    pub fn with_text_style(mut self, style: TextStyle) -> Self {
        self.text_style = style;
        self
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn text_style(&self) -> &TextStyle {
        &self.text_style
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn textures(&self) -> &TextureTable<S::Image> {
        &self.textures
    }

    pub fn forest(&self) -> &SceneForest {
        &self.forest
    }

    pub fn forest_mut(&mut self) -> &mut SceneForest {
        &mut self.forest
    }

    pub fn frame_stats(&self) -> FrameStats {
        self.compositor.stats()
    }

    /// Load (or look up) a texture by source identifier.
    pub fn load_source(&mut self, source_id: &str) -> RenderResult<TextureHandle> {
        self.textures.load(source_id, &self.decoder)
    }

    /// Decode several sources in parallel ahead of building sprites.
    pub fn preload(&mut self, source_ids: &[&str]) -> RenderResult<Vec<TextureHandle>>
    where
        D: Sync,
        S::Image: Send,
    {
        self.textures.preload(source_ids, &self.decoder)
    }

    /// Append a spritesheet clip at `position`, returning its root index.
    ///
    /// Sheets with several frames cycle one frame per rendered frame.
    pub fn load_sprite(
        &mut self,
        source_id: &str,
        position: IVec2,
        frame: UVec2,
    ) -> RenderResult<usize> {
        let handle = self.load_source(source_id)?;
        let sheet = self.texture_size(handle)?;
        let node = SceneNode::from_sheet(handle, sheet, position, frame)?;
        Ok(self.forest.push(node))
    }

    /// Append a text run drawn with the configured glyph atlas.
    pub fn load_text(&mut self, text: &str, position: IVec2) -> RenderResult<usize> {
        let atlas = self.textures.load(&self.text_style.atlas, &self.decoder)?;
        let node = SceneNode::from_text(atlas, self.text_style.cell, position, text)?;
        Ok(self.forest.push(node))
    }

    /// Append a hand-built node.
    pub fn add_sprite(&mut self, node: SceneNode) -> usize {
        self.forest.push(node)
    }

    /// Composite the forest and draw it.
    ///
    /// The frame is validated before any animation advances, so a rejected
    /// frame leaves both the surface and every CYCLE cursor as they were.
    /// Returns the number of blits issued.
    pub fn render_frame(&mut self) -> RenderResult<usize> {
        let textures = &self.textures;
        let blits = self
            .compositor
            .composite_with(self.forest.roots_mut(), |handle| textures.get(handle).is_some())?;

        self.surface.clear(self.config.width, self.config.height);
        for blit in blits {
            let texture = self
                .textures
                .get(blit.texture)
                .ok_or(RenderError::UnknownTexture(blit.texture))?;
            self.surface.blit(&texture.image, blit.src, blit.dst);
        }
        Ok(blits.len())
    }

    /// Run the throttled render loop with the configured frame rate.
    ///
    /// `callback` sees the forest after every rendered frame and may change
    /// it (for example to switch a HOLD clip to another frame).
    pub fn render<T, C, F>(&mut self, timer: T, clock: C, callback: F) -> RenderResult<SchedulerStats>
    where
        T: FrameTimer,
        C: Clock,
        F: FnMut(&mut SceneForest) + 'static,
    {
        let mut scheduler = FrameScheduler::new(timer, clock).with_fps(self.config.fps)?;
        scheduler.set_callback(callback);
        scheduler.run(self)
    }

    fn texture_size(&self, handle: TextureHandle) -> RenderResult<UVec2> {
        self.textures
            .get(handle)
            .map(|texture| texture.size())
            .ok_or(RenderError::UnknownTexture(handle))
    }
}
