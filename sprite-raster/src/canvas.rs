//! CPU frame buffer implementing the compositor's draw surface

use crate::types::{Rgba, RgbaImage};
use glam::IVec2;
use sprite_compositor::{DrawSurface, Rect};

/// Row-major premultiplied RGBA8 frame buffer
///
/// Blits are clipped against both the source image and the canvas, and
/// composited source-over. When source and destination sizes differ the
/// source is sampled nearest-neighbour.
#[derive(Debug, Clone)]
pub struct PixelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
    blits: u64,
}

impl PixelCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; (width as usize) * (height as usize)],
            blits: 0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Frame as raw RGBA8 bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Blits issued since creation
    pub fn blit_count(&self) -> u64 {
        self.blits
    }

    /// Snapshot the current frame as an image
    pub fn snapshot(&self) -> RgbaImage {
        RgbaImage::new(self.width, self.height, self.pixels.clone())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

impl DrawSurface for PixelCanvas {
    type Image = RgbaImage;

    fn clear(&mut self, width: u32, height: u32) {
        let w = width.min(self.width);
        let h = height.min(self.height);
        for y in 0..h {
            let start = self.offset(0, y);
            self.pixels[start..start + w as usize].fill(Rgba::TRANSPARENT);
        }
    }

    fn blit(&mut self, image: &RgbaImage, src: Rect, dst: Rect) {
        self.blits += 1;
        if src.is_empty() || dst.is_empty() {
            return;
        }

        // visible part of dst on the canvas
        let lo = dst.origin.max(IVec2::ZERO);
        let hi = dst
            .max()
            .min(IVec2::new(self.width as i32, self.height as i32));
        if lo.x >= hi.x || lo.y >= hi.y {
            return;
        }

        let src_w = src.size.x as i64;
        let src_h = src.size.y as i64;
        let dst_w = dst.size.x as i64;
        let dst_h = dst.size.y as i64;

        for y in lo.y..hi.y {
            let sy = src.origin.y as i64 + (y - dst.origin.y) as i64 * src_h / dst_h;
            if sy < 0 || sy >= image.height as i64 {
                continue;
            }
            for x in lo.x..hi.x {
                let sx = src.origin.x as i64 + (x - dst.origin.x) as i64 * src_w / dst_w;
                if sx < 0 || sx >= image.width as i64 {
                    continue;
                }
                let Some(source) = image.pixel(sx as u32, sy as u32) else {
                    continue;
                };
                let at = self.offset(x as u32, y as u32);
                self.pixels[at] = source.over(self.pixels[at]);
            }
        }
    }
}
