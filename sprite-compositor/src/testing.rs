//! Test doubles shared by the unit tests

use crate::error::DecodeError;
use crate::host::{DecodedImage, DrawSurface, ImageDecoder};
use crate::renderer::Renderer;
use crate::types::{Rect, RendererConfig};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Decoder that resolves `"name:WxH"` identifiers to blank images
#[derive(Default)]
pub struct FakeDecoder {
    calls: AtomicUsize,
}

impl FakeDecoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageDecoder for FakeDecoder {
    type Image = String;

    fn decode(&self, source_id: &str) -> Result<DecodedImage<String>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let dims = source_id
            .rsplit_once(':')
            .and_then(|(_, dims)| dims.split_once('x'))
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)));
        match dims {
            Some((width, height)) => Ok(DecodedImage {
                image: source_id.to_string(),
                width,
                height,
            }),
            None => Err(DecodeError::NotFound(source_id.to_string())),
        }
    }
}

/// Calls seen by a [`RecordingSurface`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Clear(u32, u32),
    Blit(String, Rect, Rect),
}

/// Surface that records every call
#[derive(Default)]
pub struct RecordingSurface {
    pub ops: Vec<Op>,
}

impl DrawSurface for RecordingSurface {
    type Image = String;

    fn clear(&mut self, width: u32, height: u32) {
        self.ops.push(Op::Clear(width, height));
    }

    fn blit(&mut self, image: &String, src: Rect, dst: Rect) {
        self.ops.push(Op::Blit(image.clone(), src, dst));
    }
}

pub fn recording_renderer() -> Renderer<RecordingSurface, FakeDecoder> {
    let _ = env_logger::builder().is_test(true).try_init();
    Renderer::new(
        RendererConfig::new(320, 240),
        RecordingSurface::default(),
        FakeDecoder::default(),
    )
    .unwrap()
}
