//! Image decode services: files on disk or images registered in memory

use crate::types::{Rgba, RgbaImage};
use parking_lot::Mutex;
use sprite_compositor::{DecodeError, DecodedImage, ImageDecoder};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Decode encoded image bytes into premultiplied RGBA8.
pub fn decode_rgba(source_id: &str, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
    let decoded = image::load_from_memory(bytes).map_err(|err| DecodeError::Malformed {
        source_id: source_id.to_string(),
        reason: err.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels = rgba
        .into_raw()
        .chunks_exact(4)
        .map(|px| premultiply(Rgba::new(px[0], px[1], px[2], px[3])))
        .collect();
    Ok(RgbaImage::new(width, height, pixels))
}

fn premultiply(px: Rgba) -> Rgba {
    let a = u16::from(px.a);
    if a == 0 {
        return Rgba::TRANSPARENT;
    }
    let scale = |c: u8| ((u16::from(c) * a + 127) / 255) as u8;
    Rgba::new(scale(px.r), scale(px.g), scale(px.b), px.a)
}

/// Decode statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub decoded: u64,
    pub failed: u64,
    pub bytes_read: u64,
}

/// Resolves source identifiers as paths relative to a root directory
///
/// Absolute identifiers and `..` components are rejected, so reads never
/// leave the root.
///
/// Safe to share across the compositor's parallel preload workers.
#[derive(Debug)]
pub struct FileDecoder {
    root: PathBuf,
    stats: Mutex<DecodeStats>,
}

impl FileDecoder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stats: Mutex::new(DecodeStats::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats(&self) -> DecodeStats {
        *self.stats.lock()
    }

    fn resolve(&self, source_id: &str) -> Result<PathBuf, DecodeError> {
        let relative = Path::new(source_id);
        let contained = relative
            .components()
            .all(|part| matches!(part, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(DecodeError::OutsideRoot(source_id.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn read(&self, source_id: &str) -> Result<Vec<u8>, DecodeError> {
        let path = self.resolve(source_id)?;
        std::fs::read(&path).map_err(|error| match error.kind() {
            ErrorKind::NotFound => DecodeError::NotFound(source_id.to_string()),
            _ => DecodeError::Io {
                source_id: source_id.to_string(),
                error,
            },
        })
    }
}

impl ImageDecoder for FileDecoder {
    type Image = RgbaImage;

    fn decode(&self, source_id: &str) -> Result<DecodedImage<RgbaImage>, DecodeError> {
        let result = self
            .read(source_id)
            .and_then(|bytes| decode_rgba(source_id, &bytes).map(|image| (bytes.len(), image)));

        let mut stats = self.stats.lock();
        match result {
            Ok((len, image)) => {
                stats.decoded += 1;
                stats.bytes_read += len as u64;
                log::debug!(
                    "decoded {source_id}: {}x{} from {len} bytes",
                    image.width,
                    image.height
                );
                Ok(DecodedImage {
                    width: image.width,
                    height: image.height,
                    image,
                })
            }
            Err(err) => {
                stats.failed += 1;
                log::warn!("failed to decode {source_id}: {err}");
                Err(err)
            }
        }
    }
}

/// Serves images registered up front, e.g. assets bundled into the binary
#[derive(Debug, Default, Clone)]
pub struct MemoryDecoder {
    images: HashMap<String, RgbaImage>,
}

impl MemoryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source_id: impl Into<String>, image: RgbaImage) {
        self.images.insert(source_id.into(), image);
    }

    pub fn with_image(mut self, source_id: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(source_id, image);
        self
    }

    /// Register encoded bytes (PNG) under `source_id`.
    pub fn insert_encoded(&mut self, source_id: &str, bytes: &[u8]) -> Result<(), DecodeError> {
        let image = decode_rgba(source_id, bytes)?;
        self.insert(source_id, image);
        Ok(())
    }
}

impl ImageDecoder for MemoryDecoder {
    type Image = RgbaImage;

    fn decode(&self, source_id: &str) -> Result<DecodedImage<RgbaImage>, DecodeError> {
        let image = self
            .images
            .get(source_id)
            .cloned()
            .ok_or_else(|| DecodeError::NotFound(source_id.to_string()))?;
        Ok(DecodedImage {
            width: image.width,
            height: image.height,
            image,
        })
    }
}
