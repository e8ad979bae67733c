//! Append-only texture table with per-source deduplication

use crate::error::RenderResult;
use crate::host::{DecodedImage, ImageDecoder};
use crate::types::TextureHandle;
use glam::UVec2;
use rayon::prelude::*;
use std::collections::HashMap;

/// A decoded image plus the identifier it was loaded from
#[derive(Debug, Clone)]
pub struct Texture<I> {
    pub source_id: String,
    pub image: I,
    pub width: u32,
    pub height: u32,
}

impl<I> Texture<I> {
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width, self.height)
    }
}

/// Process-wide texture cache owned by one renderer
///
/// Entries are only ever appended, so a [`TextureHandle`] stays valid for
/// the lifetime of the table.
#[derive(Debug)]
pub struct TextureTable<I> {
    entries: Vec<Texture<I>>,
    index: HashMap<String, TextureHandle>,
}

impl<I> Default for TextureTable<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> TextureTable<I> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&Texture<I>> {
        self.entries.get(handle.index())
    }

    /// Handle of an already loaded source
    pub fn find(&self, source_id: &str) -> Option<TextureHandle> {
        self.index.get(source_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TextureHandle, &Texture<I>)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, texture)| (TextureHandle(i), texture))
    }

    /// Load `source_id`, decoding it only on first reference.
    pub fn load<D>(&mut self, source_id: &str, decoder: &D) -> RenderResult<TextureHandle>
    where
        D: ImageDecoder<Image = I> + ?Sized,
    {
        if let Some(handle) = self.find(source_id) {
            return Ok(handle);
        }

        let decoded = decoder.decode(source_id)?;
        Ok(self.append(source_id, decoded))
    }

    /// Load a batch of sources, decoding the missing ones in parallel.
    ///
    /// Each distinct source is decoded at most once, even when it appears
    /// several times in `source_ids`. Decoded textures are appended on the
    /// calling thread in first-appearance order, so handle assignment is
    /// deterministic. Nothing is appended if any decode fails.
    pub fn preload<D>(&mut self, source_ids: &[&str], decoder: &D) -> RenderResult<Vec<TextureHandle>>
    where
        D: ImageDecoder<Image = I> + Sync + ?Sized,
        I: Send,
    {
        let mut pending: Vec<&str> = Vec::new();
        for &source_id in source_ids {
            if self.find(source_id).is_none() && !pending.contains(&source_id) {
                pending.push(source_id);
            }
        }

        let decoded = pending
            .par_iter()
            .map(|source_id| decoder.decode(source_id))
            .collect::<Result<Vec<_>, _>>()?;

        for (source_id, image) in pending.iter().zip(decoded) {
            self.append(source_id, image);
        }
        log::debug!(
            "preloaded {} new textures ({} requested)",
            pending.len(),
            source_ids.len()
        );

        Ok(source_ids
            .iter()
            .filter_map(|source_id| self.find(source_id))
            .collect())
    }

    fn append(&mut self, source_id: &str, decoded: DecodedImage<I>) -> TextureHandle {
        let handle = TextureHandle(self.entries.len());
        log::debug!(
            "texture {} loaded from {source_id} ({}x{})",
            handle.index(),
            decoded.width,
            decoded.height
        );
        self.entries.push(Texture {
            source_id: source_id.to_string(),
            image: decoded.image,
            width: decoded.width,
            height: decoded.height,
        });
        self.index.insert(source_id.to_string(), handle);
        handle
    }
}
