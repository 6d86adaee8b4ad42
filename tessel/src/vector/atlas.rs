// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bin-packed atlas of rasterized vector paths.

use hashbrown::HashMap;

use super::path::PathId;
use crate::atlas::{AtlasImage, Packer, UvRect};
use crate::{Error, Result};

/// Placement of one rasterized path inside the vector atlas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CachedVectorGraphicItem {
    /// Left edge of the content, inside the gutter.
    pub atlas_x: u32,
    /// Top edge of the content, inside the gutter.
    pub atlas_y: u32,
    /// Widest content the allocated rectangle can hold.
    pub capacity_w: u32,
    /// Tallest content the allocated rectangle can hold.
    pub capacity_h: u32,
    /// Width of the current content.
    pub content_w: u32,
    /// Height of the current content.
    pub content_h: u32,
    /// Path-space position drawn at the content's top-left pixel.
    pub origin: [f32; 2],
    /// Padding that was added around the path geometry.
    pub pad: f32,
    /// Texture coordinates of the content with a half-pixel inset.
    pub uv: UvRect,
    /// The content must be rasterized again.
    pub dirty: bool,
    /// The item owns space in the atlas.
    pub in_atlas: bool,
}

/// Packs rasterized paths into a single texture.
///
/// Items are reused in place while their content fits the rectangle they were
/// first given. When an item outgrows it, a new rectangle is packed and the old
/// one is not reclaimed: the packer has no free operation, so the space is lost
/// until [`VectorAtlas::clear`].
#[derive(Debug)]
pub struct VectorAtlas {
    packer: Packer,
    image: AtlasImage,
    items: HashMap<PathId, CachedVectorGraphicItem>,
    gutter: u32,
}

impl VectorAtlas {
    /// Creates an empty atlas.
    pub fn new(width: u32, height: u32, gutter: u32) -> Self {
        Self {
            packer: Packer::new(width, height),
            image: AtlasImage::new(width, height),
            items: HashMap::new(),
            gutter,
        }
    }

    /// Pixel storage.
    pub fn image(&self) -> &AtlasImage {
        &self.image
    }

    /// Mutable pixel storage, written by compute backends.
    pub fn image_mut(&mut self) -> &mut AtlasImage {
        &mut self.image
    }

    /// Looks up an item.
    pub fn item(&self, key: PathId) -> Option<&CachedVectorGraphicItem> {
        self.items.get(&key)
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no item is cached.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Flags an item for rasterization; returns `false` if it is unknown.
    pub fn mark_dirty(&mut self, key: PathId) -> bool {
        match self.items.get_mut(&key) {
            Some(item) => {
                item.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Gives up the placement of an item. It is not rasterized again until it
    /// is cached again.
    pub(crate) fn evict(&mut self, key: PathId) {
        if let Some(item) = self.items.get_mut(&key) {
            item.in_atlas = false;
            item.dirty = false;
        }
    }

    /// Drops every item and frees all space.
    pub fn clear(&mut self) {
        self.items.clear();
        self.packer.reset();
        self.image.clear();
    }

    /// Places content of `width` by `height` pixels for `key` and marks it dirty.
    pub fn cache_item(
        &mut self,
        key: PathId,
        width: u32,
        height: u32,
        origin: [f32; 2],
        pad: f32,
    ) -> Result<&CachedVectorGraphicItem> {
        let (atlas_w, atlas_h) = self.packer.size();
        let reuse = self
            .items
            .get(&key)
            .filter(|item| {
                item.in_atlas && width <= item.capacity_w && height <= item.capacity_h
            })
            .map(|item| (item.atlas_x, item.atlas_y, item.capacity_w, item.capacity_h));

        let (atlas_x, atlas_y, capacity_w, capacity_h) = match reuse {
            Some(place) => place,
            None => {
                let padded_w = width + 2 * self.gutter;
                let padded_h = height + 2 * self.gutter;
                let (x, y) = self
                    .packer
                    .push_rect(padded_w, padded_h)
                    .ok_or_else(|| Error::atlas_full(padded_w, padded_h))?;
                if self.items.contains_key(&key) {
                    log::debug!("vector item {key} outgrew its slot, leaking the old one");
                }
                (x + self.gutter, y + self.gutter, width, height)
            }
        };

        let item = CachedVectorGraphicItem {
            atlas_x,
            atlas_y,
            capacity_w,
            capacity_h,
            content_w: width,
            content_h: height,
            origin,
            pad,
            uv: UvRect::inset(atlas_x, atlas_y, width, height, atlas_w, atlas_h),
            dirty: true,
            in_atlas: true,
        };
        let slot = self.items.entry(key).or_insert(item);
        *slot = item;
        Ok(slot)
    }

    /// Keys of all dirty placed items in ascending order.
    pub(crate) fn dirty_keys(&self) -> Vec<PathId> {
        let mut keys: Vec<PathId> = self
            .items
            .iter()
            .filter(|(_, item)| item.dirty && item.in_atlas)
            .map(|(key, _)| *key)
            .collect();
        keys.sort_unstable();
        keys
    }

    pub(crate) fn clear_dirty(&mut self, key: PathId) {
        if let Some(item) = self.items.get_mut(&key) {
            item.dirty = false;
        }
    }
}
