// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for the caches and atlases owned by a [`Context`](crate::Context).

/// Texture sampling filter the batch renderer should use for an atlas.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    /// Bilinear filtering.
    #[default]
    Linear,
    /// Nearest-neighbor filtering.
    Nearest,
}

/// Configuration for per-font glyph atlases and text layout.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontConfig {
    /// Width of a freshly created glyph atlas.
    pub atlas_width: u32,
    /// Height of a freshly created glyph atlas.
    pub atlas_height: u32,
    /// Glyph atlases never grow past this dimension.
    pub max_atlas_dim: u32,
    /// A tab advances by this many space widths.
    pub tab_width: u32,
    /// Filter reported to the batch renderer for glyph atlases.
    pub filter: TextureFilter,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            atlas_width: 1024,
            atlas_height: 1024,
            max_atlas_dim: 16384,
            tab_width: 4,
            filter: TextureFilter::Linear,
        }
    }
}

/// Configuration for the vector caching atlas and tile rasterizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VectorConfig {
    /// Width of the vector atlas.
    pub atlas_width: u32,
    /// Height of the vector atlas.
    pub atlas_height: u32,
    /// Empty pixels kept on every side of a cached item.
    pub gutter: u32,
    /// Edge length of a tile in pixels.
    pub tile_size: u32,
    /// Worker threads used by the CPU backend; `0` or `1` runs on the calling thread.
    pub threads: usize,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            atlas_width: 2048,
            atlas_height: 2048,
            gutter: 2,
            tile_size: 16,
            threads: 1,
        }
    }
}

/// Aggregated configuration.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Config {
    /// Font and glyph atlas settings.
    pub font: FontConfig,
    /// Vector atlas settings.
    pub vector: VectorConfig,
}
