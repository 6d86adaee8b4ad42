// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row-based glyph atlas owned by each font.

use crate::atlas::{AtlasImage, UvRect};
use crate::config::{FontConfig, TextureFilter};
use crate::{Error, Result};

/// Where a cell was placed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) x: u32,
    pub(crate) y: u32,
    /// The atlas grew to make room, invalidating earlier texture coordinates.
    pub(crate) grown: bool,
}

/// A per-font glyph texture filled left to right, row by row.
///
/// Cells are separated by one empty pixel. A row is as tall as its tallest
/// cell. When a plain cell does not fit below the last row, both dimensions
/// are doubled and the existing pixels are kept in place.
#[derive(Clone, Debug)]
pub struct FontAtlas {
    image: AtlasImage,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    max_dim: u32,
    filter: TextureFilter,
}

impl FontAtlas {
    /// Creates an empty atlas sized by `config`.
    pub fn new(config: &FontConfig) -> Self {
        Self {
            image: AtlasImage::new(config.atlas_width, config.atlas_height),
            cursor_x: 0,
            cursor_y: 0,
            row_height: 0,
            max_dim: config.max_atlas_dim,
            filter: config.filter,
        }
    }

    /// Pixel storage.
    pub fn image(&self) -> &AtlasImage {
        &self.image
    }

    /// Mutable pixel storage, for draining pending uploads.
    pub fn image_mut(&mut self) -> &mut AtlasImage {
        &mut self.image
    }

    /// Filter the texture should be sampled with.
    pub fn filter(&self) -> TextureFilter {
        self.filter
    }

    /// Texture coordinates of a pixel rectangle.
    pub fn uv(&self, x: u32, y: u32, width: u32, height: u32) -> UvRect {
        UvRect::from_pixels(
            x,
            y,
            width,
            height,
            self.image.width(),
            self.image.height(),
        )
    }

    /// Drops all cells and shrinks back to the configured size.
    pub(crate) fn reset(&mut self, config: &FontConfig) {
        self.image = AtlasImage::new(config.atlas_width, config.atlas_height);
        self.cursor_x = 0;
        self.cursor_y = 0;
        self.row_height = 0;
    }

    /// Reserves a `width` by `height` cell and writes `rgba` into it.
    ///
    /// With `growable` unset, running out of rows is an error instead of a resize.
    pub(crate) fn insert(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
        growable: bool,
    ) -> Result<Placement> {
        let (mut x, mut y) = (self.cursor_x, self.cursor_y);
        let mut row_height = self.row_height;
        if x + width > self.image.width() {
            x = 0;
            y += row_height;
            row_height = 0;
        }

        let (mut new_w, mut new_h) = (self.image.width(), self.image.height());
        while y + height > new_h || width > new_w {
            if !growable {
                return Err(Error::atlas_full(width, height));
            }
            (new_w, new_h) = (new_w * 2, new_h * 2);
            if new_w == 0 || new_w > self.max_dim || new_h > self.max_dim {
                return Err(Error::atlas_full(width, height));
            }
        }
        let grown = (new_w, new_h) != (self.image.width(), self.image.height());
        if grown {
            log::warn!(
                "glyph atlas grows from {}x{} to {new_w}x{new_h}",
                self.image.width(),
                self.image.height()
            );
            self.image.resize(new_w, new_h);
        }

        self.image.write(x, y, width, height, rgba);
        self.cursor_x = x + width + 1;
        self.cursor_y = y;
        self.row_height = row_height.max(height);
        Ok(Placement { x, y, grown })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> FontAtlas {
        FontAtlas::new(&FontConfig {
            atlas_width: 16,
            atlas_height: 16,
            max_atlas_dim: 64,
            ..FontConfig::default()
        })
    }

    #[test]
    fn cells_advance_with_a_gap_and_wrap() {
        let mut atlas = small();
        let cell = [255_u8; 6 * 4 * 4];
        let a = atlas.insert(6, 4, &cell, true).unwrap();
        let b = atlas.insert(6, 4, &cell, true).unwrap();
        assert_eq!((a.x, a.y, b.x, b.y), (0, 0, 7, 0));
        // 14 + 6 does not fit in 16.
        let c = atlas.insert(6, 4, &cell, true).unwrap();
        assert_eq!((c.x, c.y), (0, 4));
        assert!(!c.grown);
        assert_eq!(atlas.image().pixel(7, 3), [255; 4]);
        assert_eq!(atlas.image().pixel(6, 0), [0; 4]);
    }

    #[test]
    fn vertical_overflow_doubles_plain_cells() {
        let mut atlas = small();
        let cell = [9_u8; 10 * 12 * 4];
        atlas.insert(10, 12, &cell, true).unwrap();
        let generation = atlas.image().generation();
        let next = atlas.insert(10, 12, &cell, true).unwrap();
        assert!(next.grown);
        assert_eq!((next.x, next.y), (0, 12));
        assert_eq!((atlas.image().width(), atlas.image().height()), (32, 32));
        assert_ne!(atlas.image().generation(), generation);
        // The first cell survived the resize.
        assert_eq!(atlas.image().pixel(9, 11), [9; 4]);
    }

    #[test]
    fn vertical_overflow_fails_for_color_cells() {
        let mut atlas = small();
        let cell = [1_u8; 10 * 12 * 4];
        atlas.insert(10, 12, &cell, false).unwrap();
        assert_eq!(
            atlas.insert(10, 12, &cell, false),
            Err(Error::AtlasFull {
                width: 10,
                height: 12
            })
        );
        // The failed cell did not start a new row.
        let small_cell = [1_u8; 4 * 2 * 4];
        let next = atlas.insert(4, 2, &small_cell, false).unwrap();
        assert_eq!((next.x, next.y), (11, 0));
    }

    #[test]
    fn growth_is_capped() {
        let mut atlas = small();
        let cell = [0_u8; 100 * 4 * 4];
        assert!(atlas.insert(100, 4, &cell, true).is_err());
        assert_eq!((atlas.image().width(), atlas.image().height()), (16, 16));
    }
}
