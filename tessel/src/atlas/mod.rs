// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle allocation and CPU-side pixel storage shared by the glyph and vector atlases.

mod packer;
mod pixels;

pub use packer::Packer;
pub use pixels::{AtlasImage, PendingUpload};

/// Normalized texture coordinates of a rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UvRect {
    /// Left.
    pub u0: f32,
    /// Top.
    pub v0: f32,
    /// Right.
    pub u1: f32,
    /// Bottom.
    pub v1: f32,
}

impl UvRect {
    /// Coordinates of the pixel rectangle `(x, y, width, height)` in an atlas of the given size.
    pub fn from_pixels(x: u32, y: u32, width: u32, height: u32, atlas_w: u32, atlas_h: u32) -> Self {
        let (aw, ah) = (atlas_w as f32, atlas_h as f32);
        Self {
            u0: x as f32 / aw,
            v0: y as f32 / ah,
            u1: (x + width) as f32 / aw,
            v1: (y + height) as f32 / ah,
        }
    }

    /// Like [`UvRect::from_pixels`], but moved half a pixel inwards on every side.
    pub fn inset(x: u32, y: u32, width: u32, height: u32, atlas_w: u32, atlas_h: u32) -> Self {
        let (aw, ah) = (atlas_w as f32, atlas_h as f32);
        Self {
            u0: (x as f32 + 0.5) / aw,
            v0: (y as f32 + 0.5) / ah,
            u1: ((x + width) as f32 - 0.5) / aw,
            v1: ((y + height) as f32 - 0.5) / ah,
        }
    }
}
