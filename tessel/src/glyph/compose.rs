// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of rendered glyphs into RGBA atlas cells.

use alloc::vec;
use alloc::vec::Vec;

use crate::font::{RasterFormat, RasterGlyph};

/// Transparent border around plain and bitmap cells, so bilinear sampling
/// never picks up a neighbor.
pub(crate) const CELL_PADDING: u32 = 1;

/// Layer color used when the palette index is `0xFFFF` or there is no palette.
pub(crate) const DEFAULT_LAYER_COLOR: [u8; 4] = [0, 0, 0, 255];

/// An RGBA image ready to be copied into an atlas.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) data: Vec<u8>,
}

/// Copies a mask or BGRA bitmap into a padded cell.
///
/// Masks become premultiplied white; BGRA pixels are swizzled to RGBA.
pub(crate) fn padded_cell(glyph: &RasterGlyph) -> Cell {
    let width = glyph.width + 2 * CELL_PADDING;
    let height = glyph.height + 2 * CELL_PADDING;
    let mut data = vec![0; width as usize * height as usize * 4];
    let pad = CELL_PADDING as usize;
    for y in 0..glyph.height as usize {
        for x in 0..glyph.width as usize {
            let dst = ((y + pad) * width as usize + x + pad) * 4;
            let px = match glyph.format {
                RasterFormat::Mask => {
                    let a = glyph.data[y * glyph.width as usize + x];
                    [a, a, a, a]
                }
                RasterFormat::Bgra => {
                    let src = (y * glyph.width as usize + x) * 4;
                    let bgra = &glyph.data[src..src + 4];
                    [bgra[2], bgra[1], bgra[0], bgra[3]]
                }
            };
            data[dst..dst + 4].copy_from_slice(&px);
        }
    }
    Cell {
        width,
        height,
        data,
    }
}

/// A rendered layer of a color glyph with its straight-alpha color.
#[derive(Clone, Debug)]
pub(crate) struct Layer {
    pub(crate) raster: RasterGlyph,
    pub(crate) color: [u8; 4],
}

/// Union of all layers in `y`-down pixels relative to the pen and baseline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LayerBounds {
    pub(crate) min_x: i32,
    pub(crate) min_y: i32,
    pub(crate) max_x: i32,
    pub(crate) max_y: i32,
}

impl LayerBounds {
    pub(crate) fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x)
    }

    pub(crate) fn height(&self) -> u32 {
        self.max_y.abs_diff(self.min_y)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "layer bearings are small pixel offsets"
)]
fn layer_origin(raster: &RasterGlyph) -> (i32, i32) {
    (raster.left.floor() as i32, (-raster.top).floor() as i32)
}

/// Bounding box of all non-empty layers, or `None` if every layer is empty.
pub(crate) fn layer_bounds(layers: &[Layer]) -> Option<LayerBounds> {
    layers
        .iter()
        .filter(|layer| layer.raster.width > 0 && layer.raster.height > 0)
        .map(|layer| {
            let (x, y) = layer_origin(&layer.raster);
            LayerBounds {
                min_x: x,
                min_y: y,
                max_x: x + layer.raster.width as i32,
                max_y: y + layer.raster.height as i32,
            }
        })
        .reduce(|a, b| LayerBounds {
            min_x: a.min_x.min(b.min_x),
            min_y: a.min_y.min(b.min_y),
            max_x: a.max_x.max(b.max_x),
            max_y: a.max_y.max(b.max_y),
        })
}

/// Composites layers in order onto a canvas covering `bounds`.
///
/// The canvas is clipped to `side` pixels in each direction. Each layer's
/// coverage is tinted with its color and blended source-over in
/// premultiplied alpha.
#[expect(
    clippy::cast_possible_truncation,
    reason = "blended channels stay within 0..=255"
)]
pub(crate) fn composite_layers(layers: &[Layer], bounds: LayerBounds, side: u32) -> Cell {
    let width = bounds.width().min(side);
    let height = bounds.height().min(side);
    let mut data = vec![0_u8; width as usize * height as usize * 4];
    for layer in layers {
        let raster = &layer.raster;
        if raster.format != RasterFormat::Mask {
            continue;
        }
        let (ox, oy) = layer_origin(raster);
        let [r, g, b, a] = layer.color.map(u32::from);
        for y in 0..raster.height {
            let dst_y = oy + y as i32 - bounds.min_y;
            if dst_y < 0 || dst_y >= height as i32 {
                continue;
            }
            for x in 0..raster.width {
                let dst_x = ox + x as i32 - bounds.min_x;
                if dst_x < 0 || dst_x >= width as i32 {
                    continue;
                }
                let coverage = u32::from(raster.data[(y * raster.width + x) as usize]);
                if coverage == 0 {
                    continue;
                }
                // Straight color times coverage, premultiplied by the layer alpha.
                let src_a = a * coverage / 255;
                let src = [r * src_a / 255, g * src_a / 255, b * src_a / 255, src_a];
                let i = (dst_y as usize * width as usize + dst_x as usize) * 4;
                let inv = 255 - src_a;
                for c in 0..4 {
                    let dst = u32::from(data[i + c]);
                    data[i + c] = (src[c] + dst * inv / 255).min(255) as u8;
                }
            }
        }
    }
    Cell {
        width,
        height,
        data,
    }
}
