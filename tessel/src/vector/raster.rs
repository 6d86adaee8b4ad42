// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tile rasterization kernel.
//!
//! [`rasterize_job`] is a pure function of its job and the uploaded buffers, so
//! jobs can run in any order and on any thread.

use alloc::vec;
use alloc::vec::Vec;

use peniko::Fill;
use peniko::color::palette::css;

use super::classify::{is_inside, winding_at};
use super::dispatch::TileJob;
use super::path::{NO_PAINT, Paint, PathHeader, PathStyle, Segment, padded_bounds};
use super::stroke::{coverage, segment_distance, stroke_distance};
use super::tiles::{self, PathTileMeta, TILE_EMPTY, TILE_FULL, TileIndex, TileLists, TileRange};
use crate::Result;

/// Read-only inputs of the kernel.
#[derive(Copy, Clone, Debug)]
pub struct TileBuffers<'a> {
    /// All segments.
    pub segments: &'a [Segment],
    /// Path headers indexed by path id.
    pub paths: &'a [PathHeader],
    /// Paints referenced by the headers.
    pub paints: &'a [Paint],
    /// Tile grids indexed by path id.
    pub metas: &'a [PathTileMeta],
    /// Per-tile ranges.
    pub ranges: &'a [TileRange],
    /// Segment indices referenced by the ranges.
    pub indices: &'a [u32],
}

impl<'a> TileBuffers<'a> {
    /// The CSR part of the buffers.
    pub fn lists(&self) -> TileLists<'a> {
        TileLists {
            ranges: self.ranges,
            indices: self.indices,
        }
    }

    fn paint(&self, id: u32) -> [f32; 4] {
        if id == NO_PAINT {
            return [0.0; 4];
        }
        self.paints
            .get(id as usize)
            .map_or([0.0; 4], |paint| paint.color)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "the value is clamped to the u8 range"
)]
fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
}

/// Rasterizes one job into `out`, a tightly packed `rect_w` by `rect_h` RGBA block.
pub fn rasterize_job(job: &TileJob, buffers: &TileBuffers<'_>, out: &mut [u8]) {
    let pixels = job.rect_w as usize * job.rect_h as usize;
    let out = &mut out[..pixels * 4];
    let lists = buffers.lists();
    let (Some(header), Some(meta)) = (
        buffers.paths.get(job.path_id as usize),
        buffers.metas.get(job.path_id as usize),
    ) else {
        out.fill(0);
        return;
    };
    let Some(range) = lists.get(meta, job.tile_x, job.tile_y) else {
        out.fill(0);
        return;
    };
    let fill_paint = if header.is_filled() {
        buffers.paint(header.fill_paint)
    } else {
        [0.0; 4]
    };

    match range.flags {
        TILE_EMPTY => {
            out.fill(0);
            return;
        }
        TILE_FULL => {
            let rgba = to_rgba8(fill_paint);
            for px in out.chunks_exact_mut(4) {
                px.copy_from_slice(&rgba);
            }
            return;
        }
        _ => {}
    }

    let stroke_paint = if header.is_stroked() {
        buffers.paint(header.stroke_paint)
    } else {
        [0.0; 4]
    };
    let tile_segments = lists.segments(range);
    let ts = meta.tile_size as f32;
    let fill_rule = header.fill();

    for (i, px) in out.chunks_exact_mut(4).enumerate() {
        let col = (i % job.rect_w as usize) as f32;
        let row = (i / job.rect_w as usize) as f32;
        let p = [
            meta.origin[0] + job.tile_x as f32 * ts + col + 0.5,
            meta.origin[1] + job.tile_y as f32 * ts + row + 0.5,
        ];

        let fill_coverage = if header.is_filled() {
            let edge = tile_segments
                .iter()
                .map(|&s| {
                    let segment = &buffers.segments[s as usize];
                    segment_distance(p, segment.p0, segment.p1)
                })
                .fold(f32::INFINITY, f32::min);
            let winding = winding_at(p, job.tile_x, job.tile_y, meta, lists, buffers.segments);
            let signed = if is_inside(winding, fill_rule) {
                -edge
            } else {
                edge
            };
            coverage(signed)
        } else {
            0.0
        };

        let stroke_coverage = if header.is_stroked() {
            let signed = tile_segments
                .iter()
                .map(|&s| stroke_distance(p, s as usize, header, buffers.segments))
                .fold(f32::INFINITY, f32::min);
            coverage(signed)
        } else {
            0.0
        };

        let color: [f32; 4] = core::array::from_fn(|c| {
            fill_paint[c] * fill_coverage + stroke_paint[c] * stroke_coverage
        });
        px.copy_from_slice(&to_rgba8(color));
    }
}

/// Coverage of a filled path on a pixel grid.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageMask {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Path-space position of the top-left corner of pixel `(0, 0)`.
    pub origin: [f32; 2],
    /// One coverage byte per pixel, row-major.
    pub data: Vec<u8>,
}

/// Rasterizes a filled path on the CPU by running the tile kernel over every tile.
///
/// Returns `None` for paths without geometry.
#[expect(
    clippy::cast_possible_truncation,
    reason = "mask sizes are bounded by the glyph sizes rendered through here"
)]
pub fn rasterize_mask(
    segments: &[Segment],
    fill_rule: Fill,
    tile_size: u32,
) -> Result<Option<CoverageMask>> {
    let header = PathStyle::fill(0, fill_rule).header(0, segments.len() as u32);
    let Some([x0, y0, x1, y1]) = padded_bounds(&header, segments) else {
        return Ok(None);
    };
    let mut index = TileIndex::new();
    let meta = tiles::build_tiles(&mut index, &header, segments, tile_size)?;
    let width = ((x1 - x0).ceil() as u32).max(1);
    let height = ((y1 - y0).ceil() as u32).max(1);
    let paints = [Paint::solid(css::WHITE)];
    let buffers = TileBuffers {
        segments,
        paths: core::slice::from_ref(&header),
        paints: &paints,
        metas: core::slice::from_ref(&meta),
        ranges: &index.ranges,
        indices: &index.indices,
    };

    let ts = meta.tile_size;
    let mut data = vec![0_u8; width as usize * height as usize];
    let mut block = vec![0_u8; ts as usize * ts as usize * 4];
    for tile_y in 0..meta.tiles_y {
        for tile_x in 0..meta.tiles_x {
            let (base_x, base_y) = (tile_x * ts, tile_y * ts);
            if base_x >= width || base_y >= height {
                continue;
            }
            let job = TileJob {
                base_x,
                base_y,
                rect_w: ts.min(width - base_x),
                rect_h: ts.min(height - base_y),
                path_id: 0,
                tile_x,
                tile_y,
            };
            rasterize_job(&job, &buffers, &mut block);
            for row in 0..job.rect_h {
                let dst = ((base_y + row) * width + base_x) as usize;
                let src = (row * job.rect_w) as usize * 4;
                for col in 0..job.rect_w as usize {
                    data[dst + col] = block[src + col * 4 + 3];
                }
            }
        }
    }
    Ok(Some(CoverageMask {
        width,
        height,
        origin: meta.origin,
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::path::{PathBuilder, StrokeStyle};
    use crate::vector::tiles::{TILE_MIXED, build_tiles};

    struct Scene {
        segments: Vec<Segment>,
        header: PathHeader,
        meta: PathTileMeta,
        index: TileIndex,
        paints: Vec<Paint>,
    }

    impl Scene {
        fn new(builder: PathBuilder, style: PathStyle) -> Self {
            let segments = builder.finish();
            let header = style.header(0, segments.len() as u32);
            let mut index = TileIndex::new();
            let meta = build_tiles(&mut index, &header, &segments, 8).unwrap();
            Self {
                segments,
                header,
                meta,
                index,
                paints: vec![Paint::solid(css::WHITE), Paint::solid(css::RED)],
            }
        }

        fn buffers(&self) -> TileBuffers<'_> {
            TileBuffers {
                segments: &self.segments,
                paths: core::slice::from_ref(&self.header),
                paints: &self.paints,
                metas: core::slice::from_ref(&self.meta),
                ranges: &self.index.ranges,
                indices: &self.index.indices,
            }
        }

        fn tile(&self, tile_x: u32, tile_y: u32) -> Vec<u8> {
            let job = TileJob {
                base_x: 0,
                base_y: 0,
                rect_w: 8,
                rect_h: 8,
                path_id: 0,
                tile_x,
                tile_y,
            };
            let mut out = vec![0; 8 * 8 * 4];
            rasterize_job(&job, &self.buffers(), &mut out);
            out
        }
    }

    fn alpha(block: &[u8], x: usize, y: usize) -> u8 {
        block[(y * 8 + x) * 4 + 3]
    }

    #[test]
    fn full_tile_is_painted_directly() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 40.0, 40.0);
        let scene = Scene::new(builder, PathStyle::fill(0, Fill::NonZero));
        assert_eq!(scene.index.ranges[scene.meta.range_index(2, 2)].flags, TILE_FULL);
        assert!(scene.tile(2, 2).iter().all(|&v| v == 255));
    }

    #[test]
    fn edge_tile_is_antialiased() {
        let mut builder = PathBuilder::new();
        // Edge at x = 3.5 in a grid with origin -1: pixel column 4 is cut in half.
        builder.rect(0.0, 0.0, 3.5, 40.0);
        let scene = Scene::new(builder, PathStyle::fill(0, Fill::NonZero));
        assert_eq!(scene.index.ranges[scene.meta.range_index(0, 2)].flags, TILE_MIXED);
        let block = scene.tile(0, 2);
        assert_eq!(alpha(&block, 0, 3), 0);
        assert_eq!(alpha(&block, 2, 3), 255);
        assert_eq!(alpha(&block, 4, 3), 128);
        assert_eq!(alpha(&block, 6, 3), 0);
    }

    #[test]
    fn even_odd_hole_is_transparent() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 30.0, 30.0).rect(10.0, 10.0, 10.0, 10.0);
        let scene = Scene::new(builder, PathStyle::fill(0, Fill::EvenOdd));
        // Tile (1, 1) covers path x 7..15: the hole begins at 10.
        let block = scene.tile(1, 1);
        assert_eq!(alpha(&block, 0, 7), 255);
        assert_eq!(alpha(&block, 6, 7), 0);
    }

    #[test]
    fn stroke_is_added_to_fill() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 30.0, 30.0);
        let style = PathStyle {
            fill: None,
            fill_rule: Fill::NonZero,
            stroke: Some(StrokeStyle::new(1, 4.0)),
        };
        let scene = Scene::new(builder, style);
        // The grid starts at -9, so tile column 1 begins on the left edge.
        let block = scene.tile(1, 2);
        let px = |x: usize| &block[(3 * 8 + x) * 4..(3 * 8 + x) * 4 + 4];
        assert_eq!(px(0), [255, 0, 0, 255]);
        assert_eq!(px(7), [0, 0, 0, 0]);
    }

    #[test]
    fn job_outside_the_grid_is_empty() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 10.0, 10.0);
        let scene = Scene::new(builder, PathStyle::fill(0, Fill::NonZero));
        assert!(scene.tile(scene.meta.tiles_x, 0).iter().all(|&v| v == 0));
        assert!(scene.tile(0, 40).iter().all(|&v| v == 0));
    }

    #[test]
    fn mask_of_triangle() {
        let mut builder = PathBuilder::new();
        builder.polygon(&[[0.0, 0.0], [20.0, 0.0], [0.0, 20.0]]);
        let mask = rasterize_mask(&builder.finish(), Fill::NonZero, 8)
            .unwrap()
            .unwrap();
        assert_eq!((mask.width, mask.height), (22, 22));
        assert_eq!(mask.origin, [-1.0, -1.0]);
        let at = |x: usize, y: usize| mask.data[y * 22 + x];
        // Pixel (3, 3) covers path point (2.5, 2.5), deep inside.
        assert_eq!(at(3, 3), 255);
        // Beyond the hypotenuse.
        assert_eq!(at(18, 18), 0);
        assert!(rasterize_mask(&[], Fill::NonZero, 8).unwrap().is_none());
    }
}
