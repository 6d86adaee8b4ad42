// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fill-rule evaluation against the tile index and tile classification.

use peniko::Fill;

use super::path::{PathHeader, Segment};
use super::tiles::{PathTileMeta, TILE_EMPTY, TILE_FULL, TILE_MIXED, TileIndex, TileLists};

/// Sum of signed crossings of the ray from `point` towards +x.
///
/// `(tile_x, tile_y)` is the tile containing `point`. The ray is intersected
/// with the segment lists of that tile and every tile to its right; a crossing
/// counts only in the list of the column it falls in, so segments listed in
/// several tiles are counted once.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the column is clamped to the grid"
)]
pub fn winding_at(
    point: [f32; 2],
    tile_x: u32,
    tile_y: u32,
    meta: &PathTileMeta,
    lists: TileLists<'_>,
    segments: &[Segment],
) -> i32 {
    let [px, py] = point;
    let grid = meta.grid();
    let last_column = (meta.tiles_x - 1) as f32;
    let mut winding = 0;
    for column in tile_x..meta.tiles_x {
        let range = lists.tile(meta, column, tile_y);
        for &i in lists.segments(range) {
            let segment = &segments[i as usize];
            let ([x0, y0], [x1, y1]) = (segment.p0, segment.p1);
            let direction = if y0 <= py && y1 > py {
                1
            } else if y1 <= py && y0 > py {
                -1
            } else {
                continue;
            };
            let t = (py - y0) / (y1 - y0);
            let x = x0 + t * (x1 - x0);
            if x <= px {
                continue;
            }
            if grid.column(x).clamp(0.0, last_column) as u32 == column {
                winding += direction;
            }
        }
    }
    winding
}

/// Applies a fill rule to a winding number.
pub fn is_inside(winding: i32, fill: Fill) -> bool {
    match fill {
        Fill::NonZero => winding != 0,
        Fill::EvenOdd => winding & 1 != 0,
    }
}

/// Whether `point` of tile `(tile_x, tile_y)` is inside the fill of the path.
pub fn fill_contains(
    point: [f32; 2],
    tile_x: u32,
    tile_y: u32,
    meta: &PathTileMeta,
    header: &PathHeader,
    lists: TileLists<'_>,
    segments: &[Segment],
) -> bool {
    is_inside(
        winding_at(point, tile_x, tile_y, meta, lists, segments),
        header.fill(),
    )
}

/// Sets the flags of every range of a freshly built path.
pub(crate) fn classify_tiles(
    index: &mut TileIndex,
    meta: &PathTileMeta,
    header: &PathHeader,
    segments: &[Segment],
) {
    let ts = meta.tile_size as f32;
    let lists = index.lists();
    let mut flags = Vec::with_capacity(meta.total_ranges as usize);
    for ty in 0..meta.tiles_y {
        for tx in 0..meta.tiles_x {
            if lists.tile(meta, tx, ty).count > 0 {
                flags.push(TILE_MIXED);
                continue;
            }
            let center = [
                meta.origin[0] + (tx as f32 + 0.5) * ts,
                meta.origin[1] + (ty as f32 + 0.5) * ts,
            ];
            let inside = header.is_filled()
                && fill_contains(center, tx, ty, meta, header, lists, segments);
            flags.push(match (inside, header.is_stroked()) {
                (true, false) => TILE_FULL,
                (true, true) => TILE_MIXED,
                (false, _) => TILE_EMPTY,
            });
        }
    }
    let start = meta.ranges_offset as usize;
    for (range, flags) in index.ranges[start..].iter_mut().zip(flags) {
        range.flags = flags;
    }
}
