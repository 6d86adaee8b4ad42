// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-path tile grids and the CSR mapping from tiles to segments.

use alloc::vec::Vec;

use bytemuck::{Pod, Zeroable};

use super::bounds::{self, Grid, TileSpan};
use super::classify;
use super::path::{PathHeader, Segment, padded_bounds};
use crate::{Error, Result};

/// No segment touches the tile and its center is outside the fill.
pub const TILE_EMPTY: u32 = 0;
/// No segment touches the tile and it lies inside an unstroked fill.
pub const TILE_FULL: u32 = 1;
/// The tile needs per-pixel coverage.
pub const TILE_MIXED: u32 = 2;

/// CSR entry of one tile: a slice of the shared index buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct TileRange {
    /// First entry in the index buffer.
    pub start: u32,
    /// Number of segments touching the tile.
    pub count: u32,
    /// One of [`TILE_EMPTY`], [`TILE_FULL`] or [`TILE_MIXED`].
    pub flags: u32,
}

/// Tile grid of one path and the location of its ranges.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PathTileMeta {
    /// Path-space position of the top-left corner of tile `(0, 0)`.
    pub origin: [f32; 2],
    /// Number of tile columns, at least one.
    pub tiles_x: u32,
    /// Number of tile rows, at least one.
    pub tiles_y: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Index of the first range of this path in the range buffer.
    pub ranges_offset: u32,
    /// Number of ranges, always `tiles_x * tiles_y`.
    pub total_ranges: u32,
    /// Non-zero once the ranges have been written.
    pub built: u32,
}

impl PathTileMeta {
    /// The grid described by this record.
    pub fn grid(&self) -> Grid {
        Grid {
            origin: self.origin,
            tile_size: self.tile_size as f32,
            tiles_x: self.tiles_x,
            tiles_y: self.tiles_y,
        }
    }

    /// Whether the ranges have been written.
    pub fn is_built(&self) -> bool {
        self.built != 0
    }

    /// Index of tile `(x, y)` in the range buffer.
    pub fn range_index(&self, x: u32, y: u32) -> usize {
        (self.ranges_offset + y * self.tiles_x + x) as usize
    }
}

/// Shared CSR buffers of all paths.
///
/// Rebuilding a path appends fresh ranges and indices; the previous ones stay
/// allocated until [`TileIndex::clear`].
#[derive(Clone, Debug, Default)]
pub struct TileIndex {
    /// Per-tile ranges of every path, row-major per path.
    pub ranges: Vec<TileRange>,
    /// Global segment indices referenced by the ranges.
    pub indices: Vec<u32>,
}

impl TileIndex {
    /// Creates empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every range and index.
    pub fn clear(&mut self) {
        self.ranges.clear();
        self.indices.clear();
    }

    /// Borrows the buffers as a read-only view.
    pub fn lists(&self) -> TileLists<'_> {
        TileLists {
            ranges: &self.ranges,
            indices: &self.indices,
        }
    }

    /// The ranges of one path.
    pub fn path_ranges(&self, meta: &PathTileMeta) -> &[TileRange] {
        let start = meta.ranges_offset as usize;
        &self.ranges[start..start + meta.total_ranges as usize]
    }

    /// The segment indices of one tile.
    pub fn tile_segments(&self, range: &TileRange) -> &[u32] {
        self.lists().segments(range)
    }
}

/// Read-only view of CSR buffers, either live or as uploaded to a backend.
#[derive(Copy, Clone, Debug)]
pub struct TileLists<'a> {
    /// Per-tile ranges.
    pub ranges: &'a [TileRange],
    /// Global segment indices.
    pub indices: &'a [u32],
}

impl<'a> TileLists<'a> {
    /// The range of tile `(x, y)` of a path.
    pub fn tile(&self, meta: &PathTileMeta, x: u32, y: u32) -> &'a TileRange {
        &self.ranges[meta.range_index(x, y)]
    }

    /// The range of tile `(x, y)`, or `None` when the tile is outside the grid
    /// or the buffers.
    pub fn get(&self, meta: &PathTileMeta, x: u32, y: u32) -> Option<&'a TileRange> {
        if x >= meta.tiles_x || y >= meta.tiles_y {
            return None;
        }
        self.ranges.get(meta.range_index(x, y))
    }

    /// The segment indices of one tile.
    pub fn segments(&self, range: &TileRange) -> &'a [u32] {
        let start = range.start as usize;
        &self.indices[start..start + range.count as usize]
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "grid dimensions are far below u32::MAX for any atlas-sized path"
)]
fn grid_for(bounds: Option<[f32; 4]>, tile_size: u32) -> Grid {
    let ts = tile_size.max(1) as f32;
    match bounds {
        Some([x0, y0, x1, y1]) => Grid {
            origin: [x0, y0],
            tile_size: ts,
            tiles_x: (((x1 - x0) / ts).ceil() as u32).max(1),
            tiles_y: (((y1 - y0) / ts).ceil() as u32).max(1),
        },
        None => Grid {
            origin: [0.0, 0.0],
            tile_size: ts,
            tiles_x: 1,
            tiles_y: 1,
        },
    }
}

fn scratch<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { requested: len })?;
    v.resize(len, value);
    Ok(v)
}

/// Builds the tile grid and CSR ranges of one path, appending them to `index`.
///
/// `segments` is the shared segment buffer; the header selects the path's
/// slice. Paths without usable geometry produce a single empty tile.
#[expect(
    clippy::cast_possible_truncation,
    reason = "buffer lengths are bounded by the u32 indices stored on the GPU"
)]
pub fn build_tiles(
    index: &mut TileIndex,
    header: &PathHeader,
    segments: &[Segment],
    tile_size: u32,
) -> Result<PathTileMeta> {
    let bounds = padded_bounds(header, segments);
    let grid = grid_for(bounds, tile_size);
    let tile_count = grid.tiles_x as usize * grid.tiles_y as usize;
    let path_segments = match bounds {
        Some(_) => &segments[header.segment_range()],
        None => &[],
    };

    let mut spans: Vec<Option<TileSpan>> = Vec::new();
    spans
        .try_reserve_exact(path_segments.len())
        .map_err(|_| Error::Allocation {
            requested: path_segments.len(),
        })?;
    bounds::segment_spans(&grid, path_segments, header.padding(), &mut spans);

    // Counting pass.
    let mut counts = scratch(tile_count, 0_u32)?;
    for span in spans.iter().flatten() {
        for y in span.y0..=span.y1 {
            let row = y as usize * grid.tiles_x as usize;
            for x in span.x0..=span.x1 {
                counts[row + x as usize] += 1;
            }
        }
    }

    // Prefix sums.
    let mut offsets = scratch(tile_count, 0_u32)?;
    let mut total = 0_u32;
    for (offset, count) in offsets.iter_mut().zip(&counts) {
        *offset = total;
        total += count;
    }

    // Fill pass.
    let mut cursors = offsets.clone();
    let mut slots = scratch(total as usize, 0_u32)?;
    for (i, span) in spans.iter().enumerate() {
        let Some(span) = span else { continue };
        let global = header.start + i as u32;
        for y in span.y0..=span.y1 {
            let row = y as usize * grid.tiles_x as usize;
            for x in span.x0..=span.x1 {
                let cursor = &mut cursors[row + x as usize];
                slots[*cursor as usize] = global;
                *cursor += 1;
            }
        }
    }

    let base = index.indices.len() as u32;
    let ranges_offset = index.ranges.len() as u32;
    index.ranges.reserve(tile_count);
    index.indices.reserve(slots.len());
    index
        .ranges
        .extend(offsets.iter().zip(&counts).map(|(&start, &count)| TileRange {
            start: base + start,
            count,
            flags: TILE_EMPTY,
        }));
    index.indices.extend_from_slice(&slots);

    let meta = PathTileMeta {
        origin: grid.origin,
        tiles_x: grid.tiles_x,
        tiles_y: grid.tiles_y,
        tile_size: tile_size.max(1),
        ranges_offset,
        total_ranges: tile_count as u32,
        built: 1,
    };
    classify::classify_tiles(index, &meta, header, segments);
    Ok(meta)
}
