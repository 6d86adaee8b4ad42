// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion of padded segment bounding boxes into inclusive tile ranges.
//!
//! Segments are processed in fixed-width batches laid out as separate lane
//! arrays so the floor/clamp arithmetic compiles to SIMD where available. The
//! per-lane math is shared with the scalar path, so both produce identical
//! ranges.

use alloc::vec::Vec;

use super::path::Segment;

/// Number of segments converted per batch.
pub const LANES: usize = 8;

/// A tile grid anchored at a path-space origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Grid {
    /// Path-space position of the top-left corner of tile `(0, 0)`.
    pub origin: [f32; 2],
    /// Tile edge length.
    pub tile_size: f32,
    /// Number of tile columns.
    pub tiles_x: u32,
    /// Number of tile rows.
    pub tiles_y: u32,
}

impl Grid {
    /// Tile column containing path-space `x`, unclamped.
    #[inline]
    pub fn column(&self, x: f32) -> f32 {
        tile_coord(x, self.origin[0], self.tile_size)
    }

    /// Tile row containing path-space `y`, unclamped.
    #[inline]
    pub fn row(&self, y: f32) -> f32 {
        tile_coord(y, self.origin[1], self.tile_size)
    }
}

/// Inclusive range of tiles touched by one segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileSpan {
    /// First column.
    pub x0: u32,
    /// First row.
    pub y0: u32,
    /// Last column.
    pub x1: u32,
    /// Last row.
    pub y1: u32,
}

impl TileSpan {
    /// Number of tiles in the span.
    pub fn area(&self) -> usize {
        (self.x1 - self.x0 + 1) as usize * (self.y1 - self.y0 + 1) as usize
    }
}

#[inline]
fn tile_coord(v: f32, origin: f32, tile_size: f32) -> f32 {
    ((v - origin) / tile_size).floor()
}

#[inline]
#[expect(
    clippy::cast_possible_truncation,
    reason = "values are clamped to the grid before conversion"
)]
fn clamp_to(v: f32, count: u32) -> u32 {
    v.clamp(0.0, (count - 1) as f32) as u32
}

/// Clamps floored tile coordinates to the grid; `None` when entirely outside or not finite.
#[inline]
fn span_from(grid: &Grid, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<TileSpan> {
    // NaN fails every comparison and lands here as invalid.
    let inside = x1 >= 0.0
        && y1 >= 0.0
        && x0 < grid.tiles_x as f32
        && y0 < grid.tiles_y as f32
        && x0 <= x1
        && y0 <= y1;
    inside.then(|| TileSpan {
        x0: clamp_to(x0, grid.tiles_x),
        y0: clamp_to(y0, grid.tiles_y),
        x1: clamp_to(x1, grid.tiles_x),
        y1: clamp_to(y1, grid.tiles_y),
    })
}

/// Converts one segment, padded by `pad`, into its tile span.
pub fn segment_span(grid: &Grid, segment: &Segment, pad: f32) -> Option<TileSpan> {
    let [min_x, min_y, max_x, max_y] = segment.bbox();
    span_from(
        grid,
        grid.column(min_x - pad),
        grid.row(min_y - pad),
        grid.column(max_x + pad),
        grid.row(max_y + pad),
    )
}

/// Converts every segment one at a time, appending to `out`.
pub fn segment_spans_scalar(
    grid: &Grid,
    segments: &[Segment],
    pad: f32,
    out: &mut Vec<Option<TileSpan>>,
) {
    out.extend(segments.iter().map(|s| segment_span(grid, s, pad)));
}

/// Converts every segment in batches of [`LANES`], appending to `out`.
pub fn segment_spans(
    grid: &Grid,
    segments: &[Segment],
    pad: f32,
    out: &mut Vec<Option<TileSpan>>,
) {
    let mut chunks = segments.chunks_exact(LANES);
    for chunk in &mut chunks {
        let mut lo_x = [0.0_f32; LANES];
        let mut lo_y = [0.0_f32; LANES];
        let mut hi_x = [0.0_f32; LANES];
        let mut hi_y = [0.0_f32; LANES];
        for (i, segment) in chunk.iter().enumerate() {
            let [min_x, min_y, max_x, max_y] = segment.bbox();
            lo_x[i] = min_x - pad;
            lo_y[i] = min_y - pad;
            hi_x[i] = max_x + pad;
            hi_y[i] = max_y + pad;
        }
        for i in 0..LANES {
            lo_x[i] = grid.column(lo_x[i]);
            hi_x[i] = grid.column(hi_x[i]);
        }
        for i in 0..LANES {
            lo_y[i] = grid.row(lo_y[i]);
            hi_y[i] = grid.row(hi_y[i]);
        }
        for i in 0..LANES {
            out.push(span_from(grid, lo_x[i], lo_y[i], hi_x[i], hi_y[i]));
        }
    }
    segment_spans_scalar(grid, chunks.remainder(), pad, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn grid() -> Grid {
        Grid {
            origin: [-3.5, 10.0],
            tile_size: 16.0,
            tiles_x: 5,
            tiles_y: 3,
        }
    }

    #[test]
    fn span_covers_padded_box() {
        let segment = Segment::line([0.0, 12.0], [30.0, 40.0]);
        let span = segment_span(&grid(), &segment, 1.0);
        // x: (-1 + 3.5) / 16 = 0.15 .. (31 + 3.5) / 16 = 2.15; y: (11 - 10) / 16 .. (41 - 10) / 16
        assert_eq!(
            span,
            Some(TileSpan {
                x0: 0,
                y0: 0,
                x1: 2,
                y1: 1
            })
        );
        assert_eq!(span.map(|s| s.area()), Some(6));
    }

    #[test]
    fn outside_and_nan_are_invalid() {
        let g = grid();
        assert_eq!(segment_span(&g, &Segment::line([500.0, 12.0], [600.0, 12.0]), 1.0), None);
        assert_eq!(segment_span(&g, &Segment::line([0.0, -80.0], [5.0, -60.0]), 1.0), None);
        assert_eq!(segment_span(&g, &Segment::line([f32::NAN, 0.0], [1.0, 1.0]), 1.0), None);
        // Partially outside spans are clamped.
        assert_eq!(
            segment_span(&g, &Segment::line([-100.0, 0.0], [100.0, 100.0]), 0.0),
            Some(TileSpan {
                x0: 0,
                y0: 0,
                x1: 4,
                y1: 2
            })
        );
    }

    #[test]
    fn batched_matches_scalar() {
        let g = grid();
        let mut state = 7_u32;
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1 << 24) as f32 * 140.0 - 30.0
        };
        let mut segments = vec![];
        for _ in 0..203 {
            segments.push(Segment::line([next(), next()], [next(), next()]));
        }
        segments.push(Segment::line([f32::INFINITY, 0.0], [1.0, 2.0]));

        let mut batched = vec![];
        let mut scalar = vec![];
        segment_spans(&g, &segments, 1.5, &mut batched);
        segment_spans_scalar(&g, &segments, 1.5, &mut scalar);
        assert_eq!(batched.len(), segments.len());
        assert_eq!(batched, scalar);
        assert!(batched.iter().any(Option::is_none), "expected some culled segments");
        assert!(batched.iter().any(Option::is_some), "expected some kept segments");
    }
}
