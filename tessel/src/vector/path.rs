// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU-layout path records and a builder that produces them.

use alloc::vec::Vec;

use bytemuck::{Pod, Zeroable};
use peniko::kurbo::{BezPath, PathEl, Point};
use peniko::{Color, Fill};

/// Kind tag of a straight line segment.
pub const SEGMENT_LINE: u32 = 0;
/// Kind tag reserved for quadratic curves.
pub const SEGMENT_QUAD: u32 = 1;
/// Kind tag reserved for cubic curves.
pub const SEGMENT_CUBIC: u32 = 2;

/// Set on the last segment of a contour.
pub const SEGMENT_CONTOUR_END: u32 = 1 << 0;
/// Set on the last segment of a closed contour, whose end joins the contour start.
pub const SEGMENT_CLOSED: u32 = 1 << 1;

/// Stroke joins use miters instead of bevels.
pub const STROKE_MITER_JOIN: u32 = 1 << 0;

/// Marks an absent fill or stroke paint.
pub const NO_PAINT: u32 = u32::MAX;

/// Anti-aliasing margin added around every padded bounding box.
pub const AA_MARGIN: f32 = 1.0;

/// Index of a path.
pub type PathId = u32;

/// Index of a paint.
pub type PaintId = u32;

/// One drawing primitive of a path.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Segment {
    /// Start point.
    pub p0: [f32; 2],
    /// End point.
    pub p1: [f32; 2],
    /// One of the `SEGMENT_*` kind tags.
    pub kind: u32,
    /// `SEGMENT_CONTOUR_END` and `SEGMENT_CLOSED` bits.
    pub flags: u32,
}

impl Segment {
    /// Creates a straight line segment.
    pub fn line(p0: [f32; 2], p1: [f32; 2]) -> Self {
        Self {
            p0,
            p1,
            kind: SEGMENT_LINE,
            flags: 0,
        }
    }

    /// Returns the segment bounding box as `[min_x, min_y, max_x, max_y]`.
    pub fn bbox(&self) -> [f32; 4] {
        [
            self.p0[0].min(self.p1[0]),
            self.p0[1].min(self.p1[1]),
            self.p0[0].max(self.p1[0]),
            self.p0[1].max(self.p1[1]),
        ]
    }

    /// Whether this is the last segment of its contour.
    pub fn ends_contour(&self) -> bool {
        self.flags & SEGMENT_CONTOUR_END != 0
    }

    /// Whether this segment closes its contour.
    pub fn closes_contour(&self) -> bool {
        self.flags & SEGMENT_CLOSED != 0
    }
}

/// Per-path record referencing a range of the shared segment buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PathHeader {
    /// Index of the first segment.
    pub start: u32,
    /// Number of segments.
    pub count: u32,
    /// `0` for non-zero winding, `1` for even-odd.
    pub fill_rule: u32,
    /// Full stroke width; `0` disables stroking.
    pub stroke_width: f32,
    /// Ratio of miter length to half the stroke width above which joins are beveled.
    pub miter_limit: f32,
    /// `STROKE_*` bits.
    pub stroke_flags: u32,
    /// Fill paint or [`NO_PAINT`].
    pub fill_paint: u32,
    /// Stroke paint or [`NO_PAINT`].
    pub stroke_paint: u32,
}

impl PathHeader {
    /// The fill rule as a [`Fill`].
    pub fn fill(&self) -> Fill {
        if self.fill_rule == 1 {
            Fill::EvenOdd
        } else {
            Fill::NonZero
        }
    }

    /// Whether the path has a visible stroke.
    pub fn is_stroked(&self) -> bool {
        self.stroke_width > 0.0 && self.stroke_paint != NO_PAINT
    }

    /// Whether the path has a fill.
    pub fn is_filled(&self) -> bool {
        self.fill_paint != NO_PAINT
    }

    /// Distance a stroke may reach past the path geometry, including miters.
    pub fn stroke_reach(&self) -> f32 {
        if !self.is_stroked() {
            return 0.0;
        }
        let half = self.stroke_width * 0.5;
        if self.stroke_flags & STROKE_MITER_JOIN != 0 {
            half * self.miter_limit.max(1.0)
        } else {
            half
        }
    }

    /// Padding applied to every bounding box of this path.
    pub fn padding(&self) -> f32 {
        self.stroke_reach() + AA_MARGIN
    }

    /// Segment range in the shared buffer.
    pub fn segment_range(&self) -> core::ops::Range<usize> {
        self.start as usize..(self.start + self.count) as usize
    }
}

/// Solid color paint; the kind tag is reserved for gradients and textures.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Paint {
    /// Premultiplied RGBA in `0..=1`.
    pub color: [f32; 4],
    /// `0` for a solid color.
    pub kind: u32,
    _pad: [u32; 3],
}

impl Paint {
    /// Creates a solid paint from a color.
    pub fn solid(color: Color) -> Self {
        let [r, g, b, a] = color.components;
        Self {
            color: [r * a, g * a, b * a, a],
            kind: 0,
            _pad: [0; 3],
        }
    }
}

/// Computes the padded bounding box of a path as `[min_x, min_y, max_x, max_y]`.
///
/// Returns `None` when the path has no segments or its box is inverted or not finite.
pub fn padded_bounds(header: &PathHeader, segments: &[Segment]) -> Option<[f32; 4]> {
    let segments = segments.get(header.segment_range())?;
    let mut bounds = [
        f32::INFINITY,
        f32::INFINITY,
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
    ];
    for segment in segments {
        let bbox = segment.bbox();
        bounds[0] = bounds[0].min(bbox[0]);
        bounds[1] = bounds[1].min(bbox[1]);
        bounds[2] = bounds[2].max(bbox[2]);
        bounds[3] = bounds[3].max(bbox[3]);
    }
    let valid = bounds.iter().all(|v| v.is_finite())
        && bounds[0] <= bounds[2]
        && bounds[1] <= bounds[3];
    if !valid {
        return None;
    }
    let pad = header.padding();
    Some([
        bounds[0] - pad,
        bounds[1] - pad,
        bounds[2] + pad,
        bounds[3] + pad,
    ])
}

/// Fill and stroke settings for a new path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PathStyle {
    /// Fill paint, if the path is filled.
    pub fill: Option<PaintId>,
    /// Fill rule.
    pub fill_rule: Fill,
    /// Stroke settings, if the path is stroked.
    pub stroke: Option<StrokeStyle>,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            fill: None,
            fill_rule: Fill::NonZero,
            stroke: None,
        }
    }
}

impl PathStyle {
    /// A filled path without stroke.
    pub fn fill(paint: PaintId, fill_rule: Fill) -> Self {
        Self {
            fill: Some(paint),
            fill_rule,
            stroke: None,
        }
    }
}

/// Stroke settings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Stroke paint.
    pub paint: PaintId,
    /// Full stroke width.
    pub width: f32,
    /// Miter limit; joins are beveled above it.
    pub miter_limit: f32,
    /// Use miter joins; bevels otherwise.
    pub miter_join: bool,
}

impl StrokeStyle {
    /// A mitered stroke with the SVG default limit of 4.
    pub fn new(paint: PaintId, width: f32) -> Self {
        Self {
            paint,
            width,
            miter_limit: 4.0,
            miter_join: true,
        }
    }
}

impl PathStyle {
    pub(crate) fn header(&self, start: u32, count: u32) -> PathHeader {
        let (stroke_width, miter_limit, stroke_flags, stroke_paint) = match self.stroke {
            Some(stroke) => (
                stroke.width.max(0.0),
                stroke.miter_limit,
                if stroke.miter_join {
                    STROKE_MITER_JOIN
                } else {
                    0
                },
                stroke.paint,
            ),
            None => (0.0, 0.0, 0, NO_PAINT),
        };
        PathHeader {
            start,
            count,
            fill_rule: match self.fill_rule {
                Fill::NonZero => 0,
                Fill::EvenOdd => 1,
            },
            stroke_width,
            miter_limit,
            stroke_flags,
            fill_paint: self.fill.unwrap_or(NO_PAINT),
            stroke_paint,
        }
    }
}

/// Builds line segments contour by contour.
#[derive(Clone, Debug, Default)]
pub struct PathBuilder {
    segments: Vec<Segment>,
    contour_start: usize,
    start_point: [f32; 2],
    current: Option<[f32; 2]>,
}

impl PathBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new contour at `(x, y)`.
    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.finish_contour(false);
        self.start_point = [x, y];
        self.current = Some([x, y]);
        self
    }

    /// Adds a line from the current point to `(x, y)`.
    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        let Some(p0) = self.current else {
            return self.move_to(x, y);
        };
        let p1 = [x, y];
        if p0 != p1 {
            self.segments.push(Segment::line(p0, p1));
        }
        self.current = Some(p1);
        self
    }

    /// Closes the current contour back to its start point.
    pub fn close(&mut self) -> &mut Self {
        if let Some(current) = self.current {
            if current != self.start_point {
                self.segments.push(Segment::line(current, self.start_point));
            }
        }
        self.finish_contour(true);
        self
    }

    /// Adds a closed axis-aligned rectangle.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> &mut Self {
        self.move_to(x, y)
            .line_to(x + width, y)
            .line_to(x + width, y + height)
            .line_to(x, y + height)
            .close()
    }

    /// Adds a closed polygon through `points`.
    pub fn polygon(&mut self, points: &[[f32; 2]]) -> &mut Self {
        let Some((first, rest)) = points.split_first() else {
            return self;
        };
        self.move_to(first[0], first[1]);
        for p in rest {
            self.line_to(p[0], p[1]);
        }
        self.close()
    }

    /// Appends a flattened copy of a kurbo path.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "path coordinates are stored as f32"
    )]
    pub fn bez_path(&mut self, path: &BezPath, tolerance: f64) -> &mut Self {
        let pt = |p: Point| (p.x as f32, p.y as f32);
        peniko::kurbo::flatten(path.iter(), tolerance, |el| match el {
            PathEl::MoveTo(p) => {
                let (x, y) = pt(p);
                self.move_to(x, y);
            }
            PathEl::LineTo(p) => {
                let (x, y) = pt(p);
                self.line_to(x, y);
            }
            PathEl::ClosePath => {
                self.close();
            }
            // `flatten` only emits lines.
            PathEl::QuadTo(..) | PathEl::CurveTo(..) => {}
        });
        self
    }

    /// Finishes the path and returns its segments.
    pub fn finish(mut self) -> Vec<Segment> {
        self.finish_contour(false);
        self.segments
    }

    fn finish_contour(&mut self, closed: bool) {
        if self.segments.len() > self.contour_start {
            if let Some(last) = self.segments.last_mut() {
                last.flags |= SEGMENT_CONTOUR_END;
                if closed {
                    last.flags |= SEGMENT_CLOSED;
                }
            }
        }
        self.contour_start = self.segments.len();
        self.current = if closed { Some(self.start_point) } else { None };
    }
}
