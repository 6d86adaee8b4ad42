// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Distance functions for fills and mitered strokes.

use smallvec::SmallVec;

use super::path::{PathHeader, STROKE_MITER_JOIN, Segment};

type Vec2 = [f32; 2];

#[inline]
fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
fn add_scaled(a: Vec2, d: Vec2, s: f32) -> Vec2 {
    [a[0] + d[0] * s, a[1] + d[1] * s]
}

#[inline]
fn dot(a: Vec2, b: Vec2) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a[0] * b[1] - a[1] * b[0]
}

fn normalize(v: Vec2) -> Option<Vec2> {
    let len = dot(v, v).sqrt();
    (len > 1e-6).then(|| [v[0] / len, v[1] / len])
}

/// Unsigned distance from `p` to the segment `a`-`b`.
pub fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = sub(b, a);
    let ap = sub(p, a);
    let len2 = dot(ab, ab);
    let t = if len2 > 0.0 {
        (dot(ap, ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let q = sub(p, add_scaled(a, ab, t));
    dot(q, q).sqrt()
}

/// Signed distance from `p` to a convex polygon; negative inside.
pub fn convex_polygon_distance(p: Vec2, points: &[Vec2]) -> f32 {
    let n = points.len();
    let mut area = 0.0;
    for i in 0..n {
        area += cross(points[i], points[(i + 1) % n]);
    }
    let orientation = if area < 0.0 { -1.0 } else { 1.0 };
    let mut distance = f32::INFINITY;
    let mut inside = area != 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        distance = distance.min(segment_distance(p, a, b));
        if cross(sub(b, a), sub(p, a)) * orientation < 0.0 {
            inside = false;
        }
    }
    if inside { -distance } else { distance }
}

/// Outline of the join where one segment ends and the next begins.
///
/// Returns the outer wedge: a miter quad when its length stays within the
/// miter limit, a bevel triangle otherwise. Collinear segments need no join.
pub fn join_polygon(
    incoming: &Segment,
    outgoing: &Segment,
    half_width: f32,
    miter_limit: f32,
    miter: bool,
) -> Option<SmallVec<[Vec2; 4]>> {
    let d0 = normalize(sub(incoming.p1, incoming.p0))?;
    let d1 = normalize(sub(outgoing.p1, outgoing.p0))?;
    let turn = cross(d0, d1);
    if turn.abs() < 1e-6 {
        return None;
    }
    // The outer side is opposite to the turn direction.
    let side = if turn > 0.0 { -1.0 } else { 1.0 };
    let n0 = [-d0[1] * side, d0[0] * side];
    let n1 = [-d1[1] * side, d1[0] * side];
    let vertex = incoming.p1;
    let a = add_scaled(vertex, n0, half_width);
    let b = add_scaled(vertex, n1, half_width);

    let mut polygon = SmallVec::new();
    polygon.push(vertex);
    polygon.push(a);
    if miter {
        // Miter length over half width is 1 / cos(theta / 2).
        let cos_half = ((1.0 + dot(n0, n1)) * 0.5).sqrt();
        if cos_half > 1e-6 && 1.0 / cos_half <= miter_limit {
            let bisector = normalize([n0[0] + n1[0], n0[1] + n1[1]])?;
            polygon.push(add_scaled(vertex, bisector, half_width / cos_half));
        }
    }
    polygon.push(b);
    Some(polygon)
}

/// Index of the segment following `index` along its contour, if joined.
///
/// `range` is the segment range of the path.
pub fn next_in_contour(
    index: usize,
    range: &core::ops::Range<usize>,
    segments: &[Segment],
) -> Option<usize> {
    let segment = &segments[index];
    if !segment.ends_contour() {
        return (index + 1 < range.end).then_some(index + 1);
    }
    if !segment.closes_contour() {
        return None;
    }
    let mut start = index;
    while start > range.start && !segments[start - 1].ends_contour() {
        start -= 1;
    }
    (start != index).then_some(start)
}

/// Signed distance from `p` to the stroke outline around one segment and its end join.
pub fn stroke_distance(p: Vec2, index: usize, header: &PathHeader, segments: &[Segment]) -> f32 {
    let half_width = header.stroke_width * 0.5;
    let segment = &segments[index];
    let mut distance = f32::INFINITY;

    if let Some(dir) = normalize(sub(segment.p1, segment.p0)) {
        let n = [-dir[1] * half_width, dir[0] * half_width];
        let body = [
            add_scaled(segment.p0, n, 1.0),
            add_scaled(segment.p1, n, 1.0),
            add_scaled(segment.p1, n, -1.0),
            add_scaled(segment.p0, n, -1.0),
        ];
        distance = convex_polygon_distance(p, &body);
    }

    let range = header.segment_range();
    if let Some(next) = next_in_contour(index, &range, segments) {
        let miter = header.stroke_flags & STROKE_MITER_JOIN != 0;
        if let Some(join) = join_polygon(
            segment,
            &segments[next],
            half_width,
            header.miter_limit,
            miter,
        ) {
            distance = distance.min(convex_polygon_distance(p, &join));
        }
    }
    distance
}

/// Anti-aliased coverage for a signed distance.
#[inline]
pub fn coverage(signed_distance: f32) -> f32 {
    (0.5 - signed_distance).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::path::{PathBuilder, PathStyle, StrokeStyle};
    use peniko::Fill;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn polygon_distance_sign() {
        let square = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert!(close(convex_polygon_distance([5.0, 5.0], &square), -5.0));
        assert!(close(convex_polygon_distance([12.0, 5.0], &square), 2.0));
        let reversed = [[0.0, 10.0], [10.0, 10.0], [10.0, 0.0], [0.0, 0.0]];
        assert!(close(convex_polygon_distance([9.0, 5.0], &reversed), -1.0));
    }

    #[test]
    fn right_angle_miter_and_bevel() {
        let a = Segment::line([0.0, 0.0], [10.0, 0.0]);
        let b = Segment::line([10.0, 0.0], [10.0, 10.0]);
        let miter = join_polygon(&a, &b, 1.0, 4.0, true).unwrap();
        assert_eq!(miter.len(), 4);
        // The miter tip sits diagonally outside the corner.
        assert!(close(miter[2][0], 11.0) && close(miter[2][1], -1.0));

        // sqrt(2) exceeds this limit.
        let bevel = join_polygon(&a, &b, 1.0, 1.2, true).unwrap();
        assert_eq!(bevel.len(), 3);
        assert!(join_polygon(&a, &b, 1.0, 4.0, false).unwrap().len() == 3);

        let straight = Segment::line([10.0, 0.0], [20.0, 0.0]);
        assert!(join_polygon(&a, &straight, 1.0, 4.0, true).is_none());
    }

    #[test]
    fn closed_contour_wraps_to_start() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 10.0, 10.0);
        builder.move_to(20.0, 0.0).line_to(30.0, 0.0).line_to(30.0, 5.0);
        let segments = builder.finish();
        let range = 0..segments.len();
        assert_eq!(next_in_contour(0, &range, &segments), Some(1));
        assert_eq!(next_in_contour(3, &range, &segments), Some(0));
        assert_eq!(next_in_contour(4, &range, &segments), Some(5));
        assert_eq!(next_in_contour(5, &range, &segments), None);
    }

    #[test]
    fn stroke_reaches_miter_corner() {
        let mut builder = PathBuilder::new();
        builder.rect(0.0, 0.0, 10.0, 10.0);
        let segments = builder.finish();
        let style = PathStyle {
            stroke: Some(StrokeStyle::new(0, 2.0)),
            ..PathStyle::fill(0, Fill::NonZero)
        };
        let header = style.header(0, 4);
        // Corner at (10, 0): the miter tip is at (11, -1).
        let p = [10.9, -0.9];
        let body_only = segment_distance(p, segments[0].p0, segments[0].p1) - 1.0;
        let stroked = stroke_distance(p, 0, &header, &segments);
        assert!(body_only > 0.0);
        assert!(stroked < 0.0);
        assert!(close(coverage(-3.0), 1.0));
        assert!(close(coverage(0.0), 0.5));
        assert!(close(coverage(2.0), 0.0));
    }
}
