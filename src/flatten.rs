// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening cubic Bezier paths into polylines.
//!
//! Flattening runs in two layers. The high level ([`add_bezier`]) pre-splits
//! a cubic at its horizontal and vertical extrema and at the extremum of
//! curvature, so each piece is monotone and turns less than a quarter
//! circle. The low level ([`add_tessellation`]) then subdivides at midpoints
//! until the control points sit within tolerance of the chord and, when
//! stroking, until the turn angle is small enough that an expanded stroke
//! also stays within tolerance. The pre-split is what lets the flatness test
//! get away without a bisection search for cusps, and the angular test
//! without worrying about curves that bend back on themselves.

use crate::math::{dot, lerp, perpendicular, Point};
use crate::path::Contours;

/// Maximum distance between the true curve and its polyline, in pixels.
pub(crate) const TOLERANCE: f32 = 0.125;

/// Sentinel disabling the angular test, for filling.
pub(crate) const FILL_ANGULAR: f32 = -1.0;

const EPSILON: f32 = 1.0e-4;

/// The angular threshold for stroking at a given line width.
///
/// The returned value is the cosine of the largest turn allowed between
/// polyline edges, chosen so that the sagitta of an arc with that turn at
/// half-stroke radius equals the flatness tolerance.
pub(crate) fn stroking_angular(line_width: f32) -> f32 {
    let ratio = TOLERANCE / (0.5 * line_width).max(TOLERANCE);
    (ratio - 2.0) * ratio * 2.0 + 1.0
}

/// Convert a Bezier path to polylines, subpath structure preserved.
///
/// Replaces the previous contents of `lines`.
pub(crate) fn flatten(path: &Contours, lines: &mut Contours, angular: f32) {
    lines.clear();
    let mut index = 0;
    let mut ending = 0;
    for subpath in &path.subpaths {
        ending += subpath.count;
        let first = lines.points.len();
        let mut point_1 = path.points[index];
        index += 1;
        lines.points.push(point_1);
        while index < ending {
            let control_1 = path.points[index];
            let control_2 = path.points[index + 1];
            let point_2 = path.points[index + 2];
            index += 3;
            add_bezier(&mut lines.points, point_1, control_1, control_2, point_2, angular);
            point_1 = point_2;
        }
        lines.end_subpath(first, subpath.closed);
    }
}

/// Tessellate a cubic, appending everything after the start point.
///
/// Splits the curve at up to five interior parameter values (two extrema per
/// axis, one curvature extremum) before handing each piece to the recursive
/// subdivision.
pub(crate) fn add_bezier(
    points: &mut Vec<Point>,
    point_1: Point,
    control_1: Point,
    control_2: Point,
    point_2: Point,
    angular: f32,
) {
    let edge_1 = control_1 - point_1;
    let edge_2 = control_2 - control_1;
    let edge_3 = point_2 - control_2;
    if dot(edge_1, edge_1) == 0.0 && dot(edge_3, edge_3) == 0.0 {
        points.push(point_2);
        return;
    }
    let mut at = [0.0_f32; 7];
    at[1] = 1.0;
    let mut cuts = 2;
    // The derivative of the cubic per axis is the quadratic
    // `extrema_a·t² + extrema_b·t + extrema_c`; its roots are the extrema.
    let extrema_a = -9.0 * edge_2 + 3.0 * (point_2 - point_1);
    let extrema_b = 6.0 * (point_1 + control_2) - 12.0 * control_1;
    let extrema_c = 3.0 * edge_1;
    if extrema_a.x.abs() > EPSILON {
        let discriminant = extrema_b.x * extrema_b.x - 4.0 * extrema_a.x * extrema_c.x;
        if discriminant >= 0.0 {
            let sign = if extrema_b.x > 0.0 { 1.0 } else { -1.0 };
            let term = -extrema_b.x - sign * discriminant.sqrt();
            let extremum_1 = term / (2.0 * extrema_a.x);
            at[cuts] = extremum_1;
            // Vieta's formulas give the second root without cancellation.
            at[cuts + 1] = extrema_c.x / (extrema_a.x * extremum_1);
            cuts += 2;
        }
    } else if extrema_b.x.abs() > EPSILON {
        at[cuts] = -extrema_c.x / extrema_b.x;
        cuts += 1;
    }
    if extrema_a.y.abs() > EPSILON {
        let discriminant = extrema_b.y * extrema_b.y - 4.0 * extrema_a.y * extrema_c.y;
        if discriminant >= 0.0 {
            let sign = if extrema_b.y > 0.0 { 1.0 } else { -1.0 };
            let term = -extrema_b.y - sign * discriminant.sqrt();
            let extremum_1 = term / (2.0 * extrema_a.y);
            at[cuts] = extremum_1;
            at[cuts + 1] = extrema_c.y / (extrema_a.y * extremum_1);
            cuts += 2;
        }
    } else if extrema_b.y.abs() > EPSILON {
        at[cuts] = -extrema_c.y / extrema_b.y;
        cuts += 1;
    }
    let determinant_1 = dot(perpendicular(edge_1), edge_2);
    let determinant_2 = dot(perpendicular(edge_1), edge_3);
    let determinant_3 = dot(perpendicular(edge_2), edge_3);
    let curve_a = determinant_1 - determinant_2 + determinant_3;
    let curve_b = -2.0 * determinant_1 + determinant_2;
    if curve_a.abs() > EPSILON && curve_b.abs() > EPSILON {
        at[cuts] = -0.5 * curve_b / curve_a;
        cuts += 1;
    }
    // Insertion sort; values outside [0, 1] sort to the ends and the pair
    // filter below drops them.
    for index in 1..cuts {
        let value = at[index];
        let mut sorted = index;
        while sorted > 0 && value < at[sorted - 1] {
            at[sorted] = at[sorted - 1];
            sorted -= 1;
        }
        at[sorted] = value;
    }
    let mut split_point_1 = point_1;
    for index in 0..cuts - 1 {
        if !(0.0 <= at[index] && at[index + 1] <= 1.0 && at[index] != at[index + 1]) {
            continue;
        }
        // De Casteljau at `at[index + 1]`, then re-split the left piece at
        // the ratio of the two parameters to carve out [at[i], at[i+1]].
        let ratio = at[index] / at[index + 1];
        let partial_1 = lerp(point_1, control_1, at[index + 1]);
        let partial_2 = lerp(control_1, control_2, at[index + 1]);
        let partial_3 = lerp(control_2, point_2, at[index + 1]);
        let partial_4 = lerp(partial_1, partial_2, at[index + 1]);
        let partial_5 = lerp(partial_2, partial_3, at[index + 1]);
        let partial_6 = lerp(partial_1, partial_4, ratio);
        let split_point_2 = lerp(partial_4, partial_5, at[index + 1]);
        let split_control_2 = lerp(partial_4, split_point_2, ratio);
        let split_control_1 = lerp(partial_6, split_control_2, ratio);
        add_tessellation(
            points,
            split_point_1,
            split_control_1,
            split_control_2,
            split_point_2,
            angular,
            20,
        );
        split_point_1 = split_point_2;
    }
}

/// Recursive midpoint subdivision of a pre-split cubic.
///
/// In the base case the control points are emitted too when stroking (and
/// non-degenerate), so the stroke expander reads the true end tangents off
/// the polyline.
fn add_tessellation(
    points: &mut Vec<Point>,
    point_1: Point,
    control_1: Point,
    control_2: Point,
    point_2: Point,
    angular: f32,
    limit: u32,
) {
    let flatness = TOLERANCE * TOLERANCE;
    let edge_1 = control_1 - point_1;
    let edge_2 = control_2 - control_1;
    let edge_3 = point_2 - control_2;
    let segment = point_2 - point_1;
    let squared_1 = dot(edge_1, edge_1);
    let squared_2 = dot(edge_2, edge_2);
    let squared_3 = dot(edge_3, edge_3);
    let length_squared = dot(segment, segment).max(EPSILON);
    // Distance from each control point to the chord, measured to the
    // clamped foot of the perpendicular.
    let projection_1 = dot(edge_1, segment) / length_squared;
    let projection_2 = dot(edge_3, segment) / length_squared;
    let clamped_1 = projection_1.clamp(0.0, 1.0);
    let clamped_2 = projection_2.clamp(0.0, 1.0);
    let to_line_1 = point_1 + clamped_1 * segment - control_1;
    let to_line_2 = point_2 - (clamped_2 * segment) - control_2;
    let mut cosine = 1.0;
    if angular > -1.0 {
        if squared_1 * squared_3 != 0.0 {
            cosine = dot(edge_1, edge_3) / (squared_1 * squared_3).sqrt();
        } else if squared_1 * squared_2 != 0.0 {
            cosine = dot(edge_1, edge_2) / (squared_1 * squared_2).sqrt();
        } else if squared_2 * squared_3 != 0.0 {
            cosine = dot(edge_2, edge_3) / (squared_2 * squared_3).sqrt();
        }
    }
    if (dot(to_line_1, to_line_1) <= flatness
        && dot(to_line_2, to_line_2) <= flatness
        && cosine >= angular)
        || limit == 0
    {
        if angular > -1.0 && squared_1 != 0.0 {
            points.push(control_1);
        }
        if angular > -1.0 && squared_2 != 0.0 {
            points.push(control_2);
        }
        if angular == -1.0 || squared_3 != 0.0 {
            points.push(point_2);
        }
        return;
    }
    let left_1 = lerp(point_1, control_1, 0.5);
    let middle = lerp(control_1, control_2, 0.5);
    let right_2 = lerp(control_2, point_2, 0.5);
    let left_2 = lerp(left_1, middle, 0.5);
    let right_1 = lerp(middle, right_2, 0.5);
    let split = lerp(left_2, right_1, 0.5);
    add_tessellation(points, point_1, left_1, left_2, split, angular, limit - 1);
    add_tessellation(points, split, right_1, right_2, point_2, angular, limit - 1);
}
