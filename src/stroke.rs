// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke expansion.
//!
//! A stroked polyline becomes a filled outline by tracing it twice, once in
//! each direction, each pass laying down the offset curve for one side (a
//! "half stroke"). For a closed subpath the two passes produce two nested
//! loops winding in opposite directions; for an open subpath they join via
//! the end caps into a single loop.
//!
//! Turns so tight that the outer offset would land inside the opposite edge
//! get an explicit back-and-forth wedge that adds the winding a plain offset
//! join would lose; see Figure 10 of Nehab, "Converting Stroked Primitives
//! to Filled Primitives", for the construction this follows.

use crate::dash::dash_lines;
use crate::flatten::{add_bezier, FILL_ANGULAR};
use crate::kurbo::{Affine, Cap, Join};
use crate::math::{dot, invertible, length, map, normalized, perpendicular, Point};
use crate::path::Contours;

const EPSILON: f32 = 1.0e-4;

/// The stroking parameters of the canvas, bundled for the expander.
#[derive(Clone, Copy, Debug)]
pub(crate) struct StrokeStyle<'a> {
    pub width: f32,
    pub cap: Cap,
    pub join: Join,
    pub miter_limit: f32,
    pub dash: &'a [f32],
    pub dash_offset: f32,
}

/// Expand the polylines in `lines` into closed outlines that fill as the
/// stroked lines, dashing first if a pattern is set. `scratch` is clobbered.
///
/// Expansion works in the pre-transform frame (so widths, joins, and dashes
/// are in user units) and re-applies the forward transform on output; with a
/// singular transform there is no such frame and the whole operation is a
/// no-op.
pub(crate) fn stroke_lines(
    lines: &mut Contours,
    scratch: &mut Contours,
    style: &StrokeStyle<'_>,
    forward: Affine,
    inverse: Affine,
) {
    if !invertible(forward) {
        return;
    }
    dash_lines(lines, scratch, style.dash, style.dash_offset, inverse);
    core::mem::swap(lines, scratch);
    lines.clear();
    let mut ending = 0;
    for subpath in &scratch.subpaths {
        let beginning = ending;
        ending += subpath.count;
        if ending - beginning < 2 {
            continue;
        }
        let mut first = lines.points.len();
        add_half_stroke(
            &mut lines.points,
            &scratch.points,
            beginning,
            ending - 1,
            subpath.closed,
            style,
            forward,
            inverse,
        );
        if subpath.closed {
            lines.end_subpath(first, true);
            first = lines.points.len();
        }
        add_half_stroke(
            &mut lines.points,
            &scratch.points,
            ending - 1,
            beginning,
            subpath.closed,
            style,
            forward,
            inverse,
        );
        lines.end_subpath(first, true);
    }
}

/// Trace one side of a subpath, appending offset points, joins, and (for
/// open subpaths) the terminal cap. Called once per direction; `beginning`
/// and `ending` are inclusive indices into `source` and may run backwards.
#[expect(clippy::too_many_arguments, reason = "internal per-pass worker")]
fn add_half_stroke(
    points: &mut Vec<Point>,
    source: &[Point],
    beginning: usize,
    ending: usize,
    closed: bool,
    style: &StrokeStyle<'_>,
    forward: Affine,
    inverse: Affine,
) {
    let half = style.width * 0.5;
    let ratio = style.miter_limit * style.miter_limit * half * half;
    let mut in_direction = Point::ZERO;
    let mut in_length = 0.0_f32;
    let mut point = map(inverse, source[beginning]);
    let mut finish = beginning;
    let mut index = beginning;
    loop {
        let next = map(inverse, source[index]);
        let mut out_direction = normalized(next - point);
        let out_length = length(next - point);
        if in_length != 0.0 && out_length >= EPSILON {
            if closed && finish == beginning {
                finish = index;
            }
            let mut side_in = point + half * perpendicular(in_direction);
            let mut side_out = point + half * perpendicular(out_direction);
            // Signed sine of the exterior angle; left turns are positive on
            // this side of the trace.
            let mut turn = dot(perpendicular(in_direction), out_direction);
            if turn.abs() < EPSILON {
                turn = 0.0;
            }
            let offset = if turn == 0.0 {
                Point::ZERO
            } else {
                (half / turn) * (out_direction - in_direction)
            };
            // The turn is tight when the miter apex falls behind the
            // previous point and ahead of the next one.
            let tight = dot(offset, in_direction) < -in_length
                && dot(offset, out_direction) > out_length;
            if turn > 0.0 && tight {
                core::mem::swap(&mut side_in, &mut side_out);
                core::mem::swap(&mut in_direction, &mut out_direction);
                points.push(map(forward, side_out));
                points.push(map(forward, point));
                points.push(map(forward, side_in));
            }
            if (turn > 0.0 && !tight)
                || (turn != 0.0 && style.join == Join::Miter && dot(offset, offset) <= ratio)
            {
                points.push(map(forward, point + offset));
            } else if style.join == Join::Round {
                let cosine = dot(in_direction, out_direction);
                let angle = cosine.clamp(-1.0, 1.0).acos();
                let alpha = 4.0 / 3.0 * (0.25 * angle).tan();
                points.push(map(forward, side_in));
                add_bezier(
                    points,
                    map(forward, side_in),
                    map(forward, side_in + (alpha * half) * in_direction),
                    map(forward, side_out - (alpha * half) * out_direction),
                    map(forward, side_out),
                    FILL_ANGULAR,
                );
            } else {
                points.push(map(forward, side_in));
                points.push(map(forward, side_out));
            }
            if turn > 0.0 && tight {
                points.push(map(forward, side_out));
                points.push(map(forward, point));
                points.push(map(forward, side_in));
                core::mem::swap(&mut in_direction, &mut out_direction);
            }
        }
        if out_length >= EPSILON {
            in_direction = out_direction;
            in_length = out_length;
            point = next;
        }
        index = if index == ending {
            beginning
        } else if ending > beginning {
            index + 1
        } else {
            index - 1
        };
        if index == finish {
            break;
        }
    }
    if closed || in_length == 0.0 {
        return;
    }
    let ahead = half * in_direction;
    let side = perpendicular(ahead);
    match style.cap {
        Cap::Butt => {
            points.push(map(forward, point + side));
            points.push(map(forward, point - side));
        }
        Cap::Square => {
            points.push(map(forward, point + ahead + side));
            points.push(map(forward, point + ahead - side));
        }
        Cap::Round => {
            // 4/3·tan(π/8), the control offset of a quarter-circle cubic.
            const ALPHA: f32 = 0.55228475;
            points.push(map(forward, point + side));
            add_bezier(
                points,
                map(forward, point + side),
                map(forward, point + side + ALPHA * ahead),
                map(forward, point + ahead + ALPHA * side),
                map(forward, point + ahead),
                FILL_ANGULAR,
            );
            add_bezier(
                points,
                map(forward, point + ahead),
                map(forward, point + ahead - ALPHA * side),
                map(forward, point - side + ALPHA * ahead),
                map(forward, point - side),
                FILL_ANGULAR,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(width: f32, cap: Cap, join: Join) -> StrokeStyle<'static> {
        StrokeStyle {
            width,
            cap,
            join,
            miter_limit: 10.0,
            dash: &[],
            dash_offset: 0.0,
        }
    }

    fn segment(from: Point, to: Point) -> Contours {
        let mut lines = Contours::new();
        lines.points.push(from);
        lines.points.push(to);
        lines.end_subpath(0, false);
        lines
    }

    #[test]
    fn butt_capped_segment_expands_to_a_rectangle() {
        let mut lines = segment(Point::new(2.0, 5.0), Point::new(8.0, 5.0));
        let mut scratch = Contours::new();
        stroke_lines(
            &mut lines,
            &mut scratch,
            &style(2.0, Cap::Butt, Join::Miter),
            Affine::IDENTITY,
            Affine::IDENTITY,
        );
        assert_eq!(lines.subpaths.len(), 1);
        assert!(lines.subpaths[0].closed);
        assert_eq!(
            lines.points,
            vec![
                Point::new(8.0, 6.0),
                Point::new(8.0, 4.0),
                Point::new(2.0, 4.0),
                Point::new(2.0, 6.0),
            ]
        );
    }

    #[test]
    fn square_caps_extend_past_the_endpoints() {
        let mut lines = segment(Point::new(2.0, 5.0), Point::new(8.0, 5.0));
        let mut scratch = Contours::new();
        stroke_lines(
            &mut lines,
            &mut scratch,
            &style(2.0, Cap::Square, Join::Miter),
            Affine::IDENTITY,
            Affine::IDENTITY,
        );
        assert_eq!(lines.points[0], Point::new(9.0, 6.0));
        assert_eq!(lines.points[1], Point::new(9.0, 4.0));
    }

    #[test]
    fn closed_subpath_produces_two_nested_loops() {
        let mut lines = Contours::new();
        lines.points.push(Point::new(10.0, 10.0));
        lines.points.push(Point::new(30.0, 10.0));
        lines.points.push(Point::new(30.0, 30.0));
        lines.points.push(Point::new(10.0, 30.0));
        lines.points.push(Point::new(10.0, 10.0));
        lines.end_subpath(0, true);
        let mut scratch = Contours::new();
        stroke_lines(
            &mut lines,
            &mut scratch,
            &style(2.0, Cap::Butt, Join::Miter),
            Affine::IDENTITY,
            Affine::IDENTITY,
        );
        assert_eq!(lines.subpaths.len(), 2);
        assert!(lines.subpaths.iter().all(|s| s.closed));
    }

    #[test]
    fn singular_transform_is_a_no_op() {
        let mut lines = segment(Point::ZERO, Point::new(10.0, 0.0));
        let mut scratch = Contours::new();
        let singular = Affine::new([1.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        stroke_lines(
            &mut lines,
            &mut scratch,
            &style(2.0, Cap::Butt, Join::Miter),
            singular,
            Affine::new([0.0; 6]),
        );
        assert_eq!(lines.points.len(), 2);
    }

    #[test]
    fn degenerate_subpaths_are_skipped() {
        let mut lines = Contours::new();
        lines.points.push(Point::new(5.0, 5.0));
        lines.end_subpath(0, false);
        let mut scratch = Contours::new();
        stroke_lines(
            &mut lines,
            &mut scratch,
            &style(2.0, Cap::Butt, Join::Miter),
            Affine::IDENTITY,
            Affine::IDENTITY,
        );
        assert!(lines.points.is_empty());
        assert!(lines.subpaths.is_empty());
    }
}
