// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scan conversion to sparse coverage runs.
//!
//! A [`PixelRun`] records a signed change to the running horizontal coverage
//! sum at one pixel. Sorting runs by row and column and prefix-summing the
//! deltas reconstructs the fractional coverage of every pixel a path
//! touches, while untouched spans cost nothing. The absolute value of the
//! clamped sum is the coverage, so winding direction cancels where subpaths
//! overlap in opposite directions.

use crate::math::{dot, lerp, Point};
use crate::path::Contours;
use core::cmp::Ordering;

/// A signed coverage delta at one pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PixelRun {
    /// Pixel column.
    pub x: u16,
    /// Pixel row.
    pub y: u16,
    /// Change to the running coverage sum at and right of this pixel.
    pub delta: f32,
}

/// Canonical run ordering: row, then column, then delta magnitude.
///
/// The magnitude tiebreak groups entries that cancel (two touching edges in
/// one pixel) deterministically, which the merge below relies on.
pub(crate) fn order(left: &PixelRun, right: &PixelRun) -> Ordering {
    left.y
        .cmp(&right.y)
        .then(left.x.cmp(&right.x))
        .then(left.delta.abs().total_cmp(&right.delta.abs()))
}

/// Scan-convert polylines into a sorted, merged run list.
///
/// Subpaths are first clipped to the viewport (expanded by `padding`, used
/// by the shadow pass to keep the blur skirt) with the Sutherland-Hodgman
/// reentrant method, inserting vertices where edges cross the boundary.
/// Each resulting edge is then converted to trapezoidal coverage deltas.
/// Replaces the previous contents of `runs`; `scratch` is clobbered.
pub(crate) fn lines_to_runs(
    runs: &mut Vec<PixelRun>,
    scratch: &mut Vec<Point>,
    lines: &Contours,
    offset: Point,
    padding: u32,
    size_x: u16,
    size_y: u16,
) {
    runs.clear();
    let width = (u32::from(size_x) + padding) as f32;
    let height = (u32::from(size_y) + padding) as f32;
    let mut ending = 0;
    for subpath in &lines.subpaths {
        let beginning = ending;
        ending += subpath.count;
        scratch.clear();
        for index in beginning..ending {
            scratch.push(offset + lines.points[index]);
        }
        for edge in 0..4 {
            let normal = Point::new(
                match edge {
                    0 => 1.0,
                    2 => -1.0,
                    _ => 0.0,
                },
                match edge {
                    1 => 1.0,
                    3 => -1.0,
                    _ => 0.0,
                },
            );
            let place = match edge {
                2 => width,
                3 => height,
                _ => 0.0,
            };
            let first = scratch.len();
            for index in 0..first {
                let from = scratch[if index > 0 { index - 1 } else { first - 1 }];
                let to = scratch[index];
                let from_side = dot(from, normal) + place;
                let to_side = dot(to, normal) + place;
                if from_side * to_side < 0.0 {
                    scratch.push(lerp(from, to, from_side / (from_side - to_side)));
                }
                if to_side >= 0.0 {
                    scratch.push(to);
                }
            }
            scratch.drain(0..first);
        }
        let last = scratch.len();
        for index in 0..last {
            let from = scratch[if index > 0 { index - 1 } else { last - 1 }];
            let to = scratch[index];
            add_runs(
                runs,
                Point::new(from.x.clamp(0.0, width), from.y.clamp(0.0, height)),
                Point::new(to.x.clamp(0.0, width), to.y.clamp(0.0, height)),
            );
        }
    }
    if runs.is_empty() {
        return;
    }
    runs.sort_unstable_by(order);
    // Coalesce same-pixel entries and drop zeros; the first run of the list
    // always survives to anchor the walk.
    let mut to = 0;
    for from in 1..runs.len() {
        if runs[from].x == runs[to].x && runs[from].y == runs[to].y {
            runs[to].delta += runs[from].delta;
        } else if runs[from].delta != 0.0 {
            to += 1;
            runs[to] = runs[from];
        }
    }
    runs.truncate(to + 1);
}

/// Scan-convert one segment, walking the pixels it touches left to right and
/// accumulating signed trapezoidal area. Every pixel column the segment
/// crosses gets one delta; each row ends with a final pair bringing the
/// running sum up to date one pixel past the segment (the "spillover").
///
/// Callers must clip first; this does not bound-check against the viewport.
fn add_runs(runs: &mut Vec<PixelRun>, from: Point, to: Point) {
    const EPSILON: f32 = 2.0e-5;
    if (to.y - from.y).abs() < EPSILON {
        return;
    }
    let sign: f32 = if to.y > from.y { 1.0 } else { -1.0 };
    let (from, to) = if from.x > to.x { (to, from) } else { (from, to) };
    let mut now = from;
    let mut pixel = Point::new(now.x.floor(), now.y.floor());
    let corner = pixel + Point::new(1.0, if to.y > from.y { 1.0 } else { 0.0 });
    let slope = Point::new(
        (to.x - from.x) / (to.y - from.y),
        (to.y - from.y) / (to.x - from.x),
    );
    let mut next_x = if to.x - from.x < EPSILON {
        to
    } else {
        Point::new(corner.x, now.y + (corner.x - now.x) * slope.y)
    };
    let mut next_y = Point::new(now.x + (corner.y - now.y) * slope.x, corner.y);
    if (from.y < to.y && to.y < next_y.y) || (from.y > to.y && to.y > next_y.y) {
        next_y = to;
    }
    let y_step = sign;
    loop {
        let mut carry = 0.0;
        while next_x.x < next_y.x {
            let strip = ((next_x.y - now.y) * y_step).clamp(0.0, 1.0);
            let mid = (next_x.x + now.x) * 0.5;
            let area = (mid - pixel.x) * strip;
            runs.push(PixelRun {
                x: pixel.x as u16,
                y: pixel.y as u16,
                delta: (carry + strip - area) * sign,
            });
            carry = area;
            now = next_x;
            next_x.x += 1.0;
            next_x.y = (next_x.x - from.x) * slope.y + from.y;
            pixel.x += 1.0;
        }
        let strip = ((next_y.y - now.y) * y_step).clamp(0.0, 1.0);
        let mid = (next_y.x + now.x) * 0.5;
        let area = (mid - pixel.x) * strip;
        runs.push(PixelRun {
            x: pixel.x as u16,
            y: pixel.y as u16,
            delta: (carry + strip - area) * sign,
        });
        runs.push(PixelRun {
            x: (pixel.x + 1.0) as u16,
            y: pixel.y as u16,
            delta: area * sign,
        });
        now = next_y;
        next_y.y += y_step;
        next_y.x = (next_y.y - from.y) * slope.x + from.x;
        pixel.y += y_step;
        if (from.y < to.y && to.y < next_y.y) || (from.y > to.y && to.y > next_y.y) {
            next_y = to;
        }
        if now.y == to.y {
            break;
        }
    }
}
