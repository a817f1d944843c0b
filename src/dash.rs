// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breaking polylines into dashes.

use crate::kurbo::Affine;
use crate::math::{length, lerp, map};
use crate::path::Contours;

/// Cut the polylines in `lines` according to the dash pattern, walking the
/// subpaths and the pattern in lockstep. Each emitted dash becomes a new
/// open subpath. Distances are measured in the pre-transform frame so the
/// pattern is stated in user units regardless of the current scale.
///
/// Two closed-subpath cases need care: a loop that fits entirely inside the
/// first dash is passed through still closed, and a loop that starts and
/// ends mid-dash has its first and last dashes merged by rotating the point
/// ring so the seam disappears.
///
/// `scratch` is clobbered. Does nothing when the pattern is empty or has no
/// positive length.
pub(crate) fn dash_lines(
    lines: &mut Contours,
    scratch: &mut Contours,
    pattern: &[f32],
    pattern_offset: f32,
    inverse: Affine,
) {
    if pattern.is_empty() {
        return;
    }
    let total: f32 = pattern.iter().sum();
    if !(total > 0.0) {
        return;
    }
    core::mem::swap(lines, scratch);
    lines.clear();
    let mut offset = pattern_offset % total;
    if offset < 0.0 {
        offset += total;
    }
    let mut start = 0;
    while offset >= pattern[start] {
        offset -= pattern[start];
        start = if start + 1 < pattern.len() { start + 1 } else { 0 };
    }
    let mut ending = 0;
    for subpath in &scratch.subpaths {
        let mut index = ending;
        ending += subpath.count;
        let mut first = lines.points.len();
        let mut segment = start;
        let mut emit = start % 2 == 0;
        let merge_point = lines.points.len();
        let merge_subpath = lines.subpaths.len();
        let merge_emit = emit;
        let mut next = pattern[start] - offset;
        while index + 1 < ending {
            let from = scratch.points[index];
            let to = scratch.points[index + 1];
            if emit {
                lines.points.push(from);
            }
            let line = length(map(inverse, to) - map(inverse, from));
            while next < line {
                lines.points.push(lerp(from, to, next / line));
                if emit {
                    lines.end_subpath(first, false);
                    first = lines.points.len();
                }
                segment = if segment + 1 < pattern.len() {
                    segment + 1
                } else {
                    0
                };
                emit = !emit;
                next += pattern[segment];
            }
            next -= line;
            index += 1;
        }
        if emit {
            lines.points.push(scratch.points[index]);
            lines.end_subpath(first, false);
            if subpath.closed && merge_emit {
                if lines.subpaths.len() == merge_subpath + 1 {
                    // The whole loop fits in one dash; keep it a loop.
                    lines.subpaths.last_mut().expect("just pushed").closed = true;
                } else {
                    // Splice the trailing dash onto the front of the leading
                    // one so the loop's seam falls mid-dash.
                    let count = lines.subpaths.last().expect("just pushed").count;
                    lines.points[merge_point..].rotate_right(count);
                    lines.subpaths[merge_subpath].count += count;
                    lines.subpaths.pop();
                }
            }
        }
    }
}
