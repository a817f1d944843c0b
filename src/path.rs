// Copyright 2026 the Tela Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path storage.
//!
//! Paths and polylines share one container: a flat point list plus a list of
//! per-subpath descriptors. In Bezier form a subpath holds an anchor point
//! followed by `(control_1, control_2, end)` triples, with straight lines
//! stored as degenerate cubics; in polyline form every point is a vertex.
//! Sharing the layout lets the pipeline stages swap buffers for scratch use
//! instead of allocating.
//!
//! Points are stored with the canvas transform already applied; the
//! transform in effect when a segment is inserted is the one that sticks.

use crate::math::{lerp, Point};

/// One subpath: how many points it owns and whether it loops.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Subpath {
    /// Number of points in the subpath.
    pub count: usize,
    /// Whether the subpath is closed.
    pub closed: bool,
}

/// A set of subpaths over a flat point buffer.
///
/// Invariant: the subpath counts sum to `points.len()`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Contours {
    /// The flat point list, all subpaths concatenated.
    pub points: Vec<Point>,
    /// The subpath descriptors.
    pub subpaths: Vec<Subpath>,
}

impl Contours {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.subpaths.clear();
    }

    /// Append a subpath descriptor covering the points pushed since `first`.
    pub fn end_subpath(&mut self, first: usize, closed: bool) {
        self.subpaths.push(Subpath {
            count: self.points.len() - first,
            closed,
        });
    }

    /// Begin a new subpath at a (pre-transformed) point.
    ///
    /// A trailing subpath that still has only its anchor is repositioned
    /// instead of leaving a stray single-point subpath behind.
    pub fn move_to(&mut self, p: Point) {
        if let Some(last) = self.subpaths.last() {
            if last.count == 1 {
                *self.points.last_mut().expect("subpath counted a point") = p;
                return;
            }
        }
        self.points.push(p);
        self.subpaths.push(Subpath {
            count: 1,
            closed: false,
        });
    }

    /// Append a straight segment to a (pre-transformed) point.
    ///
    /// On an empty path this starts a subpath instead. Zero-length segments
    /// are discarded so the stroker never sees an undefined tangent.
    pub fn line_to(&mut self, p: Point) {
        let Some(&point_1) = self.points.last() else {
            self.move_to(p);
            return;
        };
        let edge = p - point_1;
        if crate::math::dot(edge, edge) == 0.0 {
            return;
        }
        // A line is a degenerate cubic with its control points on the ends.
        self.points.push(point_1);
        self.points.push(p);
        self.points.push(p);
        self.last_count_add(3);
    }

    /// Append a cubic segment from (pre-transformed) control and end points.
    pub fn curve_to(&mut self, control_1: Point, control_2: Point, p: Point) {
        if self.subpaths.is_empty() {
            self.move_to(control_1);
        }
        self.points.push(control_1);
        self.points.push(control_2);
        self.points.push(p);
        self.last_count_add(3);
    }

    /// Append a quadratic segment, elevated to a cubic.
    pub fn quadratic_to(&mut self, control: Point, p: Point) {
        if self.subpaths.is_empty() {
            self.move_to(control);
        }
        let point_1 = *self.points.last().expect("move_to pushed a point");
        let control_1 = lerp(point_1, control, 2.0 / 3.0);
        let control_2 = lerp(p, control, 2.0 / 3.0);
        self.points.push(control_1);
        self.points.push(control_2);
        self.points.push(p);
        self.last_count_add(3);
    }

    /// Close the current subpath with a line back to its first point, then
    /// open a fresh subpath there so further segments start a new loop.
    pub fn close(&mut self) {
        let Some(last) = self.subpaths.last() else {
            return;
        };
        let first = self.points[self.points.len() - last.count];
        self.line_to(first);
        self.subpaths.last_mut().expect("checked above").closed = true;
        self.move_to(first);
    }

    fn last_count_add(&mut self, n: usize) {
        self.subpaths.last_mut().expect("subpath exists").count += n;
    }
}
